// Copyright (C) 2024-present The NetGauze Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Vendor attribute tags and code points shared by the command and event
//! paths. Values follow the QCA vendor command registry.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, FromRepr};

/// Attributes of the NDP vendor command and event family
#[repr(u16)]
#[derive(
    Display, FromRepr, EnumIter, Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize,
)]
pub enum NdpAttribute {
    Subcmd = 1,
    TransactionId = 2,
    ServiceInstanceId = 3,
    Channel = 4,
    PeerDiscoveryMacAddr = 5,
    IfaceStr = 6,
    ConfigSecurity = 7,
    ConfigQos = 8,
    AppInfo = 9,
    InstanceId = 10,
    InstanceIdArray = 11,
    ResponseCode = 12,
    NdiMacAddr = 13,
    DrvResponseStatusType = 14,
    DrvReturnValue = 15,
    ChannelConfig = 16,
    /// Cipher suite id
    Csid = 17,
    Pmk = 18,
    /// Security context identifier
    Scid = 19,
    Passphrase = 20,
    ServiceName = 21,
    ScheduleUpdateReason = 22,
    ScheduleStatusCode = 23,
    Nss = 24,
    NumChannels = 25,
    ChannelWidth = 26,
    ChannelInfo = 27,
    Ipv6Addr = 28,
    TransportPort = 29,
    TransportProtocol = 30,
    PeerNdiMacAddr = 31,
    ServiceId = 32,
    CsiaCapabilities = 33,
    GtkRequired = 34,
}

impl From<NdpAttribute> for u16 {
    fn from(value: NdpAttribute) -> Self {
        value as u16
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct UndefinedNdpAttribute(pub u16);

impl TryFrom<u16> for NdpAttribute {
    type Error = UndefinedNdpAttribute;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match Self::from_repr(value) {
            Some(val) => Ok(val),
            None => Err(UndefinedNdpAttribute(value)),
        }
    }
}

/// Value of [`NdpAttribute::Subcmd`], identifying both commands and events
#[repr(u32)]
#[derive(Display, FromRepr, Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NdpSubcommand {
    InterfaceCreate = 1,
    InterfaceDelete = 2,
    InitiatorRequest = 3,
    InitiatorResponse = 4,
    ResponderRequest = 5,
    ResponderResponse = 6,
    EndRequest = 7,
    EndResponse = 8,
    RequestIndication = 9,
    ConfirmIndication = 10,
    EndIndication = 11,
    ScheduleUpdateIndication = 12,
}

impl From<NdpSubcommand> for u32 {
    fn from(value: NdpSubcommand) -> Self {
        value as u32
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct UndefinedNdpSubcommand(pub u32);

impl TryFrom<u32> for NdpSubcommand {
    type Error = UndefinedNdpSubcommand;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match Self::from_repr(value) {
            Some(val) => Ok(val),
            None => Err(UndefinedNdpSubcommand(value)),
        }
    }
}

/// Attributes of the NAN discovery vendor command family
#[repr(u16)]
#[derive(
    Display, FromRepr, EnumIter, Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize,
)]
pub enum NanAttribute {
    /// Opaque NAN message, passed through to the protocol engine
    CmdData = 1,
    SubcmdType = 2,
    Disc24GhzBandFreq = 3,
    Disc5GhzBandFreq = 4,
}

impl From<NanAttribute> for u16 {
    fn from(value: NanAttribute) -> Self {
        value as u16
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct UndefinedNanAttribute(pub u16);

impl TryFrom<u16> for NanAttribute {
    type Error = UndefinedNanAttribute;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match Self::from_repr(value) {
            Some(val) => Ok(val),
            None => Err(UndefinedNanAttribute(value)),
        }
    }
}

/// Value of [`NanAttribute::SubcmdType`]
#[repr(u32)]
#[derive(Display, FromRepr, Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NanSubcommand {
    EnableRequest = 1,
    EnableResponse = 2,
    DisableRequest = 3,
    DisableIndication = 4,
}

impl From<NanSubcommand> for u32 {
    fn from(value: NanSubcommand) -> Self {
        value as u32
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct UndefinedNanSubcommand(pub u32);

impl TryFrom<u32> for NanSubcommand {
    type Error = UndefinedNanSubcommand;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match Self::from_repr(value) {
            Some(val) => Ok(val),
            None => Err(UndefinedNanSubcommand(value)),
        }
    }
}

/// How the responder answers a data path request
#[repr(u32)]
#[derive(Display, FromRepr, Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NdpResponseCode {
    Accept = 0,
    Reject = 1,
    Defer = 2,
}

impl From<NdpResponseCode> for u32 {
    fn from(value: NdpResponseCode) -> Self {
        value as u32
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct UndefinedNdpResponseCode(pub u32);

impl TryFrom<u32> for NdpResponseCode {
    type Error = UndefinedNdpResponseCode;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match Self::from_repr(value) {
            Some(val) => Ok(val),
            None => Err(UndefinedNdpResponseCode(value)),
        }
    }
}

/// Value of [`NdpAttribute::DrvResponseStatusType`]
#[repr(u32)]
#[derive(Display, FromRepr, Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NdpResponseStatus {
    Success = 0,
    Error = 1,
}

impl From<NdpResponseStatus> for u32 {
    fn from(value: NdpResponseStatus) -> Self {
        value as u32
    }
}

/// Failure reasons raised by the driver itself, carried in
/// [`NdpAttribute::DrvReturnValue`]. Reasons reported by the firmware are
/// passed through untouched.
#[repr(u32)]
#[derive(Display, FromRepr, Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NdpInternalReason {
    UnsupportedConcurrency = 9000,
    IfaceCreateFailed = 9001,
    IfaceDeleteFailed = 9002,
    InitiatorRequestFailed = 9003,
    ResponderRequestFailed = 9004,
    InvalidNdiIfaceId = 9005,
    InvalidNdpInstanceId = 9006,
    InvalidResponseCode = 9007,
    InvalidAppInfoLen = 9008,
}

impl From<NdpInternalReason> for u32 {
    fn from(value: NdpInternalReason) -> Self {
        value as u32
    }
}
