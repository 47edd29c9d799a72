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

//! Representation of the NAN Data Path (NDP) and NAN discovery vendor
//! commands received from the upper layer and the events sent back to it.

#![deny(missing_debug_implementations)]
#![deny(rust_2018_idioms)]
#![deny(unreachable_pub)]
#![forbid(unsafe_code)]

pub mod iana;
pub mod schema;
pub mod wire;

use crate::iana::{NanSubcommand, NdpResponseCode, NdpResponseStatus, NdpSubcommand};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    net::Ipv6Addr,
};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        let [a, b, c, d, e, f] = self.0;
        a == 0 && b == 0 && c == 0 && d == 0 && e == 0 && f == 0
    }
}

impl Display for MacAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// The slice is not exactly six octets long
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct InvalidMacAddressLength(pub usize);

impl TryFrom<&[u8]> for MacAddress {
    type Error = InvalidMacAddressLength;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        match <[u8; 6]>::try_from(value) {
            Ok(octets) => Ok(Self(octets)),
            Err(_) => Err(InvalidMacAddressLength(value.len())),
        }
    }
}

/// Channel the data path was set up on
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ChannelInfo {
    frequency: u32,
    width: u32,
    nss: u32,
}

impl ChannelInfo {
    pub const fn new(frequency: u32, width: u32, nss: u32) -> Self {
        Self {
            frequency,
            width,
            nss,
        }
    }

    /// Center frequency in MHz
    pub const fn frequency(&self) -> u32 {
        self.frequency
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of spatial streams
    pub const fn nss(&self) -> u32 {
        self.nss
    }
}

/// Optional security material of an initiator or responder request, copied
/// as is. Only the maximum lengths are enforced.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct NdpSecurityParams {
    pub csid: Option<u32>,
    pub pmk: Vec<u8>,
    pub passphrase: Vec<u8>,
    pub service_name: Vec<u8>,
    pub csia_capabilities: Option<u8>,
    pub gtk_required: bool,
}

/// Requested channel of an initiator request
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ChannelRequest {
    pub frequency: u32,
    pub config: u32,
}

/// Interface create and delete commands
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct InterfaceCommand {
    pub transaction_id: u16,
    pub iface: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct InitiatorCommand {
    pub transaction_id: u16,
    pub iface: String,
    pub service_instance_id: u32,
    pub channel: Option<ChannelRequest>,
    pub peer_discovery_mac: MacAddress,
    pub app_info: Vec<u8>,
    pub qos: Option<u32>,
    pub ipv6: Option<Ipv6Addr>,
    pub security: NdpSecurityParams,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ResponderCommand {
    pub transaction_id: u16,
    /// Only mandatory when the request is accepted
    pub iface: Option<String>,
    pub instance_id: u32,
    pub response_code: NdpResponseCode,
    pub app_info: Vec<u8>,
    pub qos: Option<u32>,
    pub ipv6: Option<Ipv6Addr>,
    pub transport_port: Option<u16>,
    pub transport_protocol: Option<u8>,
    pub security: NdpSecurityParams,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct EndCommand {
    pub transaction_id: u16,
    pub instance_ids: Vec<u32>,
}

/// NDP command, one variant per request kind
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NdpCommand {
    InterfaceCreate(InterfaceCommand),
    InterfaceDelete(InterfaceCommand),
    Initiator(InitiatorCommand),
    Responder(ResponderCommand),
    End(EndCommand),
}

impl NdpCommand {
    pub const fn subcommand(&self) -> NdpSubcommand {
        match self {
            Self::InterfaceCreate(_) => NdpSubcommand::InterfaceCreate,
            Self::InterfaceDelete(_) => NdpSubcommand::InterfaceDelete,
            Self::Initiator(_) => NdpSubcommand::InitiatorRequest,
            Self::Responder(_) => NdpSubcommand::ResponderRequest,
            Self::End(_) => NdpSubcommand::EndRequest,
        }
    }

    pub const fn transaction_id(&self) -> u16 {
        match self {
            Self::InterfaceCreate(cmd) | Self::InterfaceDelete(cmd) => cmd.transaction_id,
            Self::Initiator(cmd) => cmd.transaction_id,
            Self::Responder(cmd) => cmd.transaction_id,
            Self::End(cmd) => cmd.transaction_id,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NanEnableCommand {
    pub data: Vec<u8>,
    /// Primary discovery channel, MHz
    pub freq_24ghz: u32,
    pub freq_5ghz: Option<u32>,
}

/// NAN discovery command. Without a subcommand type the NAN message is
/// handed to the protocol engine untouched.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NanDiscoveryCommand {
    Generic { data: Vec<u8> },
    Enable(NanEnableCommand),
    Disable { data: Vec<u8> },
}

/// Response of the protocol engine to an interface create or delete
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NdiResponse {
    pub status: NdpResponseStatus,
    pub reason: u32,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct InitiatorResponse {
    pub transaction_id: u16,
    pub instance_id: u32,
    pub status: NdpResponseStatus,
    pub reason: u32,
}

/// Responder and end responses
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NdpResponse {
    pub transaction_id: u16,
    pub status: NdpResponseStatus,
    pub reason: u32,
}

/// Security context negotiated for the data path
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SecurityContext {
    pub csid: u32,
    pub scid: Vec<u8>,
}

/// A peer asks to set up a data path
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RequestIndication {
    pub service_instance_id: u32,
    pub peer_ndi_mac: MacAddress,
    pub peer_discovery_mac: MacAddress,
    pub instance_id: u32,
    pub app_info: Vec<u8>,
    pub qos: Option<u32>,
    pub security: Option<SecurityContext>,
    pub ipv6: Option<Ipv6Addr>,
    pub service_id: Option<[u8; 6]>,
    pub csia_capabilities: Option<u8>,
    pub gtk_required: bool,
}

/// Outcome of a data path negotiation
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ConfirmIndication {
    pub instance_id: u32,
    pub peer_ndi_mac: MacAddress,
    pub app_info: Vec<u8>,
    pub response_code: u32,
    pub reason: u32,
    pub channels: Vec<ChannelInfo>,
    pub ipv6: Option<Ipv6Addr>,
    pub transport_port: Option<u16>,
    pub transport_protocol: Option<u8>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct EndIndication {
    pub instance_ids: Vec<u32>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ScheduleUpdateIndication {
    pub peer_mac: MacAddress,
    pub instance_ids: Vec<u32>,
    pub reason: u32,
    pub channels: Vec<ChannelInfo>,
}

/// Events sent to the upper layer on the NDP vendor family. Interface
/// scoped values that the protocol engine doesn't know, such as the stored
/// transaction id or the interface name, are carried next to the body.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NdpEventMessage {
    InterfaceCreateResponse {
        transaction_id: u16,
        response: NdiResponse,
    },
    InterfaceDeleteResponse {
        transaction_id: u16,
        response: NdiResponse,
    },
    InitiatorResponse(InitiatorResponse),
    ResponderResponse(NdpResponse),
    EndResponse(NdpResponse),
    RequestIndication {
        iface: String,
        indication: RequestIndication,
    },
    ConfirmIndication {
        iface: String,
        confirm: ConfirmIndication,
    },
    EndIndication(EndIndication),
    ScheduleUpdateIndication(ScheduleUpdateIndication),
}

impl NdpEventMessage {
    pub const fn subcommand(&self) -> NdpSubcommand {
        match self {
            Self::InterfaceCreateResponse { .. } => NdpSubcommand::InterfaceCreate,
            Self::InterfaceDeleteResponse { .. } => NdpSubcommand::InterfaceDelete,
            Self::InitiatorResponse(_) => NdpSubcommand::InitiatorResponse,
            Self::ResponderResponse(_) => NdpSubcommand::ResponderResponse,
            Self::EndResponse(_) => NdpSubcommand::EndResponse,
            Self::RequestIndication { .. } => NdpSubcommand::RequestIndication,
            Self::ConfirmIndication { .. } => NdpSubcommand::ConfirmIndication,
            Self::EndIndication(_) => NdpSubcommand::EndIndication,
            Self::ScheduleUpdateIndication(_) => NdpSubcommand::ScheduleUpdateIndication,
        }
    }
}

/// NAN discovery message from the protocol engine, passed through to the
/// upper layer
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NanEventMessage {
    pub subcommand: NanSubcommand,
    pub data: Vec<u8>,
}
