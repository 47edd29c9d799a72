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

//! Canonical requests handed to the protocol engine. Interface scoped
//! requests own a [`VdevRef`], so the interface stays referenced for as long
//! as the engine keeps the request.

use crate::directory::{VdevId, VdevRef};
use nanpath_ndp_pkt::{
    iana::NdpResponseCode, ChannelRequest, MacAddress, NdpSecurityParams,
};
use std::net::Ipv6Addr;

#[derive(Debug, Clone)]
pub struct NdpInitiatorRequest {
    pub vdev: VdevRef,
    pub transaction_id: u16,
    pub service_instance_id: u32,
    pub channel: Option<ChannelRequest>,
    pub peer_discovery_mac: MacAddress,
    pub self_ndi_mac: MacAddress,
    pub app_info: Vec<u8>,
    pub qos: Option<u32>,
    pub ipv6: Option<Ipv6Addr>,
    pub security: NdpSecurityParams,
}

#[derive(Debug, Clone)]
pub struct NdpResponderRequest {
    pub vdev: VdevRef,
    pub transaction_id: u16,
    pub instance_id: u32,
    pub response_code: NdpResponseCode,
    pub app_info: Vec<u8>,
    pub qos: Option<u32>,
    pub ipv6: Option<Ipv6Addr>,
    pub transport_port: Option<u16>,
    pub transport_protocol: Option<u8>,
    pub security: NdpSecurityParams,
}

#[derive(Debug, Clone)]
pub struct NdpEndRequest {
    pub vdev: VdevRef,
    pub transaction_id: u16,
    pub instance_ids: Vec<u32>,
}

#[derive(Debug, Clone, strum_macros::Display)]
pub enum NdpRequest {
    #[strum(to_string = "NDP_INITIATOR_REQ")]
    Initiator(NdpInitiatorRequest),
    #[strum(to_string = "NDP_RESPONDER_REQ")]
    Responder(NdpResponderRequest),
    #[strum(to_string = "NDP_END_REQ")]
    End(NdpEndRequest),
}

impl NdpRequest {
    pub fn vdev(&self) -> &VdevRef {
        match self {
            Self::Initiator(req) => &req.vdev,
            Self::Responder(req) => &req.vdev,
            Self::End(req) => &req.vdev,
        }
    }

    pub const fn transaction_id(&self) -> u16 {
        match self {
            Self::Initiator(req) => req.transaction_id,
            Self::Responder(req) => req.transaction_id,
            Self::End(req) => req.transaction_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NanEnableRequest {
    pub vdev_id: VdevId,
    pub social_chan_2g_freq: u32,
    pub social_chan_5g_freq: Option<u32>,
    /// Fine timing measurement capability of the device
    pub rtt_capability: u32,
    pub disable_6g_nan: bool,
    pub data: Vec<u8>,
}

/// Psoc scoped NAN discovery requests
#[derive(Debug, Clone, PartialEq, Eq, strum_macros::Display)]
pub enum NanDiscoveryRequest {
    #[strum(to_string = "NAN_GENERIC_REQ")]
    Generic { data: Vec<u8> },
    #[strum(to_string = "NAN_ENABLE_REQ")]
    Enable(NanEnableRequest),
    #[strum(to_string = "NAN_DISABLE_REQ")]
    Disable { data: Vec<u8> },
}
