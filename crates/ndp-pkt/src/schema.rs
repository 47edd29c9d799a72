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

use crate::iana::{NanAttribute, NdpAttribute};
use nanpath_attr::{AttributePolicy, AttributeSchema};

/// Longest interface name, the kernel's `IFNAMSIZ` minus the terminator
pub const MAX_IFACE_NAME_LEN: usize = 15;
pub const MAC_ADDR_LEN: usize = 6;
pub const IPV6_ADDR_LEN: usize = 16;
pub const NDP_APP_INFO_LEN: usize = 255;
pub const NDP_PMK_LEN: usize = 32;
pub const NDP_SCID_BUF_LEN: usize = 256;
pub const NAN_PASSPHRASE_MAX_LEN: usize = 63;
pub const NAN_MAX_SERVICE_NAME_LEN: usize = 255;
pub const NDP_SERVICE_ID_LEN: usize = 6;
/// Most instance ids an end request or indication may carry
pub const NDP_NUM_INSTANCE_ID: usize = 255;
pub const NAN_CMD_DATA_MAX_LEN: usize = 2048;

const fn tag(attribute: NdpAttribute) -> u16 {
    attribute as u16
}

static CHANNEL_INFO_POLICIES: &[(u16, AttributePolicy)] = &[
    (tag(NdpAttribute::Channel), AttributePolicy::U32),
    (tag(NdpAttribute::ChannelWidth), AttributePolicy::U32),
    (tag(NdpAttribute::Nss), AttributePolicy::U32),
];

/// One element of the [`NdpAttribute::ChannelInfo`] array
pub static CHANNEL_INFO_SCHEMA: AttributeSchema =
    AttributeSchema::new("ndp-channel-info", CHANNEL_INFO_POLICIES);

static NDP_POLICIES: &[(u16, AttributePolicy)] = &[
    (tag(NdpAttribute::Subcmd), AttributePolicy::U32),
    (tag(NdpAttribute::TransactionId), AttributePolicy::U16),
    (
        tag(NdpAttribute::IfaceStr),
        AttributePolicy::NulString {
            max_len: MAX_IFACE_NAME_LEN,
        },
    ),
    (tag(NdpAttribute::ServiceInstanceId), AttributePolicy::U32),
    (tag(NdpAttribute::Channel), AttributePolicy::U32),
    (
        tag(NdpAttribute::PeerDiscoveryMacAddr),
        AttributePolicy::Exact(MAC_ADDR_LEN),
    ),
    (tag(NdpAttribute::ConfigSecurity), AttributePolicy::U16),
    (tag(NdpAttribute::ConfigQos), AttributePolicy::U32),
    (
        tag(NdpAttribute::AppInfo),
        AttributePolicy::Binary {
            max_len: NDP_APP_INFO_LEN,
        },
    ),
    (tag(NdpAttribute::InstanceId), AttributePolicy::U32),
    (
        tag(NdpAttribute::InstanceIdArray),
        AttributePolicy::Binary {
            max_len: NDP_NUM_INSTANCE_ID * 4,
        },
    ),
    (tag(NdpAttribute::ResponseCode), AttributePolicy::U32),
    (
        tag(NdpAttribute::NdiMacAddr),
        AttributePolicy::Exact(MAC_ADDR_LEN),
    ),
    (tag(NdpAttribute::DrvResponseStatusType), AttributePolicy::U32),
    (tag(NdpAttribute::DrvReturnValue), AttributePolicy::U32),
    (tag(NdpAttribute::ChannelConfig), AttributePolicy::U32),
    (tag(NdpAttribute::Csid), AttributePolicy::U32),
    (
        tag(NdpAttribute::Pmk),
        AttributePolicy::Binary {
            max_len: NDP_PMK_LEN,
        },
    ),
    (
        tag(NdpAttribute::Scid),
        AttributePolicy::Binary {
            max_len: NDP_SCID_BUF_LEN,
        },
    ),
    (
        tag(NdpAttribute::Passphrase),
        AttributePolicy::Binary {
            max_len: NAN_PASSPHRASE_MAX_LEN,
        },
    ),
    (
        tag(NdpAttribute::ServiceName),
        AttributePolicy::Binary {
            max_len: NAN_MAX_SERVICE_NAME_LEN,
        },
    ),
    (tag(NdpAttribute::ScheduleUpdateReason), AttributePolicy::U32),
    (tag(NdpAttribute::ChannelWidth), AttributePolicy::U32),
    (tag(NdpAttribute::Nss), AttributePolicy::U32),
    (tag(NdpAttribute::NumChannels), AttributePolicy::U32),
    (
        tag(NdpAttribute::ChannelInfo),
        AttributePolicy::NestedArray(&CHANNEL_INFO_SCHEMA),
    ),
    (
        tag(NdpAttribute::Ipv6Addr),
        AttributePolicy::Exact(IPV6_ADDR_LEN),
    ),
    (tag(NdpAttribute::TransportPort), AttributePolicy::U16),
    (tag(NdpAttribute::TransportProtocol), AttributePolicy::U8),
    (
        tag(NdpAttribute::PeerNdiMacAddr),
        AttributePolicy::Exact(MAC_ADDR_LEN),
    ),
    (
        tag(NdpAttribute::ServiceId),
        AttributePolicy::Exact(NDP_SERVICE_ID_LEN),
    ),
    (tag(NdpAttribute::CsiaCapabilities), AttributePolicy::U8),
    (tag(NdpAttribute::GtkRequired), AttributePolicy::Flag),
];

pub static NDP_SCHEMA: AttributeSchema = AttributeSchema::new("ndp", NDP_POLICIES);

static NAN_POLICIES: &[(u16, AttributePolicy)] = &[
    (
        NanAttribute::CmdData as u16,
        AttributePolicy::Binary {
            max_len: NAN_CMD_DATA_MAX_LEN,
        },
    ),
    (NanAttribute::SubcmdType as u16, AttributePolicy::U32),
    (NanAttribute::Disc24GhzBandFreq as u16, AttributePolicy::U32),
    (NanAttribute::Disc5GhzBandFreq as u16, AttributePolicy::U32),
];

pub static NAN_SCHEMA: AttributeSchema = AttributeSchema::new("nan", NAN_POLICIES);
