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

//! Field plans of the outbound events.
//!
//! Every event is first turned into the ordered list of attributes it will
//! carry. Which optional fields are present is decided once, while building
//! that list, and both the announced length and the written octets are
//! derived from it.

use crate::{
    iana::{NanAttribute, NdpAttribute},
    ChannelInfo, ConfirmIndication, NanEventMessage, NdpEventMessage, RequestIndication,
    ScheduleUpdateIndication,
};
use nanpath_attr::{
    attribute_size, plan_len, wire::serializer::AttributeWritingError, Attribute, WritablePdu,
};
use nanpath_serde_macros::WritingError;
use serde::{Deserialize, Serialize};
use std::{io::Write, net::Ipv6Addr};

#[derive(WritingError, Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum EventWritingError {
    StdIOError(#[from_std_io_error] String),
    AttributeError(#[from] AttributeWritingError),
}

#[inline]
fn u32_attr(attribute: NdpAttribute, value: u32) -> Attribute {
    Attribute::u32(attribute.into(), value)
}

#[inline]
fn mac_attr(attribute: NdpAttribute, mac: crate::MacAddress) -> Attribute {
    Attribute::bytes(attribute.into(), &mac.octets())
}

fn ipv6_attr(ipv6: Option<Ipv6Addr>) -> Option<Attribute> {
    ipv6.map(|addr| Attribute::bytes(NdpAttribute::Ipv6Addr.into(), &addr.octets()))
}

fn app_info_attr(app_info: &[u8]) -> Option<Attribute> {
    if app_info.is_empty() {
        None
    } else {
        Some(Attribute::bytes(NdpAttribute::AppInfo.into(), app_info))
    }
}

/// Always present, empty when no instance is listed
fn instance_id_array(instance_ids: &[u32]) -> Attribute {
    let octets = instance_ids
        .iter()
        .flat_map(|id| id.to_le_bytes())
        .collect::<Vec<u8>>();
    Attribute::new(
        NdpAttribute::InstanceIdArray.into(),
        nanpath_attr::AttributeValue::Bytes(octets),
    )
}

/// Channel count followed by the channel array, the array only when not
/// empty
fn channel_fields(channels: &[ChannelInfo], fields: &mut Vec<Attribute>) {
    fields.push(u32_attr(NdpAttribute::NumChannels, channels.len() as u32));
    if channels.is_empty() {
        return;
    }
    let elements = channels
        .iter()
        .enumerate()
        .map(|(idx, channel)| {
            Attribute::nested(
                idx as u16,
                vec![
                    u32_attr(NdpAttribute::Channel, channel.frequency()),
                    u32_attr(NdpAttribute::ChannelWidth, channel.width()),
                    u32_attr(NdpAttribute::Nss, channel.nss()),
                ],
            )
        })
        .collect();
    fields.push(Attribute::nested(NdpAttribute::ChannelInfo.into(), elements));
}

fn request_indication_fields(iface: &str, ind: &RequestIndication, fields: &mut Vec<Attribute>) {
    fields.push(Attribute::string(NdpAttribute::IfaceStr.into(), iface));
    fields.push(u32_attr(
        NdpAttribute::ServiceInstanceId,
        ind.service_instance_id,
    ));
    fields.push(mac_attr(NdpAttribute::NdiMacAddr, ind.peer_ndi_mac));
    fields.push(mac_attr(
        NdpAttribute::PeerDiscoveryMacAddr,
        ind.peer_discovery_mac,
    ));
    fields.push(u32_attr(NdpAttribute::InstanceId, ind.instance_id));
    fields.extend(app_info_attr(&ind.app_info));
    fields.extend(ind.qos.map(|qos| u32_attr(NdpAttribute::ConfigQos, qos)));
    if let Some(security) = ind.security.as_ref().filter(|sec| !sec.scid.is_empty()) {
        fields.push(u32_attr(NdpAttribute::Csid, security.csid));
        fields.push(Attribute::bytes(NdpAttribute::Scid.into(), &security.scid));
    }
    fields.extend(ipv6_attr(ind.ipv6));
    fields.extend(
        ind.service_id
            .map(|id| Attribute::bytes(NdpAttribute::ServiceId.into(), &id)),
    );
    fields.extend(
        ind.csia_capabilities
            .map(|cap| Attribute::u8(NdpAttribute::CsiaCapabilities.into(), cap)),
    );
    if ind.gtk_required {
        fields.push(Attribute::flag(NdpAttribute::GtkRequired.into()));
    }
}

fn confirm_indication_fields(iface: &str, confirm: &ConfirmIndication, fields: &mut Vec<Attribute>) {
    fields.push(u32_attr(NdpAttribute::InstanceId, confirm.instance_id));
    fields.push(mac_attr(NdpAttribute::NdiMacAddr, confirm.peer_ndi_mac));
    fields.push(Attribute::string(NdpAttribute::IfaceStr.into(), iface));
    fields.extend(app_info_attr(&confirm.app_info));
    fields.push(u32_attr(NdpAttribute::ResponseCode, confirm.response_code));
    fields.push(u32_attr(NdpAttribute::DrvReturnValue, confirm.reason));
    channel_fields(&confirm.channels, fields);
    fields.extend(ipv6_attr(confirm.ipv6));
    fields.extend(
        confirm
            .transport_port
            .map(|port| Attribute::u16(NdpAttribute::TransportPort.into(), port)),
    );
    fields.extend(
        confirm
            .transport_protocol
            .map(|protocol| Attribute::u8(NdpAttribute::TransportProtocol.into(), protocol)),
    );
}

fn schedule_update_fields(update: &ScheduleUpdateIndication, fields: &mut Vec<Attribute>) {
    fields.push(mac_attr(NdpAttribute::PeerDiscoveryMacAddr, update.peer_mac));
    fields.push(instance_id_array(&update.instance_ids));
    fields.push(u32_attr(NdpAttribute::ScheduleUpdateReason, update.reason));
    channel_fields(&update.channels, fields);
}

impl NdpEventMessage {
    /// Ordered attributes of the event, starting with the subcommand
    pub fn fields(&self) -> Vec<Attribute> {
        let mut fields = vec![u32_attr(NdpAttribute::Subcmd, self.subcommand().into())];
        match self {
            Self::InterfaceCreateResponse {
                transaction_id,
                response,
            }
            | Self::InterfaceDeleteResponse {
                transaction_id,
                response,
            } => {
                fields.push(Attribute::u16(
                    NdpAttribute::TransactionId.into(),
                    *transaction_id,
                ));
                fields.push(u32_attr(
                    NdpAttribute::DrvResponseStatusType,
                    response.status.into(),
                ));
                fields.push(u32_attr(NdpAttribute::DrvReturnValue, response.reason));
            }
            Self::InitiatorResponse(rsp) => {
                fields.push(Attribute::u16(
                    NdpAttribute::TransactionId.into(),
                    rsp.transaction_id,
                ));
                fields.push(u32_attr(NdpAttribute::InstanceId, rsp.instance_id));
                fields.push(u32_attr(
                    NdpAttribute::DrvResponseStatusType,
                    rsp.status.into(),
                ));
                fields.push(u32_attr(NdpAttribute::DrvReturnValue, rsp.reason));
            }
            Self::ResponderResponse(rsp) => {
                fields.push(Attribute::u16(
                    NdpAttribute::TransactionId.into(),
                    rsp.transaction_id,
                ));
                fields.push(u32_attr(
                    NdpAttribute::DrvResponseStatusType,
                    rsp.status.into(),
                ));
                fields.push(u32_attr(NdpAttribute::DrvReturnValue, rsp.reason));
            }
            Self::EndResponse(rsp) => {
                fields.push(u32_attr(
                    NdpAttribute::DrvResponseStatusType,
                    rsp.status.into(),
                ));
                fields.push(u32_attr(NdpAttribute::DrvReturnValue, rsp.reason));
                fields.push(Attribute::u16(
                    NdpAttribute::TransactionId.into(),
                    rsp.transaction_id,
                ));
            }
            Self::RequestIndication { iface, indication } => {
                request_indication_fields(iface, indication, &mut fields)
            }
            Self::ConfirmIndication { iface, confirm } => {
                confirm_indication_fields(iface, confirm, &mut fields)
            }
            Self::EndIndication(ind) => fields.push(instance_id_array(&ind.instance_ids)),
            Self::ScheduleUpdateIndication(update) => schedule_update_fields(update, &mut fields),
        }
        fields
    }
}

impl WritablePdu<EventWritingError> for NdpEventMessage {
    // The subcommand attribute
    const BASE_LENGTH: usize = attribute_size(4);

    fn len(&self) -> usize {
        plan_len(&self.fields())
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), EventWritingError> {
        for field in self.fields() {
            field.write(writer)?;
        }
        Ok(())
    }
}

impl NanEventMessage {
    pub fn fields(&self) -> Vec<Attribute> {
        vec![
            Attribute::u32(NanAttribute::SubcmdType.into(), self.subcommand.into()),
            Attribute::bytes(NanAttribute::CmdData.into(), &self.data),
        ]
    }
}

impl WritablePdu<EventWritingError> for NanEventMessage {
    const BASE_LENGTH: usize = attribute_size(4);

    fn len(&self) -> usize {
        plan_len(&self.fields())
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), EventWritingError> {
        for field in self.fields() {
            field.write(writer)?;
        }
        Ok(())
    }
}
