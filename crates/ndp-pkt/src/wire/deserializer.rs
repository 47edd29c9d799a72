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

//! Decoding of NDP and NAN discovery command buffers into typed commands

use crate::{
    iana::{NanAttribute, NanSubcommand, NdpAttribute, NdpResponseCode, NdpSubcommand},
    schema::{NAN_SCHEMA, NDP_SCHEMA},
    ChannelRequest, EndCommand, InitiatorCommand, InterfaceCommand, MacAddress,
    NanDiscoveryCommand, NanEnableCommand, NdpCommand, NdpSecurityParams, ResponderCommand,
};
use nanpath_attr::{
    wire::deserializer::{decode, AttributeParsingError},
    DecodedAttributeSet,
};
use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;

#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum CommandParsingError {
    /// The buffer doesn't match the schema, `offset` is relative to the
    /// start of the command buffer
    MalformedAttribute {
        offset: usize,
        error: AttributeParsingError,
    },
    MissingAttribute(NdpAttribute),
    MissingNanAttribute(NanAttribute),
    UndefinedSubcommand(u32),
    /// A defined subcommand that only exists on events
    UnexpectedSubcommand(NdpSubcommand),
    UndefinedNanSubcommand(u32),
    UnexpectedNanSubcommand(NanSubcommand),
    UndefinedResponseCode(u32),
    /// Instance id array whose length is not a multiple of four octets
    InvalidInstanceIdArrayLength(usize),
}

impl CommandParsingError {
    /// Mandatory attribute absent, as opposed to present but malformed
    pub const fn is_missing(&self) -> bool {
        matches!(
            self,
            Self::MissingAttribute(_) | Self::MissingNanAttribute(_)
        )
    }
}

fn decode_set(
    schema: &nanpath_attr::AttributeSchema,
    buf: &[u8],
) -> Result<DecodedAttributeSet, CommandParsingError> {
    decode(schema, buf).map_err(|err| CommandParsingError::MalformedAttribute {
        offset: err.offset_in(buf),
        error: err.into_error(),
    })
}

/// Typed and mandatory access to an NDP attribute set
trait NdpAttributes {
    fn ndp_u32(&self, attribute: NdpAttribute) -> Option<u32>;
    fn ndp_u16(&self, attribute: NdpAttribute) -> Option<u16>;
    fn ndp_u8(&self, attribute: NdpAttribute) -> Option<u8>;
    fn ndp_bytes(&self, attribute: NdpAttribute) -> Option<&[u8]>;
    fn ndp_string(&self, attribute: NdpAttribute) -> Option<&str>;
    fn ndp_flag(&self, attribute: NdpAttribute) -> bool;

    fn require_u32(&self, attribute: NdpAttribute) -> Result<u32, CommandParsingError> {
        self.ndp_u32(attribute)
            .ok_or(CommandParsingError::MissingAttribute(attribute))
    }

    fn require_u16(&self, attribute: NdpAttribute) -> Result<u16, CommandParsingError> {
        self.ndp_u16(attribute)
            .ok_or(CommandParsingError::MissingAttribute(attribute))
    }

    fn require_string(&self, attribute: NdpAttribute) -> Result<String, CommandParsingError> {
        self.ndp_string(attribute)
            .map(str::to_string)
            .ok_or(CommandParsingError::MissingAttribute(attribute))
    }

    fn require_mac(&self, attribute: NdpAttribute) -> Result<MacAddress, CommandParsingError> {
        // The schema pins the length to six octets
        self.ndp_bytes(attribute)
            .and_then(|octets| MacAddress::try_from(octets).ok())
            .ok_or(CommandParsingError::MissingAttribute(attribute))
    }

    fn ipv6(&self) -> Option<Ipv6Addr> {
        self.ndp_bytes(NdpAttribute::Ipv6Addr)
            .and_then(|octets| <[u8; 16]>::try_from(octets).ok())
            .map(Ipv6Addr::from)
    }

    fn app_info(&self) -> Vec<u8> {
        self.ndp_bytes(NdpAttribute::AppInfo)
            .map(<[u8]>::to_vec)
            .unwrap_or_default()
    }

    fn security(&self) -> NdpSecurityParams {
        let copy = |attribute| {
            self.ndp_bytes(attribute)
                .map(<[u8]>::to_vec)
                .unwrap_or_default()
        };
        NdpSecurityParams {
            csid: self.ndp_u32(NdpAttribute::Csid),
            pmk: copy(NdpAttribute::Pmk),
            passphrase: copy(NdpAttribute::Passphrase),
            service_name: copy(NdpAttribute::ServiceName),
            csia_capabilities: self.ndp_u8(NdpAttribute::CsiaCapabilities),
            gtk_required: self.ndp_flag(NdpAttribute::GtkRequired),
        }
    }
}

impl NdpAttributes for DecodedAttributeSet {
    fn ndp_u32(&self, attribute: NdpAttribute) -> Option<u32> {
        self.u32(attribute.into())
    }

    fn ndp_u16(&self, attribute: NdpAttribute) -> Option<u16> {
        self.u16(attribute.into())
    }

    fn ndp_u8(&self, attribute: NdpAttribute) -> Option<u8> {
        self.u8(attribute.into())
    }

    fn ndp_bytes(&self, attribute: NdpAttribute) -> Option<&[u8]> {
        self.bytes(attribute.into())
    }

    fn ndp_string(&self, attribute: NdpAttribute) -> Option<&str> {
        self.string(attribute.into())
    }

    fn ndp_flag(&self, attribute: NdpAttribute) -> bool {
        self.flag(attribute.into())
    }
}

/// Subcommand and transaction id, mandatory for every NDP command
pub fn ndp_command_header(
    attributes: &DecodedAttributeSet,
) -> Result<(u32, u16), CommandParsingError> {
    let subcmd = attributes.require_u32(NdpAttribute::Subcmd)?;
    let transaction_id = attributes.require_u16(NdpAttribute::TransactionId)?;
    Ok((subcmd, transaction_id))
}

fn instance_ids(attributes: &DecodedAttributeSet) -> Result<Vec<u32>, CommandParsingError> {
    let octets = match attributes.ndp_bytes(NdpAttribute::InstanceIdArray) {
        Some(octets) if !octets.is_empty() => octets,
        _ => {
            return Err(CommandParsingError::MissingAttribute(
                NdpAttribute::InstanceIdArray,
            ))
        }
    };
    if octets.len() % 4 != 0 {
        return Err(CommandParsingError::InvalidInstanceIdArrayLength(
            octets.len(),
        ));
    }
    Ok(octets
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

impl NdpCommand {
    /// Build a command from an already decoded attribute set
    pub fn from_attributes(attributes: &DecodedAttributeSet) -> Result<Self, CommandParsingError> {
        let (subcmd, transaction_id) = ndp_command_header(attributes)?;
        let subcmd = NdpSubcommand::try_from(subcmd)
            .map_err(|err| CommandParsingError::UndefinedSubcommand(err.0))?;
        match subcmd {
            NdpSubcommand::InterfaceCreate => Ok(Self::InterfaceCreate(InterfaceCommand {
                transaction_id,
                iface: attributes.require_string(NdpAttribute::IfaceStr)?,
            })),
            NdpSubcommand::InterfaceDelete => Ok(Self::InterfaceDelete(InterfaceCommand {
                transaction_id,
                iface: attributes.require_string(NdpAttribute::IfaceStr)?,
            })),
            NdpSubcommand::InitiatorRequest => {
                let iface = attributes.require_string(NdpAttribute::IfaceStr)?;
                let channel = match attributes.ndp_u32(NdpAttribute::Channel) {
                    Some(frequency) => Some(ChannelRequest {
                        frequency,
                        config: attributes.require_u32(NdpAttribute::ChannelConfig)?,
                    }),
                    None => None,
                };
                Ok(Self::Initiator(InitiatorCommand {
                    transaction_id,
                    iface,
                    service_instance_id: attributes
                        .require_u32(NdpAttribute::ServiceInstanceId)?,
                    channel,
                    peer_discovery_mac: attributes
                        .require_mac(NdpAttribute::PeerDiscoveryMacAddr)?,
                    app_info: attributes.app_info(),
                    qos: attributes.ndp_u32(NdpAttribute::ConfigQos),
                    ipv6: attributes.ipv6(),
                    security: attributes.security(),
                }))
            }
            NdpSubcommand::ResponderRequest => {
                let code = attributes.require_u32(NdpAttribute::ResponseCode)?;
                let response_code = NdpResponseCode::try_from(code)
                    .map_err(|err| CommandParsingError::UndefinedResponseCode(err.0))?;
                let iface = match response_code {
                    NdpResponseCode::Accept => {
                        Some(attributes.require_string(NdpAttribute::IfaceStr)?)
                    }
                    _ => attributes
                        .ndp_string(NdpAttribute::IfaceStr)
                        .map(str::to_string),
                };
                Ok(Self::Responder(ResponderCommand {
                    transaction_id,
                    iface,
                    instance_id: attributes.require_u32(NdpAttribute::InstanceId)?,
                    response_code,
                    app_info: attributes.app_info(),
                    qos: attributes.ndp_u32(NdpAttribute::ConfigQos),
                    ipv6: attributes.ipv6(),
                    transport_port: attributes.ndp_u16(NdpAttribute::TransportPort),
                    transport_protocol: attributes.ndp_u8(NdpAttribute::TransportProtocol),
                    security: attributes.security(),
                }))
            }
            NdpSubcommand::EndRequest => Ok(Self::End(EndCommand {
                transaction_id,
                instance_ids: instance_ids(attributes)?,
            })),
            other => Err(CommandParsingError::UnexpectedSubcommand(other)),
        }
    }

    /// Decode an NDP command buffer
    pub fn from_wire(buf: &[u8]) -> Result<Self, CommandParsingError> {
        let attributes = decode_set(&NDP_SCHEMA, buf)?;
        Self::from_attributes(&attributes)
    }
}

/// Decode an NDP command buffer into its attribute set only
pub fn decode_ndp_attributes(buf: &[u8]) -> Result<DecodedAttributeSet, CommandParsingError> {
    decode_set(&NDP_SCHEMA, buf)
}

impl NanDiscoveryCommand {
    pub fn from_attributes(attributes: &DecodedAttributeSet) -> Result<Self, CommandParsingError> {
        let data = attributes
            .bytes(NanAttribute::CmdData.into())
            .map(<[u8]>::to_vec)
            .ok_or(CommandParsingError::MissingNanAttribute(
                NanAttribute::CmdData,
            ))?;
        let subcmd = match attributes.u32(NanAttribute::SubcmdType.into()) {
            Some(subcmd) => subcmd,
            None => return Ok(Self::Generic { data }),
        };
        let subcmd = NanSubcommand::try_from(subcmd)
            .map_err(|err| CommandParsingError::UndefinedNanSubcommand(err.0))?;
        match subcmd {
            NanSubcommand::EnableRequest => {
                let freq_24ghz = attributes
                    .u32(NanAttribute::Disc24GhzBandFreq.into())
                    .ok_or(CommandParsingError::MissingNanAttribute(
                        NanAttribute::Disc24GhzBandFreq,
                    ))?;
                Ok(Self::Enable(NanEnableCommand {
                    data,
                    freq_24ghz,
                    freq_5ghz: attributes.u32(NanAttribute::Disc5GhzBandFreq.into()),
                }))
            }
            NanSubcommand::DisableRequest => Ok(Self::Disable { data }),
            other => Err(CommandParsingError::UnexpectedNanSubcommand(other)),
        }
    }

    /// Decode a NAN discovery command buffer
    pub fn from_wire(buf: &[u8]) -> Result<Self, CommandParsingError> {
        let attributes = decode_set(&NAN_SCHEMA, buf)?;
        Self::from_attributes(&attributes)
    }
}
