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

use crate::fsm::{InvalidTransition, NdiState};
use nanpath_attr::wire::serializer::AttributeWritingError;
use nanpath_ndp_pkt::wire::deserializer::CommandParsingError;
use serde::{Deserialize, Serialize};

/// Status reported by a collaborator, a negative errno
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("status {0}")]
pub struct CollaboratorError(pub i32);

impl CollaboratorError {
    pub const fn errno(&self) -> i32 {
        if self.0 < 0 {
            self.0
        } else {
            -libc::EINVAL
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum NdpError {
    #[error("malformed attribute: {0:?}")]
    MalformedAttribute(CommandParsingError),

    #[error("missing attribute: {0:?}")]
    MissingAttribute(CommandParsingError),

    #[error("interface {0} already exists")]
    AlreadyExists(String),

    #[error("interface {0} not found")]
    NotFound(String),

    #[error("not allowed in NDI state {0}")]
    InvalidState(NdiState),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("event buffer allocation of {0} octets failed")]
    AllocationFailure(usize),

    #[error("event doesn't fit its buffer: {0:?}")]
    EncodeOverflow(AttributeWritingError),

    #[error("protocol engine rejected the request with {0}")]
    Engine(CollaboratorError),

    #[error("interface callback failed with {0}")]
    Callback(CollaboratorError),
}

impl NdpError {
    /// Negative errno returned to the upper layer
    pub const fn errno(&self) -> i32 {
        match self {
            Self::MalformedAttribute(_) | Self::MissingAttribute(_) | Self::InvalidState(_) => {
                -libc::EINVAL
            }
            Self::AlreadyExists(_) => -libc::EEXIST,
            Self::NotFound(_) => -libc::ENODEV,
            Self::Unsupported(_) => -libc::EOPNOTSUPP,
            Self::AllocationFailure(_) => -libc::ENOMEM,
            Self::EncodeOverflow(_) => -libc::EOVERFLOW,
            Self::Engine(err) | Self::Callback(err) => err.errno(),
        }
    }
}

impl From<CommandParsingError> for NdpError {
    fn from(err: CommandParsingError) -> Self {
        if err.is_missing() {
            Self::MissingAttribute(err)
        } else {
            Self::MalformedAttribute(err)
        }
    }
}

impl From<InvalidTransition> for NdpError {
    fn from(err: InvalidTransition) -> Self {
        Self::InvalidState(err.state)
    }
}
