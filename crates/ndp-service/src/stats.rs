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

//! Try and fail counters, kept per interface for NDP operations and per psoc
//! for NAN discovery. Both are reset by an external periodic flush.

use nanpath_ndp_pkt::iana::NdpSubcommand;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct OperationStats {
    attempts: u32,
    failures: u32,
}

impl OperationStats {
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    pub const fn failures(&self) -> u32 {
        self.failures
    }

    pub(crate) fn record<T, E>(&mut self, result: &Result<T, E>) {
        self.attempts = self.attempts.saturating_add(1);
        if result.is_err() {
            self.failures = self.failures.saturating_add(1);
        }
    }
}

/// Events from the protocol engine, handled or dropped
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    handled: u32,
    dropped: u32,
}

impl EventStats {
    pub const fn handled(&self) -> u32 {
        self.handled
    }

    pub const fn dropped(&self) -> u32 {
        self.dropped
    }

    pub(crate) fn record<T, E>(&mut self, result: &Result<T, E>) {
        if result.is_ok() {
            self.handled = self.handled.saturating_add(1);
        } else {
            self.dropped = self.dropped.saturating_add(1);
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct InterfaceStats {
    interface_create: OperationStats,
    interface_delete: OperationStats,
    initiator: OperationStats,
    responder: OperationStats,
    end: OperationStats,
    events: EventStats,
}

impl InterfaceStats {
    pub const fn interface_create(&self) -> OperationStats {
        self.interface_create
    }

    pub const fn interface_delete(&self) -> OperationStats {
        self.interface_delete
    }

    pub const fn initiator(&self) -> OperationStats {
        self.initiator
    }

    pub const fn responder(&self) -> OperationStats {
        self.responder
    }

    pub const fn end(&self) -> OperationStats {
        self.end
    }

    pub const fn events(&self) -> EventStats {
        self.events
    }

    /// Counters of a request subcommand, `None` for event subcommands
    pub const fn operation(&self, subcommand: NdpSubcommand) -> Option<OperationStats> {
        match subcommand {
            NdpSubcommand::InterfaceCreate => Some(self.interface_create),
            NdpSubcommand::InterfaceDelete => Some(self.interface_delete),
            NdpSubcommand::InitiatorRequest => Some(self.initiator),
            NdpSubcommand::ResponderRequest => Some(self.responder),
            NdpSubcommand::EndRequest => Some(self.end),
            _ => None,
        }
    }

    pub(crate) fn record_operation<T, E>(
        &mut self,
        subcommand: NdpSubcommand,
        result: &Result<T, E>,
    ) {
        let slot = match subcommand {
            NdpSubcommand::InterfaceCreate => &mut self.interface_create,
            NdpSubcommand::InterfaceDelete => &mut self.interface_delete,
            NdpSubcommand::InitiatorRequest => &mut self.initiator,
            NdpSubcommand::ResponderRequest => &mut self.responder,
            NdpSubcommand::EndRequest => &mut self.end,
            other => {
                log::debug!("no counters for {other}");
                return;
            }
        };
        slot.record(result);
    }

    pub(crate) fn record_event<T, E>(&mut self, result: &Result<T, E>) {
        self.events.record(result);
    }

    pub fn flush(&mut self) {
        *self = Self::default();
    }
}

/// Psoc scoped counters of the NAN discovery commands
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryStats {
    enable: OperationStats,
    disable: OperationStats,
    passthrough: OperationStats,
    events: EventStats,
}

impl DiscoveryStats {
    pub const fn enable(&self) -> OperationStats {
        self.enable
    }

    pub const fn disable(&self) -> OperationStats {
        self.disable
    }

    /// Commands without a subcommand type, forwarded as is
    pub const fn passthrough(&self) -> OperationStats {
        self.passthrough
    }

    pub const fn events(&self) -> EventStats {
        self.events
    }

    pub(crate) fn enable_mut(&mut self) -> &mut OperationStats {
        &mut self.enable
    }

    pub(crate) fn disable_mut(&mut self) -> &mut OperationStats {
        &mut self.disable
    }

    pub(crate) fn passthrough_mut(&mut self) -> &mut OperationStats {
        &mut self.passthrough
    }

    pub(crate) fn events_mut(&mut self) -> &mut EventStats {
        &mut self.events
    }

    pub fn flush(&mut self) {
        *self = Self::default();
    }
}
