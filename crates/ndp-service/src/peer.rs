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

use nanpath_ndp_pkt::MacAddress;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Completed once the last active peer of an interface leaves. The upper
/// layer may await it, block on it, or drop it to abandon the wait.
pub type EndAllReceiver = oneshot::Receiver<()>;

/// New peer and peer departed indications from the protocol engine
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PeerIndication {
    pub sta_id: u16,
    pub peer_mac: MacAddress,
}

/// Active data path peers of one interface
#[derive(Debug, Default)]
pub(crate) struct PeerTracker {
    active: u32,
    end_all: Option<oneshot::Sender<()>>,
}

impl PeerTracker {
    pub(crate) const fn active(&self) -> u32 {
        self.active
    }

    pub(crate) fn connected(&mut self) -> u32 {
        self.active = self.active.saturating_add(1);
        self.active
    }

    /// Remaining peers, `None` when there was no peer to depart
    pub(crate) fn departed(&mut self) -> Option<u32> {
        self.active = self.active.checked_sub(1)?;
        Some(self.active)
    }

    /// A waiter registered while no peer is active completes right away. A
    /// new registration replaces a pending one, whose receiver then observes
    /// the sender being dropped.
    pub(crate) fn register_end_all(&mut self) -> EndAllReceiver {
        let (tx, rx) = oneshot::channel();
        if self.active == 0 {
            // Receiver is alive, it's returned below
            let _ = tx.send(());
        } else {
            self.end_all = Some(tx);
        }
        rx
    }

    /// Whether a waiter was still listening
    pub(crate) fn complete_end_all(&mut self) -> bool {
        match self.end_all.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}
