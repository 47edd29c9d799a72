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

//! Live virtual interfaces of a psoc.
//!
//! Interfaces are created by the interface management collaborator and
//! handed to the [`InterfaceDirectory`]. Every lookup returns a [`VdevRef`],
//! which holds one reference on the interface until it's dropped. An entry
//! leaves the directory only once it's [`NdiState::Deleted`] and no
//! reference to it is left.

use crate::{
    fsm::{InvalidTransition, NdiEvent, NdiState},
    peer::PeerTracker,
    stats::{DiscoveryStats, InterfaceStats},
};
use nanpath_ndp_pkt::{MacAddress, NdiResponse};
use serde::{Deserialize, Serialize};
use std::{
    ops::Deref,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, RwLock,
    },
};

pub type VdevId = u8;

/// Operating mode of a virtual interface
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum OpMode {
    Sta,
    Sap,
    P2pClient,
    P2pGo,
    Monitor,
    /// NAN discovery interface
    Nan,
    /// NAN data interface
    Ndi,
}

/// Mutable part of an interface, guarded by a single lock
#[derive(Debug, Default)]
pub(crate) struct VdevContext {
    pub(crate) state: NdiState,
    pub(crate) peers: PeerTracker,
    pub(crate) create_transaction_id: Option<u16>,
    pub(crate) delete_transaction_id: Option<u16>,
    pub(crate) delete_response: Option<NdiResponse>,
    pub(crate) stats: InterfaceStats,
}

#[derive(Debug)]
pub struct VirtualInterface {
    id: VdevId,
    name: String,
    mode: OpMode,
    mac: MacAddress,
    refs: AtomicUsize,
    context: Mutex<VdevContext>,
}

impl VirtualInterface {
    pub fn new(id: VdevId, name: impl Into<String>, mode: OpMode, mac: MacAddress) -> Self {
        Self {
            id,
            name: name.into(),
            mode,
            mac,
            refs: AtomicUsize::new(0),
            context: Mutex::new(VdevContext::default()),
        }
    }

    pub const fn id(&self) -> VdevId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn mode(&self) -> OpMode {
        self.mode
    }

    /// Self MAC address, the NDI address for data interfaces
    pub const fn mac(&self) -> MacAddress {
        self.mac
    }

    /// Number of [`VdevRef`]s currently held
    pub fn ref_count(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }

    pub fn state(&self) -> NdiState {
        self.context().state
    }

    pub fn active_peers(&self) -> u32 {
        self.context().peers.active()
    }

    pub fn stats(&self) -> InterfaceStats {
        self.context().stats
    }

    pub fn create_transaction_id(&self) -> Option<u16> {
        self.context().create_transaction_id
    }

    pub fn delete_transaction_id(&self) -> Option<u16> {
        self.context().delete_transaction_id
    }

    pub(crate) fn context(&self) -> MutexGuard<'_, VdevContext> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `event` to the lifecycle state, leaving it untouched when the
    /// transition isn't allowed
    pub(crate) fn transition(&self, event: NdiEvent) -> Result<NdiState, InvalidTransition> {
        let mut context = self.context();
        let before = context.state;
        let after = match before.next(event) {
            Ok(after) => after,
            Err(err) => {
                log::warn!("[{}][{before}] rejected NDI event {event}", self.name);
                return Err(err);
            }
        };
        context.state = after;
        log::info!(
            "[{}][{before}] NDI state transitions from {before} to {after} on {event}",
            self.name
        );
        Ok(after)
    }

    /// Put back the state saved before a transition whose side effect failed
    pub(crate) fn restore_state(&self, state: NdiState) {
        let mut context = self.context();
        log::info!(
            "[{}][{}] NDI state restored to {state}",
            self.name,
            context.state
        );
        context.state = state;
    }
}

/// Counted reference to a [`VirtualInterface`]
#[derive(Debug)]
pub struct VdevRef {
    vdev: Arc<VirtualInterface>,
}

impl VdevRef {
    fn acquire(vdev: &Arc<VirtualInterface>) -> Self {
        vdev.refs.fetch_add(1, Ordering::AcqRel);
        Self {
            vdev: Arc::clone(vdev),
        }
    }
}

impl Clone for VdevRef {
    fn clone(&self) -> Self {
        Self::acquire(&self.vdev)
    }
}

impl Drop for VdevRef {
    fn drop(&mut self) {
        self.vdev.refs.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Deref for VdevRef {
    type Target = VirtualInterface;

    fn deref(&self) -> &Self::Target {
        &self.vdev
    }
}

#[derive(Debug, Default)]
pub struct InterfaceDirectory {
    interfaces: RwLock<Vec<Arc<VirtualInterface>>>,
    discovery_stats: Mutex<DiscoveryStats>,
}

impl InterfaceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// First live interface matching `predicate`. Deleted interfaces waiting
    /// to be reaped aren't visible.
    fn find<F>(&self, predicate: F) -> Option<VdevRef>
    where
        F: Fn(&VirtualInterface) -> bool,
    {
        let interfaces = self.interfaces.read().unwrap_or_else(PoisonError::into_inner);
        interfaces
            .iter()
            .find(|vdev| vdev.state() != NdiState::Deleted && predicate(vdev))
            .map(VdevRef::acquire)
    }

    pub fn find_by_name(&self, name: &str) -> Option<VdevRef> {
        self.find(|vdev| vdev.name() == name)
    }

    pub fn find_by_opmode(&self, mode: OpMode) -> Option<VdevRef> {
        self.find(|vdev| vdev.mode() == mode)
    }

    pub fn find_by_id(&self, id: VdevId) -> Option<VdevRef> {
        self.find(|vdev| vdev.id() == id)
    }

    /// Like `find`, but a deleted interface still waiting to be reaped is
    /// returned when no live one matches, so callers can reject it on its
    /// state.
    fn lookup<F>(&self, predicate: F) -> Option<VdevRef>
    where
        F: Fn(&VirtualInterface) -> bool,
    {
        let interfaces = self.interfaces.read().unwrap_or_else(PoisonError::into_inner);
        interfaces
            .iter()
            .filter(|vdev| predicate(vdev))
            .min_by_key(|vdev| vdev.state() == NdiState::Deleted)
            .map(VdevRef::acquire)
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<VdevRef> {
        self.lookup(|vdev| vdev.name() == name)
    }

    pub fn lookup_by_opmode(&self, mode: OpMode) -> Option<VdevRef> {
        self.lookup(|vdev| vdev.mode() == mode)
    }

    pub fn find_all_by_opmode(&self, mode: OpMode) -> Vec<VdevRef> {
        let interfaces = self.interfaces.read().unwrap_or_else(PoisonError::into_inner);
        interfaces
            .iter()
            .filter(|vdev| vdev.state() != NdiState::Deleted && vdev.mode() == mode)
            .map(VdevRef::acquire)
            .collect()
    }

    /// Add a newly opened interface, returning the first reference to it
    pub fn insert(&self, vdev: VirtualInterface) -> VdevRef {
        let vdev = Arc::new(vdev);
        let vdev_ref = VdevRef::acquire(&vdev);
        log::debug!("[{}][{}] added to the directory", vdev.name(), vdev.state());
        self.interfaces
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(vdev);
        vdev_ref
    }

    /// Drop the deleted interfaces nobody holds anymore, returns how many
    pub fn reap(&self) -> usize {
        let mut interfaces = self
            .interfaces
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = interfaces.len();
        interfaces.retain(|vdev| {
            let reap = vdev.state() == NdiState::Deleted && vdev.ref_count() == 0;
            if reap {
                log::debug!("[{}][{}] removed from the directory", vdev.name(), vdev.state());
            }
            !reap
        });
        before - interfaces.len()
    }

    /// Number of entries, deleted ones not yet reaped included
    pub fn len(&self) -> usize {
        self.interfaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn discovery_stats(&self) -> DiscoveryStats {
        *self.discovery_stats_mut()
    }

    pub(crate) fn discovery_stats_mut(&self) -> MutexGuard<'_, DiscoveryStats> {
        self.discovery_stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Reset the psoc counters and the counters of every interface
    pub fn flush_stats(&self) {
        self.discovery_stats_mut().flush();
        let interfaces = self.interfaces.read().unwrap_or_else(PoisonError::into_inner);
        for vdev in interfaces.iter() {
            vdev.context().stats.flush();
        }
    }
}
