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

//! Services consumed from the embedding driver

use crate::{
    directory::{VdevId, VirtualInterface},
    error::CollaboratorError,
    peer::PeerIndication,
    requests::{NanDiscoveryRequest, NdpRequest},
};
use nanpath_attr::wire::serializer::AttributeWriter;
use nanpath_ndp_pkt::NdiResponse;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// Serializes create, delete and data requests on a network device against
/// its registration and unregistration
pub trait DeviceSync: Send + Sync {
    fn trans_start(&self, netdev: &str) -> Result<(), CollaboratorError>;

    fn trans_stop(&self, netdev: &str);

    fn register(&self, netdev: &str);

    fn unregister(&self, netdev: &str);
}

/// Device sync transaction, stopped when dropped
pub struct SyncTransaction<'a> {
    sync: &'a dyn DeviceSync,
    netdev: &'a str,
}

impl<'a> SyncTransaction<'a> {
    pub fn start(sync: &'a dyn DeviceSync, netdev: &'a str) -> Result<Self, CollaboratorError> {
        sync.trans_start(netdev)?;
        Ok(Self { sync, netdev })
    }
}

impl Drop for SyncTransaction<'_> {
    fn drop(&mut self) {
        self.sync.trans_stop(self.netdev);
    }
}

impl Debug for SyncTransaction<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncTransaction")
            .field("netdev", &self.netdev)
            .finish_non_exhaustive()
    }
}

/// Lower protocol engine. Responses and indications come back through
/// [`crate::NanDataPath::handle_event`].
pub trait ProtocolEngine: Send + Sync {
    fn submit(&self, request: NdpRequest) -> Result<(), CollaboratorError>;

    fn submit_discovery(&self, request: NanDiscoveryRequest) -> Result<(), CollaboratorError>;
}

/// Answers whether NAN operations are allowed with the current concurrent
/// connections
pub trait ConcurrencyPolicy: Send + Sync {
    fn is_ndp_allowed(&self) -> bool;

    fn is_sta_ndp_concurrency_allowed(&self, vdev: &VirtualInterface) -> bool;

    fn is_nan_enable_allowed(&self, freq: u32, vdev_id: VdevId) -> bool;

    fn is_nan_discovery_active(&self) -> bool;

    /// NDIs may only be created while NAN discovery runs
    fn nan_concurrency_control_supported(&self) -> bool;

    /// NAN discovery may run alongside other connections (DBS)
    fn nan_concurrency_supported(&self) -> bool;

    fn stop_opportunistic_timer(&self, vdev_id: VdevId);
}

/// Vendor command family an event is sent on
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum VendorFamily {
    Ndp,
    Nan,
}

/// Upper layer receiving the events
pub trait EventSink: Send + Sync {
    /// Buffer of `len` octets, `None` when it can't be allocated
    fn alloc(&self, family: VendorFamily, len: usize) -> Option<AttributeWriter>;

    fn deliver(&self, family: VendorFamily, buffer: Vec<u8>);
}

/// Interface management hooks, registered at runtime with
/// [`crate::NanDataPath::register_callbacks`]
pub trait InterfaceCallbacks: Send + Sync {
    fn ndi_set_mode(&self, name: &str) -> Result<(), CollaboratorError>;

    /// Open the interface, which is then tracked by the directory
    fn ndi_open(&self, name: &str) -> Result<VirtualInterface, CollaboratorError>;

    fn ndi_start(&self, name: &str, transaction_id: u16) -> Result<(), CollaboratorError>;

    fn ndi_delete(
        &self,
        vdev_id: VdevId,
        name: &str,
        transaction_id: u16,
    ) -> Result<(), CollaboratorError>;

    fn ndi_close(&self, vdev_id: VdevId);

    fn drv_ndi_create_rsp_handler(&self, vdev_id: VdevId, response: &NdiResponse);

    /// The delete response event is emitted afterward by the session end
    fn drv_ndi_delete_rsp_handler(&self, vdev_id: VdevId);

    fn new_peer_ind(
        &self,
        vdev_id: VdevId,
        peer: &PeerIndication,
        first_peer: bool,
    ) -> Result<(), CollaboratorError>;

    fn peer_departed_ind(&self, vdev_id: VdevId, peer: &PeerIndication, last_peer: bool);
}
