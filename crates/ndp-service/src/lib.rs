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

//! NAN Data Path command and event core.
//!
//! [`NanDataPath`] decodes the NDP and NAN discovery vendor commands of the
//! upper layer, tracks the NAN Data Interfaces (NDI) they create, forwards
//! data path requests to the protocol engine and turns the engine's
//! responses and indications back into vendor events.
//!
//! Every platform facing piece is a trait in [`collaborators`], injected
//! when the core is built. The interface callbacks are registered later at
//! runtime, commands that need them are rejected until then.

#![deny(missing_debug_implementations)]
#![deny(rust_2018_idioms)]
#![deny(unreachable_pub)]
#![forbid(unsafe_code)]

pub mod collaborators;
pub mod config;
pub mod directory;
mod emitter;
pub mod error;
pub mod events;
pub mod fsm;
mod handlers;
pub mod peer;
mod processor;
pub mod requests;
pub mod stats;

#[cfg(test)]
mod tests;

use crate::{
    collaborators::{ConcurrencyPolicy, DeviceSync, EventSink, InterfaceCallbacks, ProtocolEngine},
    config::NanDataPathConfig,
    directory::{InterfaceDirectory, VdevId, VirtualInterface},
    error::NdpError,
    peer::EndAllReceiver,
};
use std::{
    fmt::{Debug, Formatter},
    sync::{Arc, PoisonError, RwLock},
};

pub struct NanDataPath {
    config: NanDataPathConfig,
    directory: InterfaceDirectory,
    device_sync: Arc<dyn DeviceSync>,
    engine: Arc<dyn ProtocolEngine>,
    policy: Arc<dyn ConcurrencyPolicy>,
    sink: Arc<dyn EventSink>,
    callbacks: RwLock<Option<Arc<dyn InterfaceCallbacks>>>,
}

impl Debug for NanDataPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NanDataPath")
            .field("config", &self.config)
            .field("directory", &self.directory)
            .field("callbacks_registered", &self.callbacks().is_ok())
            .finish_non_exhaustive()
    }
}

impl NanDataPath {
    pub fn new(
        config: NanDataPathConfig,
        device_sync: Arc<dyn DeviceSync>,
        engine: Arc<dyn ProtocolEngine>,
        policy: Arc<dyn ConcurrencyPolicy>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            directory: InterfaceDirectory::new(),
            device_sync,
            engine,
            policy,
            sink,
            callbacks: RwLock::new(None),
        }
    }

    pub const fn config(&self) -> &NanDataPathConfig {
        &self.config
    }

    pub const fn directory(&self) -> &InterfaceDirectory {
        &self.directory
    }

    /// Install the interface management hooks, replacing any previous set
    pub fn register_callbacks(&self, callbacks: Arc<dyn InterfaceCallbacks>) {
        let mut registered = self
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if registered.is_some() {
            log::info!("replacing the registered NDI callbacks");
        }
        *registered = Some(callbacks);
    }

    fn callbacks(&self) -> Result<Arc<dyn InterfaceCallbacks>, NdpError> {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| NdpError::Unsupported("NDI callbacks are not registered".to_string()))
    }

    /// Entry point of the NDP vendor command, returns zero or a negative
    /// errno
    pub fn process_ndp_command(&self, netdev: &str, buf: &[u8]) -> i32 {
        match self.handle_ndp_command(netdev, buf) {
            Ok(()) => 0,
            Err(err) => {
                log::error!("[{netdev}] NDP command failed: {err}");
                err.errno()
            }
        }
    }

    /// Entry point of the NAN discovery vendor command, returns zero or a
    /// negative errno
    pub fn process_nan_discovery_command(&self, pdev_id: u8, vdev_id: VdevId, buf: &[u8]) -> i32 {
        match self.handle_nan_discovery_command(vdev_id, buf) {
            Ok(()) => 0,
            Err(err) => {
                log::error!("[pdev {pdev_id}][vdev {vdev_id}] NAN discovery command failed: {err}");
                err.errno()
            }
        }
    }

    /// Completed once the last active peer of the interface leaves
    pub fn register_end_all_waiter(&self, vdev_id: VdevId) -> Result<EndAllReceiver, NdpError> {
        let vdev = self.find_by_id(vdev_id)?;
        let receiver = vdev.context().peers.register_end_all();
        Ok(receiver)
    }

    /// Reset the counters of every interface and the discovery counters
    pub fn flush_stats(&self) {
        self.directory.flush_stats();
    }

    fn find_by_id(&self, vdev_id: VdevId) -> Result<directory::VdevRef, NdpError> {
        self.directory
            .find_by_id(vdev_id)
            .ok_or_else(|| NdpError::NotFound(format!("vdev {vdev_id}")))
    }
}

/// Data requests and request indications need an interface that is neither
/// being created nor going away
fn ensure_data_path_allowed(vdev: &VirtualInterface) -> Result<(), NdpError> {
    let state = vdev.state();
    if state.allows_data_path() {
        Ok(())
    } else {
        log::error!("[{}][{state}] data path not allowed", vdev.name());
        Err(NdpError::InvalidState(state))
    }
}
