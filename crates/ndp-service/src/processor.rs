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

//! Processing of the vendor commands of the upper layer.
//!
//! A command is fully decoded before any interface is looked up. Every
//! reference taken on an interface is released on return, on success or
//! error alike.

use crate::{
    collaborators::{InterfaceCallbacks, SyncTransaction},
    directory::{OpMode, VdevId, VdevRef},
    ensure_data_path_allowed,
    error::NdpError,
    fsm::NdiEvent,
    requests::{
        NanDiscoveryRequest, NanEnableRequest, NdpEndRequest, NdpInitiatorRequest, NdpRequest,
        NdpResponderRequest,
    },
    NanDataPath,
};
use nanpath_ndp_pkt::{
    iana::{NdpAttribute, NdpResponseCode, NdpSubcommand},
    wire::deserializer::CommandParsingError,
    EndCommand, InitiatorCommand, InterfaceCommand, NanDiscoveryCommand, NanEnableCommand,
    NdpCommand, ResponderCommand,
};

impl NanDataPath {
    /// Decode and process one NDP command received on `netdev`
    pub fn handle_ndp_command(&self, netdev: &str, buf: &[u8]) -> Result<(), NdpError> {
        let command = NdpCommand::from_wire(buf)?;
        log::debug!(
            "[{netdev}] received {}, transaction id {}",
            command.subcommand(),
            command.transaction_id()
        );
        match &command {
            NdpCommand::InterfaceCreate(_) => self.ensure_create_allowed()?,
            NdpCommand::InterfaceDelete(_) => {}
            NdpCommand::Initiator(_) | NdpCommand::Responder(_) | NdpCommand::End(_) => {
                self.ensure_ndp_allowed()?
            }
        }
        let transaction =
            SyncTransaction::start(self.device_sync.as_ref(), netdev).map_err(NdpError::Callback)?;
        let result = match command {
            NdpCommand::InterfaceCreate(cmd) => self.interface_create(netdev, cmd),
            NdpCommand::InterfaceDelete(cmd) => self.interface_delete(netdev, cmd),
            NdpCommand::Initiator(cmd) => self.initiator_request(cmd),
            NdpCommand::Responder(cmd) => self.responder_request(cmd),
            NdpCommand::End(cmd) => self.end_request(cmd),
        };
        drop(transaction);
        self.directory.reap();
        result
    }

    /// Decode and process one NAN discovery command for `vdev_id`
    pub fn handle_nan_discovery_command(&self, vdev_id: VdevId, buf: &[u8]) -> Result<(), NdpError> {
        let command = NanDiscoveryCommand::from_wire(buf)?;
        if !self.policy.nan_concurrency_supported() {
            self.policy.stop_opportunistic_timer(vdev_id);
        }
        match command {
            NanDiscoveryCommand::Generic { data } => {
                let result = self.submit_discovery(NanDiscoveryRequest::Generic { data });
                self.directory
                    .discovery_stats_mut()
                    .passthrough_mut()
                    .record(&result);
                result
            }
            NanDiscoveryCommand::Enable(cmd) => {
                let result = self.nan_enable(vdev_id, cmd);
                self.directory
                    .discovery_stats_mut()
                    .enable_mut()
                    .record(&result);
                result
            }
            NanDiscoveryCommand::Disable { data } => {
                let result = self.submit_discovery(NanDiscoveryRequest::Disable { data });
                self.directory
                    .discovery_stats_mut()
                    .disable_mut()
                    .record(&result);
                result
            }
        }
    }

    fn nan_concurrency_control(&self) -> bool {
        self.config
            .nan_concurrency_control
            .unwrap_or_else(|| self.policy.nan_concurrency_control_supported())
    }

    fn ensure_create_allowed(&self) -> Result<(), NdpError> {
        if self.nan_concurrency_control() && !self.policy.is_nan_discovery_active() {
            log::error!("NDI creation is not allowed while NAN discovery is disabled");
            return Err(NdpError::Unsupported(
                "NDI creation without NAN discovery".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_ndp_allowed(&self) -> Result<(), NdpError> {
        if !self.policy.is_ndp_allowed() {
            log::error!("NDP is not allowed with the current concurrent connections");
            return Err(NdpError::Unsupported(
                "NDP with the current concurrency".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_sta_ndp_allowed(&self, vdev: &VdevRef) -> Result<(), NdpError> {
        if !self.policy.is_sta_ndp_concurrency_allowed(vdev) {
            log::error!(
                "[{}][{}] STA and NDP concurrency is not allowed",
                vdev.name(),
                vdev.state()
            );
            return Err(NdpError::Unsupported("STA and NDP concurrency".to_string()));
        }
        Ok(())
    }

    fn find_ndi_by_name(&self, name: &str) -> Result<VdevRef, NdpError> {
        match self.directory.lookup_by_name(name) {
            Some(vdev) if vdev.mode() == OpMode::Ndi => Ok(vdev),
            Some(vdev) => {
                log::error!(
                    "[{}][{}] interface is in {} mode, not an NDI",
                    vdev.name(),
                    vdev.state(),
                    vdev.mode()
                );
                Err(NdpError::NotFound(name.to_string()))
            }
            None => {
                log::error!("[{name}] NDI not found");
                Err(NdpError::NotFound(name.to_string()))
            }
        }
    }

    fn first_ndi(&self) -> Result<VdevRef, NdpError> {
        self.directory
            .lookup_by_opmode(OpMode::Ndi)
            .ok_or_else(|| NdpError::NotFound(OpMode::Ndi.to_string()))
    }

    fn submit(&self, request: NdpRequest) -> Result<(), NdpError> {
        log::debug!(
            "[{}][{}] sending {request}, transaction id {}",
            request.vdev().name(),
            request.vdev().state(),
            request.transaction_id()
        );
        self.engine.submit(request).map_err(NdpError::Engine)
    }

    fn submit_discovery(&self, request: NanDiscoveryRequest) -> Result<(), NdpError> {
        log::debug!("sending {request}");
        self.engine
            .submit_discovery(request)
            .map_err(NdpError::Engine)
    }

    fn interface_create(&self, netdev: &str, cmd: InterfaceCommand) -> Result<(), NdpError> {
        let callbacks = self.callbacks()?;
        if let Some(existing) = self.directory.find_by_name(&cmd.iface) {
            log::error!(
                "[{}][{}] interface already exists",
                existing.name(),
                existing.state()
            );
            return Err(NdpError::AlreadyExists(cmd.iface));
        }
        callbacks
            .ndi_set_mode(&cmd.iface)
            .map_err(NdpError::Callback)?;
        let opened = callbacks.ndi_open(&cmd.iface).map_err(NdpError::Callback)?;
        let vdev = self.directory.insert(opened);
        let result = Self::start_interface(callbacks.as_ref(), &vdev, cmd.transaction_id);
        vdev.context()
            .stats
            .record_operation(NdpSubcommand::InterfaceCreate, &result);
        if result.is_ok() {
            self.device_sync.register(netdev);
        }
        result
    }

    fn start_interface(
        callbacks: &dyn InterfaceCallbacks,
        vdev: &VdevRef,
        transaction_id: u16,
    ) -> Result<(), NdpError> {
        vdev.context().create_transaction_id = Some(transaction_id);
        vdev.transition(NdiEvent::CreateRequested)?;
        if let Err(err) = callbacks.ndi_start(vdev.name(), transaction_id) {
            log::error!(
                "[{}][{}] NDI start failed with {err}",
                vdev.name(),
                vdev.state()
            );
            // Always allowed from Creating
            let _ = vdev.transition(NdiEvent::CreateFailed);
            callbacks.ndi_close(vdev.id());
            return Err(NdpError::Callback(err));
        }
        Ok(())
    }

    fn interface_delete(&self, netdev: &str, cmd: InterfaceCommand) -> Result<(), NdpError> {
        let callbacks = self.callbacks()?;
        let vdev = self.find_ndi_by_name(&cmd.iface)?;
        let result = self.delete_interface(netdev, callbacks.as_ref(), &vdev, cmd.transaction_id);
        vdev.context()
            .stats
            .record_operation(NdpSubcommand::InterfaceDelete, &result);
        result
    }

    fn delete_interface(
        &self,
        netdev: &str,
        callbacks: &dyn InterfaceCallbacks,
        vdev: &VdevRef,
        transaction_id: u16,
    ) -> Result<(), NdpError> {
        let peers = vdev.active_peers();
        if peers > 0 {
            log::warn!(
                "[{}][{}] {peers} NDP peers still active, their data paths may not be terminated",
                vdev.name(),
                vdev.state()
            );
        }
        // The delete may complete before the callback returns, so the
        // interface is moved to Deleting beforehand and restored on failure
        let before = vdev.state();
        vdev.transition(NdiEvent::DeleteRequested)?;
        vdev.context().delete_transaction_id = Some(transaction_id);
        self.device_sync.unregister(netdev);
        if let Err(err) = callbacks.ndi_delete(vdev.id(), vdev.name(), transaction_id) {
            log::error!(
                "[{}][{}] NDI delete failed with {err}",
                vdev.name(),
                vdev.state()
            );
            vdev.context().delete_transaction_id = None;
            vdev.restore_state(before);
            self.device_sync.register(netdev);
            return Err(NdpError::Callback(err));
        }
        Ok(())
    }

    fn initiator_request(&self, cmd: InitiatorCommand) -> Result<(), NdpError> {
        let vdev = self.find_ndi_by_name(&cmd.iface)?;
        let result = self.submit_initiator(&vdev, cmd);
        vdev.context()
            .stats
            .record_operation(NdpSubcommand::InitiatorRequest, &result);
        result
    }

    fn submit_initiator(&self, vdev: &VdevRef, cmd: InitiatorCommand) -> Result<(), NdpError> {
        ensure_data_path_allowed(vdev)?;
        self.ensure_sta_ndp_allowed(vdev)?;
        self.submit(NdpRequest::Initiator(NdpInitiatorRequest {
            vdev: vdev.clone(),
            transaction_id: cmd.transaction_id,
            service_instance_id: cmd.service_instance_id,
            channel: cmd.channel,
            peer_discovery_mac: cmd.peer_discovery_mac,
            self_ndi_mac: vdev.mac(),
            app_info: cmd.app_info,
            qos: cmd.qos,
            ipv6: cmd.ipv6,
            security: cmd.security,
        }))
    }

    fn responder_request(&self, cmd: ResponderCommand) -> Result<(), NdpError> {
        let vdev = match (cmd.response_code, cmd.iface.as_deref()) {
            (NdpResponseCode::Accept, Some(iface)) => self.find_ndi_by_name(iface)?,
            (NdpResponseCode::Accept, None) => {
                return Err(NdpError::MissingAttribute(
                    CommandParsingError::MissingAttribute(NdpAttribute::IfaceStr),
                ))
            }
            (code, _) => {
                log::debug!("NDP response {code}, using the first NDI");
                self.first_ndi()?
            }
        };
        let result = self.submit_responder(&vdev, cmd);
        vdev.context()
            .stats
            .record_operation(NdpSubcommand::ResponderRequest, &result);
        result
    }

    fn submit_responder(&self, vdev: &VdevRef, cmd: ResponderCommand) -> Result<(), NdpError> {
        ensure_data_path_allowed(vdev)?;
        if cmd.response_code == NdpResponseCode::Accept {
            self.ensure_sta_ndp_allowed(vdev)?;
        }
        self.submit(NdpRequest::Responder(NdpResponderRequest {
            vdev: vdev.clone(),
            transaction_id: cmd.transaction_id,
            instance_id: cmd.instance_id,
            response_code: cmd.response_code,
            app_info: cmd.app_info,
            qos: cmd.qos,
            ipv6: cmd.ipv6,
            transport_port: cmd.transport_port,
            transport_protocol: cmd.transport_protocol,
            security: cmd.security,
        }))
    }

    fn end_request(&self, cmd: EndCommand) -> Result<(), NdpError> {
        if cmd.instance_ids.len() > self.config.max_ndp_instances {
            log::error!(
                "end request carries {} instance ids, at most {} are accepted",
                cmd.instance_ids.len(),
                self.config.max_ndp_instances
            );
            return Err(NdpError::MalformedAttribute(
                CommandParsingError::InvalidInstanceIdArrayLength(cmd.instance_ids.len() * 4),
            ));
        }
        let vdev = self.first_ndi()?;
        let result = ensure_data_path_allowed(&vdev).and_then(|()| {
            self.submit(NdpRequest::End(NdpEndRequest {
                vdev: vdev.clone(),
                transaction_id: cmd.transaction_id,
                instance_ids: cmd.instance_ids,
            }))
        });
        vdev.context()
            .stats
            .record_operation(NdpSubcommand::EndRequest, &result);
        result
    }

    fn nan_enable(&self, vdev_id: VdevId, cmd: NanEnableCommand) -> Result<(), NdpError> {
        if !self.policy.is_nan_enable_allowed(cmd.freq_24ghz, vdev_id) {
            log::error!(
                "[vdev {vdev_id}] NAN enable is not allowed on {} MHz",
                cmd.freq_24ghz
            );
            return Err(NdpError::Unsupported(format!(
                "NAN enable on {} MHz",
                cmd.freq_24ghz
            )));
        }
        self.submit_discovery(NanDiscoveryRequest::Enable(NanEnableRequest {
            vdev_id,
            social_chan_2g_freq: cmd.freq_24ghz,
            social_chan_5g_freq: cmd.freq_5ghz,
            rtt_capability: self.config.rtt_capability,
            disable_6g_nan: self.config.disable_6g_nan,
            data: cmd.data,
        }))
    }
}
