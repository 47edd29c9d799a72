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

//! Handling of the protocol engine's responses and indications

use crate::{
    directory::{OpMode, VdevId, VdevRef, VirtualInterface},
    emitter, ensure_data_path_allowed,
    error::NdpError,
    events::NdpEvent,
    fsm::{NdiEvent, NdiState},
    peer::PeerIndication,
    NanDataPath,
};
use nanpath_ndp_pkt::{
    iana::{NanSubcommand, NdpInternalReason, NdpResponseStatus},
    NanEventMessage, NdiResponse, NdpEventMessage,
};

const fn ndi_response(success: bool, failure: NdpInternalReason) -> NdiResponse {
    if success {
        NdiResponse {
            status: NdpResponseStatus::Success,
            reason: 0,
        }
    } else {
        NdiResponse {
            status: NdpResponseStatus::Error,
            reason: failure as u32,
        }
    }
}

impl NanDataPath {
    /// Process one event of the protocol engine for the interface `vdev_id`.
    ///
    /// An event that can't be delivered is logged and dropped, the error is
    /// returned for the caller's information only.
    pub fn handle_event(&self, vdev_id: VdevId, event: NdpEvent) -> Result<(), NdpError> {
        let result = match self.directory.find_by_id(vdev_id) {
            Some(vdev) => {
                let kind = event.to_string();
                let result = self.dispatch_event(&vdev, event);
                vdev.context().stats.record_event(&result);
                if let Err(err) = &result {
                    log::error!(
                        "[{}][{}] dropped {kind}: {err}",
                        vdev.name(),
                        vdev.state()
                    );
                }
                result
            }
            None => {
                log::error!("[vdev {vdev_id}] no interface for {event}");
                Err(NdpError::NotFound(format!("vdev {vdev_id}")))
            }
        };
        self.directory.reap();
        result
    }

    /// Synthesize the create response for `vdev_id`
    pub fn post_ndi_create_rsp(&self, vdev_id: VdevId, success: bool) -> Result<(), NdpError> {
        let response = ndi_response(success, NdpInternalReason::IfaceCreateFailed);
        self.handle_event(vdev_id, NdpEvent::InterfaceCreateResponse(response))
    }

    /// Synthesize the delete response for `vdev_id`
    pub fn post_ndi_delete_rsp(&self, vdev_id: VdevId, success: bool) -> Result<(), NdpError> {
        let response = ndi_response(success, NdpInternalReason::IfaceDeleteFailed);
        self.handle_event(vdev_id, NdpEvent::InterfaceDeleteResponse(response))
    }

    /// Report the end of the NDI session to the upper layer and mark the
    /// interface deleted
    pub fn ndi_session_end(&self, vdev_id: VdevId) -> Result<(), NdpError> {
        let result = self
            .find_by_id(vdev_id)
            .and_then(|vdev| self.session_end(&vdev));
        self.directory.reap();
        result
    }

    /// Pass a NAN discovery event of the protocol engine to the upper layer
    pub fn handle_discovery_event(
        &self,
        vdev_id: VdevId,
        event: NanEventMessage,
    ) -> Result<(), NdpError> {
        let result = self.find_by_id(vdev_id).and_then(|_vdev| {
            if event.subcommand == NanSubcommand::DisableIndication {
                self.nan_disabled();
            }
            emitter::emit_nan(self.sink.as_ref(), &event)
        });
        self.directory
            .discovery_stats_mut()
            .events_mut()
            .record(&result);
        if let Err(err) = &result {
            log::error!("[vdev {vdev_id}] dropped NAN {} event: {err}", event.subcommand);
        }
        result
    }

    fn emit(&self, message: &NdpEventMessage) -> Result<(), NdpError> {
        emitter::emit_ndp(self.sink.as_ref(), message)
    }

    fn dispatch_event(&self, vdev: &VdevRef, event: NdpEvent) -> Result<(), NdpError> {
        match event {
            NdpEvent::InterfaceCreateResponse(response) => self.on_create_response(vdev, response),
            NdpEvent::InterfaceDeleteResponse(response) => self.on_delete_response(vdev, response),
            NdpEvent::InitiatorResponse(rsp) => self.emit(&NdpEventMessage::InitiatorResponse(rsp)),
            NdpEvent::ResponderResponse(rsp) => self.emit(&NdpEventMessage::ResponderResponse(rsp)),
            NdpEvent::EndResponse(rsp) => self.emit(&NdpEventMessage::EndResponse(rsp)),
            NdpEvent::RequestIndication(indication) => {
                ensure_data_path_allowed(vdev)?;
                self.emit(&NdpEventMessage::RequestIndication {
                    iface: vdev.name().to_string(),
                    indication,
                })
            }
            NdpEvent::ConfirmIndication(confirm) => {
                self.emit(&NdpEventMessage::ConfirmIndication {
                    iface: vdev.name().to_string(),
                    confirm,
                })
            }
            NdpEvent::EndIndication(indication) => {
                self.emit(&NdpEventMessage::EndIndication(indication))
            }
            NdpEvent::ScheduleUpdateIndication(update) => {
                self.emit(&NdpEventMessage::ScheduleUpdateIndication(update))
            }
            NdpEvent::NewPeer(peer) => self.on_new_peer(vdev, &peer),
            NdpEvent::PeerDeparted(peer) => self.on_peer_departed(vdev, &peer),
        }
    }

    fn on_create_response(&self, vdev: &VdevRef, response: NdiResponse) -> Result<(), NdpError> {
        let callbacks = self.callbacks()?;
        let transaction_id = vdev.create_transaction_id().unwrap_or_default();
        let message = NdpEventMessage::InterfaceCreateResponse {
            transaction_id,
            response,
        };
        if response.status == NdpResponseStatus::Success {
            log::debug!(
                "[{}][{}] NDI created, transaction id {transaction_id}",
                vdev.name(),
                vdev.state()
            );
            vdev.transition(NdiEvent::CreateSucceeded)?;
            callbacks.drv_ndi_create_rsp_handler(vdev.id(), &response);
            self.emit(&message)
        } else {
            log::error!(
                "[{}][{}] NDI creation failed with reason {}",
                vdev.name(),
                vdev.state(),
                response.reason
            );
            // Emitted before the interface is closed, whatever the outcome
            let emitted = self.emit(&message);
            callbacks.ndi_close(vdev.id());
            vdev.transition(NdiEvent::CreateFailed)?;
            emitted
        }
    }

    fn on_delete_response(&self, vdev: &VdevRef, response: NdiResponse) -> Result<(), NdpError> {
        let callbacks = self.callbacks()?;
        if response.status == NdpResponseStatus::Success {
            log::debug!("[{}][{}] NDI stopped", vdev.name(), vdev.state());
        } else {
            log::error!(
                "[{}][{}] NDI stop failed with reason {}",
                vdev.name(),
                vdev.state(),
                response.reason
            );
        }
        vdev.context().delete_response = Some(response);
        callbacks.drv_ndi_delete_rsp_handler(vdev.id());
        self.session_end(vdev)
    }

    pub(crate) fn session_end(&self, vdev: &VirtualInterface) -> Result<(), NdpError> {
        let state = vdev.state();
        match state {
            NdiState::Deleting | NdiState::Disconnected => {}
            NdiState::Created => {
                log::debug!("[{}][{state}] no session to end yet", vdev.name());
                return Ok(());
            }
            _ => {
                log::error!("[{}][{state}] can't end the NDI session", vdev.name());
                return Err(NdpError::InvalidState(state));
            }
        }
        let (transaction_id, response) = {
            let context = vdev.context();
            (
                context.delete_transaction_id.unwrap_or_default(),
                context
                    .delete_response
                    .unwrap_or_else(|| ndi_response(true, NdpInternalReason::IfaceDeleteFailed)),
            )
        };
        self.emit(&NdpEventMessage::InterfaceDeleteResponse {
            transaction_id,
            response,
        })?;
        vdev.context().delete_transaction_id = None;
        vdev.transition(NdiEvent::SessionEnded)?;
        Ok(())
    }

    fn on_new_peer(&self, vdev: &VdevRef, peer: &PeerIndication) -> Result<(), NdpError> {
        let callbacks = self.callbacks()?;
        let first_peer = vdev.active_peers() == 0;
        callbacks
            .new_peer_ind(vdev.id(), peer, first_peer)
            .map_err(NdpError::Callback)?;
        let active = vdev.context().peers.connected();
        if vdev.state() == NdiState::Disconnected {
            vdev.transition(NdiEvent::PeerConnected)?;
        }
        log::debug!(
            "[{}][{}] peer {} connected with sta id {}, {active} active peers",
            vdev.name(),
            vdev.state(),
            peer.peer_mac,
            peer.sta_id
        );
        Ok(())
    }

    fn on_peer_departed(&self, vdev: &VdevRef, peer: &PeerIndication) -> Result<(), NdpError> {
        let callbacks = self.callbacks()?;
        let remaining = vdev.context().peers.departed();
        let Some(remaining) = remaining else {
            log::warn!(
                "[{}][{}] peer {} departed while no peer is active",
                vdev.name(),
                vdev.state(),
                peer.peer_mac
            );
            return Ok(());
        };
        callbacks.peer_departed_ind(vdev.id(), peer, remaining == 0);
        log::debug!(
            "[{}][{}] peer {} departed, {remaining} active peers",
            vdev.name(),
            vdev.state(),
            peer.peer_mac
        );
        if remaining == 0 {
            if vdev.state() == NdiState::Connected {
                vdev.transition(NdiEvent::AllPeersDeparted)?;
            }
            let completed = vdev.context().peers.complete_end_all();
            if completed {
                log::debug!("[{}][{}] end all waiter completed", vdev.name(), vdev.state());
            }
        }
        Ok(())
    }

    /// NAN was disabled, the connected NDIs lose their peers
    fn nan_disabled(&self) {
        for vdev in self.directory.find_all_by_opmode(OpMode::Ndi) {
            if vdev.state() == NdiState::Connected && vdev.transition(NdiEvent::Disabled).is_ok() {
                log::debug!("[{}][{}] NAN disabled", vdev.name(), vdev.state());
            }
        }
    }
}
