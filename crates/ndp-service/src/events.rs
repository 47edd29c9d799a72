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

use crate::peer::PeerIndication;
use nanpath_ndp_pkt::{
    ConfirmIndication, EndIndication, InitiatorResponse, NdiResponse, NdpResponse,
    RequestIndication, ScheduleUpdateIndication,
};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Event reported by the protocol engine for one virtual interface
#[derive(Display, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NdpEvent {
    #[strum(to_string = "NDI_CREATE_RSP")]
    InterfaceCreateResponse(NdiResponse),
    #[strum(to_string = "NDI_DELETE_RSP")]
    InterfaceDeleteResponse(NdiResponse),
    #[strum(to_string = "NDP_INITIATOR_RSP")]
    InitiatorResponse(InitiatorResponse),
    #[strum(to_string = "NDP_RESPONDER_RSP")]
    ResponderResponse(NdpResponse),
    #[strum(to_string = "NDP_END_RSP")]
    EndResponse(NdpResponse),
    #[strum(to_string = "NDP_INDICATION")]
    RequestIndication(RequestIndication),
    #[strum(to_string = "NDP_CONFIRM")]
    ConfirmIndication(ConfirmIndication),
    #[strum(to_string = "NDP_END_IND")]
    EndIndication(EndIndication),
    #[strum(to_string = "NDP_SCHEDULE_UPDATE")]
    ScheduleUpdateIndication(ScheduleUpdateIndication),
    #[strum(to_string = "NDP_NEW_PEER")]
    NewPeer(PeerIndication),
    #[strum(to_string = "NDP_PEER_DEPARTED")]
    PeerDeparted(PeerIndication),
}
