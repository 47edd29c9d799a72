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

use serde::{Deserialize, Serialize};

/// Lifecycle of a NAN Data Interface
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum NdiState {
    #[default]
    Created,
    Creating,
    Connected,
    Disconnected,
    Deleting,
    Deleted,
}

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum NdiEvent {
    /// Interface create request accepted
    CreateRequested,
    CreateSucceeded,
    CreateFailed,
    /// Last active peer left
    AllPeersDeparted,
    /// NAN was disabled while the interface had peers
    Disabled,
    PeerConnected,
    /// Interface delete request accepted
    DeleteRequested,
    DeleteCompleted,
    /// Delete response reported to the upper layer
    SessionEnded,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("InvalidTransition({event}, {state})")]
pub struct InvalidTransition {
    pub event: NdiEvent,
    pub state: NdiState,
}

impl NdiState {
    /// State reached when `event` happens in this state
    pub const fn next(self, event: NdiEvent) -> Result<NdiState, InvalidTransition> {
        let next = match (self, event) {
            (NdiState::Created, NdiEvent::CreateRequested) => NdiState::Creating,
            (NdiState::Creating, NdiEvent::CreateSucceeded) => NdiState::Connected,
            (NdiState::Creating, NdiEvent::CreateFailed) => NdiState::Deleted,
            (NdiState::Connected, NdiEvent::AllPeersDeparted)
            | (NdiState::Connected, NdiEvent::Disabled) => NdiState::Disconnected,
            (NdiState::Disconnected, NdiEvent::PeerConnected) => NdiState::Connected,
            (NdiState::Connected, NdiEvent::DeleteRequested)
            | (NdiState::Disconnected, NdiEvent::DeleteRequested)
            | (NdiState::Created, NdiEvent::DeleteRequested) => NdiState::Deleting,
            (NdiState::Deleting, NdiEvent::DeleteCompleted)
            | (NdiState::Deleting, NdiEvent::SessionEnded)
            | (NdiState::Disconnected, NdiEvent::SessionEnded) => NdiState::Deleted,
            (state, event) => return Err(InvalidTransition { event, state }),
        };
        Ok(next)
    }

    /// Data path requests and indications need an established interface
    pub const fn allows_data_path(self) -> bool {
        !matches!(
            self,
            NdiState::Creating | NdiState::Deleting | NdiState::Deleted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    #[rstest]
    #[case(NdiState::Created, NdiEvent::CreateRequested, NdiState::Creating)]
    #[case(NdiState::Creating, NdiEvent::CreateSucceeded, NdiState::Connected)]
    #[case(NdiState::Creating, NdiEvent::CreateFailed, NdiState::Deleted)]
    #[case(NdiState::Connected, NdiEvent::AllPeersDeparted, NdiState::Disconnected)]
    #[case(NdiState::Connected, NdiEvent::Disabled, NdiState::Disconnected)]
    #[case(NdiState::Disconnected, NdiEvent::PeerConnected, NdiState::Connected)]
    #[case(NdiState::Connected, NdiEvent::DeleteRequested, NdiState::Deleting)]
    #[case(NdiState::Disconnected, NdiEvent::DeleteRequested, NdiState::Deleting)]
    #[case(NdiState::Created, NdiEvent::DeleteRequested, NdiState::Deleting)]
    #[case(NdiState::Deleting, NdiEvent::DeleteCompleted, NdiState::Deleted)]
    #[case(NdiState::Deleting, NdiEvent::SessionEnded, NdiState::Deleted)]
    #[case(NdiState::Disconnected, NdiEvent::SessionEnded, NdiState::Deleted)]
    fn test_transitions(#[case] from: NdiState, #[case] event: NdiEvent, #[case] to: NdiState) {
        assert_eq!(from.next(event), Ok(to));
    }

    #[test]
    fn test_deleted_is_terminal() {
        for event in NdiEvent::iter() {
            assert_eq!(
                NdiState::Deleted.next(event),
                Err(InvalidTransition {
                    event,
                    state: NdiState::Deleted
                })
            );
        }
    }

    #[test]
    fn test_no_data_path_while_in_transit() {
        let denied = NdiState::iter()
            .filter(|state| !state.allows_data_path())
            .collect::<Vec<_>>();
        assert_eq!(
            denied,
            vec![NdiState::Creating, NdiState::Deleting, NdiState::Deleted]
        );
    }

    #[test]
    fn test_create_twice_is_rejected() {
        let err = NdiState::Creating.next(NdiEvent::CreateRequested);
        assert_eq!(
            err.map_err(|err| err.to_string()),
            Err("InvalidTransition(CreateRequested, Creating)".to_string())
        );
    }
}
