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

use super::*;
use crate::{
    error::NdpError,
    fsm::NdiState,
    requests::{NanEnableRequest, NdpRequest},
};
use nanpath_ndp_pkt::{
    iana::NdpResponseStatus, wire::deserializer::CommandParsingError, NdpEventMessage,
};
use rstest::rstest;

fn success() -> NdiResponse {
    NdiResponse {
        status: NdpResponseStatus::Success,
        reason: 0,
    }
}

#[test_log::test]
fn test_create_reaches_connected() {
    let h = Harness::new();
    let vdev_id = h.connected_ndi("nan0", 1);
    assert_eq!(vdev_id, 1);

    let vdev = h.core.directory().find_by_name("nan0").unwrap();
    assert_eq!(vdev.state(), NdiState::Connected);
    assert_eq!(vdev.mode(), OpMode::Ndi);
    assert_eq!(vdev.ref_count(), 1);
    assert_eq!(vdev.create_transaction_id(), Some(1));
    assert_eq!(vdev.stats().interface_create().attempts(), 1);
    assert_eq!(vdev.stats().interface_create().failures(), 0);
    drop(vdev);

    assert_eq!(
        h.callbacks.calls(),
        vec![
            Call::SetMode("nan0".to_string()),
            Call::Open("nan0".to_string()),
            Call::Start("nan0".to_string(), 1),
            Call::CreateRsp(1, success()),
        ]
    );
    assert_eq!(
        h.sync.log(),
        vec![
            format!("start {NETDEV}"),
            format!("register {NETDEV}"),
            format!("stop {NETDEV}"),
        ]
    );
    let expected = NdpEventMessage::InterfaceCreateResponse {
        transaction_id: 1,
        response: success(),
    };
    assert_eq!(
        h.sink.delivered(),
        vec![(VendorFamily::Ndp, test_write_plan(&expected.fields()))]
    );
}

#[test_log::test]
fn test_duplicate_create_is_rejected() {
    let h = Harness::new();
    h.connected_ndi("nan0", 1);
    let buf = interface_command(NdpSubcommand::InterfaceCreate, 2, "nan0");
    assert_eq!(
        h.core.handle_ndp_command(NETDEV, &buf),
        Err(NdpError::AlreadyExists("nan0".to_string()))
    );
    assert_eq!(h.ndp(&buf), -libc::EEXIST);
    assert_eq!(h.core.directory().len(), 1);
    assert_eq!(
        h.core.directory().find_by_name("nan0").unwrap().ref_count(),
        1
    );
}

#[test_log::test]
fn test_create_start_failure_closes_the_interface() {
    let h = Harness::new();
    h.callbacks.fail_start.store(true, Ordering::SeqCst);
    let buf = interface_command(NdpSubcommand::InterfaceCreate, 1, "nan0");
    assert_eq!(h.ndp(&buf), -libc::EFAULT);
    assert_eq!(h.callbacks.calls().last(), Some(&Call::Close(1)));
    // Deleted and no longer referenced, so already reaped
    assert!(h.core.directory().is_empty());
    assert!(!h.sync.log().contains(&format!("register {NETDEV}")));
}

#[test_log::test]
fn test_create_set_mode_failure() {
    let h = Harness::new();
    h.callbacks.fail_set_mode.store(true, Ordering::SeqCst);
    let buf = interface_command(NdpSubcommand::InterfaceCreate, 1, "nan0");
    assert_eq!(
        h.core.handle_ndp_command(NETDEV, &buf),
        Err(NdpError::Callback(EFAULT))
    );
    assert!(h.core.directory().is_empty());
}

#[rstest]
#[case(None, true, false, -libc::EOPNOTSUPP)]
#[case(None, false, false, 0)]
#[case(None, true, true, 0)]
#[case(Some(false), true, false, 0)]
#[case(Some(true), false, false, -libc::EOPNOTSUPP)]
fn test_create_depends_on_discovery(
    #[case] config_override: Option<bool>,
    #[case] policy_control: bool,
    #[case] discovery_active: bool,
    #[case] expected: i32,
) {
    let config = NanDataPathConfig {
        nan_concurrency_control: config_override,
        ..Default::default()
    };
    let h = Harness::with_config(config);
    h.policy
        .concurrency_control
        .store(policy_control, Ordering::SeqCst);
    h.policy
        .discovery_active
        .store(discovery_active, Ordering::SeqCst);
    let buf = interface_command(NdpSubcommand::InterfaceCreate, 1, "nan0");
    assert_eq!(h.ndp(&buf), expected);
}

#[test_log::test]
fn test_commands_need_registered_callbacks() {
    let h = Harness::unregistered(NanDataPathConfig::default());
    let create = interface_command(NdpSubcommand::InterfaceCreate, 1, "nan0");
    assert!(matches!(
        h.core.handle_ndp_command(NETDEV, &create),
        Err(NdpError::Unsupported(_))
    ));
    assert_eq!(h.ndp(&create), -libc::EOPNOTSUPP);
    assert!(h.callbacks.calls().is_empty());

    h.core.register_callbacks(h.callbacks.clone());
    assert_eq!(h.ndp(&create), 0);
}

#[test_log::test]
fn test_malformed_command_takes_no_transaction() {
    let h = Harness::new();
    // Interface name without the subcommand
    let buf = test_write_plan(&[Attribute::string(NdpAttribute::IfaceStr.into(), "nan0")]);
    assert_eq!(
        h.core.handle_ndp_command(NETDEV, &buf),
        Err(NdpError::MissingAttribute(
            CommandParsingError::MissingAttribute(NdpAttribute::Subcmd)
        ))
    );
    assert_eq!(h.ndp(&[0xff, 0xff, 0x01]), -libc::EINVAL);
    assert!(h.sync.log().is_empty());
}

#[test_log::test]
fn test_sync_transaction_failure() {
    let h = Harness::new();
    h.sync.fail_start.store(true, Ordering::SeqCst);
    let buf = interface_command(NdpSubcommand::InterfaceCreate, 1, "nan0");
    assert_eq!(h.ndp(&buf), -libc::EAGAIN);
    assert!(h.callbacks.calls().is_empty());
}

#[test_log::test]
fn test_delete_then_delete_response() {
    let h = Harness::new();
    let vdev_id = h.connected_ndi("nan0", 1);
    let buf = interface_command(NdpSubcommand::InterfaceDelete, 5, "nan0");
    assert_eq!(h.ndp(&buf), 0);

    let vdev = h.core.directory().find_by_id(vdev_id).unwrap();
    assert_eq!(vdev.state(), NdiState::Deleting);
    assert_eq!(vdev.delete_transaction_id(), Some(5));
    drop(vdev);
    assert_eq!(
        h.callbacks.calls().last(),
        Some(&Call::Delete(vdev_id, "nan0".to_string(), 5))
    );
    assert!(h.sync.log().contains(&format!("unregister {NETDEV}")));

    assert_eq!(h.core.post_ndi_delete_rsp(vdev_id, true), Ok(()));
    assert_eq!(h.callbacks.calls().last(), Some(&Call::DeleteRsp(vdev_id)));
    let expected = NdpEventMessage::InterfaceDeleteResponse {
        transaction_id: 5,
        response: success(),
    };
    assert_eq!(
        h.sink.delivered().last(),
        Some(&(VendorFamily::Ndp, test_write_plan(&expected.fields())))
    );
    assert!(h.core.directory().is_empty());
}

#[test_log::test]
fn test_delete_failure_restores_the_interface() {
    let h = Harness::new();
    let vdev_id = h.connected_ndi("nan0", 1);
    h.callbacks.fail_delete.store(true, Ordering::SeqCst);
    let buf = interface_command(NdpSubcommand::InterfaceDelete, 5, "nan0");
    assert_eq!(h.ndp(&buf), -libc::EFAULT);

    let vdev = h.core.directory().find_by_id(vdev_id).unwrap();
    assert_eq!(vdev.state(), NdiState::Connected);
    assert_eq!(vdev.delete_transaction_id(), None);
    assert_eq!(vdev.stats().interface_delete().failures(), 1);
    let log = h.sync.log();
    assert_eq!(
        &log[log.len() - 3..],
        &[
            format!("unregister {NETDEV}"),
            format!("register {NETDEV}"),
            format!("stop {NETDEV}"),
        ]
    );
}

#[rstest]
#[case("nan1")]
#[case("wlan0")]
fn test_delete_unknown_interface(#[case] name: &str) {
    let h = Harness::new();
    h.connected_ndi("nan0", 1);
    let buf = interface_command(NdpSubcommand::InterfaceDelete, 2, name);
    assert_eq!(
        h.core.handle_ndp_command(NETDEV, &buf),
        Err(NdpError::NotFound(name.to_string()))
    );
}

#[test_log::test]
fn test_initiator_request_is_submitted() {
    let h = Harness::new();
    h.connected_ndi("nan0", 1);
    assert_eq!(h.ndp(&initiator_command(7, "nan0")), 0);

    let vdev = h.core.directory().find_by_name("nan0").unwrap();
    // Held by the submitted request and by the lookup above
    assert_eq!(vdev.ref_count(), 2);
    let requests = h.engine.take_requests();
    assert_eq!(requests.len(), 1);
    match &requests[0] {
        NdpRequest::Initiator(req) => {
            assert_eq!(req.transaction_id, 7);
            assert_eq!(req.service_instance_id, 4);
            assert_eq!(req.self_ndi_mac, MacAddress::new([0x02, 0, 0, 0, 0, 1]));
            assert_eq!(
                req.peer_discovery_mac,
                MacAddress::new([0x02, 0xaa, 0xbb, 0xcc, 0xdd, 0xee])
            );
            assert_eq!(req.vdev.id(), vdev.id());
        }
        other => panic!("unexpected request {other}"),
    }
    drop(requests);
    assert_eq!(vdev.ref_count(), 1);
    assert_eq!(vdev.stats().initiator().attempts(), 1);
}

#[test_log::test]
fn test_initiator_while_deleting() {
    let h = Harness::new();
    h.connected_ndi("nan0", 1);
    assert_eq!(
        h.ndp(&interface_command(NdpSubcommand::InterfaceDelete, 2, "nan0")),
        0
    );
    assert_eq!(
        h.core.handle_ndp_command(NETDEV, &initiator_command(3, "nan0")),
        Err(NdpError::InvalidState(NdiState::Deleting))
    );
    assert!(h.engine.take_requests().is_empty());
    let vdev = h.core.directory().find_by_name("nan0").unwrap();
    assert_eq!(vdev.ref_count(), 1);
    assert_eq!(vdev.stats().initiator().failures(), 1);
}

#[rstest]
fn test_data_path_requests_rejected_outside_connected(
    #[values(NdiState::Creating, NdiState::Deleting, NdiState::Deleted)] state: NdiState,
    #[values(
        initiator_command(3, "nan0"),
        responder_command(3, Some("nan0"), NdpResponseCode::Accept),
        responder_command(3, None, NdpResponseCode::Reject),
        end_command(3, &[1])
    )]
    buf: Vec<u8>,
) {
    let h = Harness::new();
    h.connected_ndi("nan0", 1);
    let vdev = h.core.directory().find_by_name("nan0").unwrap();
    vdev.context().state = state;
    assert_eq!(vdev.ref_count(), 1);

    assert_eq!(
        h.core.handle_ndp_command(NETDEV, &buf),
        Err(NdpError::InvalidState(state))
    );
    assert_eq!(h.ndp(&buf), -libc::EINVAL);
    assert!(h.engine.take_requests().is_empty());
    assert_eq!(vdev.ref_count(), 1);
    assert_eq!(vdev.state(), state);
}

#[test_log::test]
fn test_data_path_requests_on_deleted_but_held_ndi() {
    let h = Harness::new();
    let vdev_id = h.connected_ndi("nan0", 1);
    let held = h.core.directory().find_by_id(vdev_id).unwrap();
    assert_eq!(
        h.ndp(&interface_command(NdpSubcommand::InterfaceDelete, 2, "nan0")),
        0
    );
    assert_eq!(h.core.post_ndi_delete_rsp(vdev_id, true), Ok(()));
    assert_eq!(held.state(), NdiState::Deleted);
    assert_eq!(h.core.directory().len(), 1);

    assert_eq!(
        h.core.handle_ndp_command(NETDEV, &initiator_command(3, "nan0")),
        Err(NdpError::InvalidState(NdiState::Deleted))
    );
    assert_eq!(
        h.core.handle_ndp_command(NETDEV, &end_command(4, &[1])),
        Err(NdpError::InvalidState(NdiState::Deleted))
    );
    assert!(h.engine.take_requests().is_empty());
    assert_eq!(held.ref_count(), 1);

    // A new interface may take the name while the old one is still held
    h.connected_ndi("nan0", 5);
    assert_eq!(h.core.directory().len(), 2);
    assert_eq!(h.ndp(&initiator_command(6, "nan0")), 0);
    match &h.engine.take_requests()[..] {
        [NdpRequest::Initiator(req)] => assert_ne!(req.vdev.id(), vdev_id),
        other => panic!("unexpected requests {other:?}"),
    }

    drop(held);
    assert_eq!(h.core.directory().reap(), 1);
}

#[rstest]
#[case::ndp_not_allowed(false, true, false, -libc::EOPNOTSUPP)]
#[case::sta_concurrency(true, false, false, -libc::EOPNOTSUPP)]
#[case::engine_failure(true, true, true, -libc::EFAULT)]
fn test_initiator_rejections(
    #[case] ndp_allowed: bool,
    #[case] sta_ndp_allowed: bool,
    #[case] engine_fails: bool,
    #[case] expected: i32,
) {
    let h = Harness::new();
    h.connected_ndi("nan0", 1);
    h.policy.ndp_allowed.store(ndp_allowed, Ordering::SeqCst);
    h.policy
        .sta_ndp_allowed
        .store(sta_ndp_allowed, Ordering::SeqCst);
    h.engine.fail.store(engine_fails, Ordering::SeqCst);
    assert_eq!(h.ndp(&initiator_command(2, "nan0")), expected);
    assert!(h.engine.take_requests().is_empty());
    assert_eq!(
        h.core.directory().find_by_name("nan0").unwrap().ref_count(),
        1
    );
}

#[test_log::test]
fn test_initiator_unknown_interface() {
    let h = Harness::new();
    assert_eq!(h.ndp(&initiator_command(2, "nan0")), -libc::ENODEV);
}

#[rstest]
#[case(NdpResponseCode::Reject)]
#[case(NdpResponseCode::Defer)]
fn test_responder_without_accept_uses_first_ndi(#[case] code: NdpResponseCode) {
    let h = Harness::new();
    h.connected_ndi("nan0", 1);
    // Refused STA concurrency only matters for an accept
    h.policy.sta_ndp_allowed.store(false, Ordering::SeqCst);
    assert_eq!(h.ndp(&responder_command(3, None, code)), 0);
    let requests = h.engine.take_requests();
    match &requests[..] {
        [NdpRequest::Responder(req)] => {
            assert_eq!(req.response_code, code);
            assert_eq!(req.instance_id, 9);
            assert_eq!(req.vdev.name(), "nan0");
        }
        other => panic!("unexpected requests {other:?}"),
    }
}

#[test_log::test]
fn test_responder_accept() {
    let h = Harness::new();
    h.connected_ndi("nan0", 1);
    h.connected_ndi("nan1", 2);
    let buf = responder_command(3, Some("nan1"), NdpResponseCode::Accept);
    assert_eq!(h.ndp(&buf), 0);
    let requests = h.engine.take_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].vdev().name(), "nan1");
    assert_eq!(requests[0].transaction_id(), 3);

    h.policy.sta_ndp_allowed.store(false, Ordering::SeqCst);
    assert_eq!(h.ndp(&buf), -libc::EOPNOTSUPP);
    let unknown = responder_command(4, Some("nan7"), NdpResponseCode::Accept);
    assert_eq!(h.ndp(&unknown), -libc::ENODEV);
}

#[test_log::test]
fn test_responder_without_ndi() {
    let h = Harness::new();
    let buf = responder_command(3, None, NdpResponseCode::Reject);
    assert_eq!(
        h.core.handle_ndp_command(NETDEV, &buf),
        Err(NdpError::NotFound(OpMode::Ndi.to_string()))
    );
}

#[test_log::test]
fn test_end_request() {
    let h = Harness::new();
    h.connected_ndi("nan0", 1);
    assert_eq!(h.ndp(&end_command(8, &[1, 2])), 0);
    match &h.engine.take_requests()[..] {
        [NdpRequest::End(req)] => {
            assert_eq!(req.transaction_id, 8);
            assert_eq!(req.instance_ids, vec![1, 2]);
        }
        other => panic!("unexpected requests {other:?}"),
    }
}

#[test_log::test]
fn test_empty_end_request_fails_before_lookup() {
    let h = Harness::new();
    assert_eq!(
        h.core.handle_ndp_command(NETDEV, &end_command(8, &[])),
        Err(NdpError::MissingAttribute(
            CommandParsingError::MissingAttribute(NdpAttribute::InstanceIdArray)
        ))
    );
    assert!(h.sync.log().is_empty());
}

#[test_log::test]
fn test_end_request_above_configured_instances() {
    let config = NanDataPathConfig {
        max_ndp_instances: 2,
        ..Default::default()
    };
    let h = Harness::with_config(config);
    h.connected_ndi("nan0", 1);
    assert_eq!(
        h.core.handle_ndp_command(NETDEV, &end_command(8, &[1, 2, 3])),
        Err(NdpError::MalformedAttribute(
            CommandParsingError::InvalidInstanceIdArrayLength(12)
        ))
    );
    assert!(h.engine.take_requests().is_empty());
}

#[test_log::test]
fn test_end_request_without_ndi() {
    let h = Harness::new();
    assert_eq!(h.ndp(&end_command(8, &[1])), -libc::ENODEV);
}

#[test_log::test]
fn test_discovery_commands() {
    let config = NanDataPathConfig::from_yaml("rtt_capability: 5\ndisable_6g_nan: true").unwrap();
    let h = Harness::with_config(config);
    assert_eq!(
        h.core.process_nan_discovery_command(0, 3, &nan_command(None, None)),
        0
    );
    assert_eq!(
        h.core.process_nan_discovery_command(
            0,
            3,
            &nan_command(Some(NanSubcommand::EnableRequest), Some(2437))
        ),
        0
    );
    assert_eq!(
        h.core.process_nan_discovery_command(
            0,
            3,
            &nan_command(Some(NanSubcommand::DisableRequest), None)
        ),
        0
    );
    assert_eq!(
        h.engine.discovery(),
        vec![
            NanDiscoveryRequest::Generic {
                data: vec![1, 2, 3]
            },
            NanDiscoveryRequest::Enable(NanEnableRequest {
                vdev_id: 3,
                social_chan_2g_freq: 2437,
                social_chan_5g_freq: None,
                rtt_capability: 5,
                disable_6g_nan: true,
                data: vec![1, 2, 3],
            }),
            NanDiscoveryRequest::Disable {
                data: vec![1, 2, 3]
            },
        ]
    );
    let stats = h.core.directory().discovery_stats();
    assert_eq!(stats.passthrough().attempts(), 1);
    assert_eq!(stats.enable().attempts(), 1);
    assert_eq!(stats.disable().attempts(), 1);
    assert!(h.policy.stopped_timers().is_empty());
}

#[test_log::test]
fn test_discovery_enable_rejections() {
    let h = Harness::new();
    h.policy.nan_enable_allowed.store(false, Ordering::SeqCst);
    h.policy
        .concurrency_supported
        .store(false, Ordering::SeqCst);
    let enable = nan_command(Some(NanSubcommand::EnableRequest), Some(2437));
    assert_eq!(
        h.core.process_nan_discovery_command(0, 3, &enable),
        -libc::EOPNOTSUPP
    );
    assert_eq!(h.policy.stopped_timers(), vec![3]);
    assert_eq!(h.core.directory().discovery_stats().enable().failures(), 1);

    let missing_freq = nan_command(Some(NanSubcommand::EnableRequest), None);
    assert_eq!(
        h.core.handle_nan_discovery_command(3, &missing_freq),
        Err(NdpError::MissingAttribute(
            CommandParsingError::MissingNanAttribute(NanAttribute::Disc24GhzBandFreq)
        ))
    );
    assert!(h.engine.discovery().is_empty());
}

#[test_log::test]
fn test_flush_stats() {
    let h = Harness::new();
    h.connected_ndi("nan0", 1);
    h.engine.fail.store(true, Ordering::SeqCst);
    assert_eq!(h.ndp(&initiator_command(2, "nan0")), -libc::EFAULT);
    assert_eq!(
        h.core.process_nan_discovery_command(0, 3, &nan_command(None, None)),
        -libc::EFAULT
    );
    let vdev = h.core.directory().find_by_name("nan0").unwrap();
    assert_eq!(vdev.stats().initiator().failures(), 1);
    assert_eq!(
        h.core.directory().discovery_stats().passthrough().failures(),
        1
    );

    h.core.flush_stats();
    assert_eq!(vdev.stats(), Default::default());
    assert_eq!(h.core.directory().discovery_stats(), Default::default());
}
