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

mod processor;

use crate::{
    collaborators::{
        ConcurrencyPolicy, DeviceSync, EventSink, InterfaceCallbacks, ProtocolEngine,
        VendorFamily,
    },
    config::NanDataPathConfig,
    directory::{OpMode, VdevId, VirtualInterface},
    error::CollaboratorError,
    peer::PeerIndication,
    requests::{NanDiscoveryRequest, NdpRequest},
    NanDataPath,
};
use nanpath_attr::{
    test_helpers::test_write_plan, wire::serializer::AttributeWriter, Attribute, AttributeValue,
};
use nanpath_ndp_pkt::{
    iana::{NanAttribute, NanSubcommand, NdpAttribute, NdpResponseCode, NdpSubcommand},
    MacAddress, NdiResponse,
};
use std::sync::{
    atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering},
    Arc, Mutex,
};

const EFAULT: CollaboratorError = CollaboratorError(-libc::EFAULT);

fn flag(value: &AtomicBool) -> bool {
    value.load(Ordering::SeqCst)
}

#[derive(Debug, Default)]
pub(crate) struct MockDeviceSync {
    pub(crate) fail_start: AtomicBool,
    log: Mutex<Vec<String>>,
}

impl MockDeviceSync {
    pub(crate) fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl DeviceSync for MockDeviceSync {
    fn trans_start(&self, netdev: &str) -> Result<(), CollaboratorError> {
        if flag(&self.fail_start) {
            return Err(CollaboratorError(-libc::EAGAIN));
        }
        self.log.lock().unwrap().push(format!("start {netdev}"));
        Ok(())
    }

    fn trans_stop(&self, netdev: &str) {
        self.log.lock().unwrap().push(format!("stop {netdev}"));
    }

    fn register(&self, netdev: &str) {
        self.log.lock().unwrap().push(format!("register {netdev}"));
    }

    fn unregister(&self, netdev: &str) {
        self.log.lock().unwrap().push(format!("unregister {netdev}"));
    }
}

#[derive(Debug, Default)]
pub(crate) struct MockEngine {
    pub(crate) fail: AtomicBool,
    requests: Mutex<Vec<NdpRequest>>,
    discovery: Mutex<Vec<NanDiscoveryRequest>>,
}

impl MockEngine {
    /// Takes the submitted requests, releasing the interfaces they refer to
    pub(crate) fn take_requests(&self) -> Vec<NdpRequest> {
        std::mem::take(&mut *self.requests.lock().unwrap())
    }

    pub(crate) fn discovery(&self) -> Vec<NanDiscoveryRequest> {
        self.discovery.lock().unwrap().clone()
    }
}

impl ProtocolEngine for MockEngine {
    fn submit(&self, request: NdpRequest) -> Result<(), CollaboratorError> {
        if flag(&self.fail) {
            return Err(EFAULT);
        }
        self.requests.lock().unwrap().push(request);
        Ok(())
    }

    fn submit_discovery(&self, request: NanDiscoveryRequest) -> Result<(), CollaboratorError> {
        if flag(&self.fail) {
            return Err(EFAULT);
        }
        self.discovery.lock().unwrap().push(request);
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct MockPolicy {
    pub(crate) ndp_allowed: AtomicBool,
    pub(crate) sta_ndp_allowed: AtomicBool,
    pub(crate) nan_enable_allowed: AtomicBool,
    pub(crate) discovery_active: AtomicBool,
    pub(crate) concurrency_control: AtomicBool,
    pub(crate) concurrency_supported: AtomicBool,
    stopped_timers: Mutex<Vec<VdevId>>,
}

impl Default for MockPolicy {
    fn default() -> Self {
        Self {
            ndp_allowed: AtomicBool::new(true),
            sta_ndp_allowed: AtomicBool::new(true),
            nan_enable_allowed: AtomicBool::new(true),
            discovery_active: AtomicBool::new(true),
            concurrency_control: AtomicBool::new(false),
            concurrency_supported: AtomicBool::new(true),
            stopped_timers: Mutex::new(vec![]),
        }
    }
}

impl MockPolicy {
    pub(crate) fn stopped_timers(&self) -> Vec<VdevId> {
        self.stopped_timers.lock().unwrap().clone()
    }
}

impl ConcurrencyPolicy for MockPolicy {
    fn is_ndp_allowed(&self) -> bool {
        flag(&self.ndp_allowed)
    }

    fn is_sta_ndp_concurrency_allowed(&self, _vdev: &VirtualInterface) -> bool {
        flag(&self.sta_ndp_allowed)
    }

    fn is_nan_enable_allowed(&self, _freq: u32, _vdev_id: VdevId) -> bool {
        flag(&self.nan_enable_allowed)
    }

    fn is_nan_discovery_active(&self) -> bool {
        flag(&self.discovery_active)
    }

    fn nan_concurrency_control_supported(&self) -> bool {
        flag(&self.concurrency_control)
    }

    fn nan_concurrency_supported(&self) -> bool {
        flag(&self.concurrency_supported)
    }

    fn stop_opportunistic_timer(&self, vdev_id: VdevId) {
        self.stopped_timers.lock().unwrap().push(vdev_id);
    }
}

#[derive(Debug, Default)]
pub(crate) struct MockSink {
    pub(crate) fail_alloc: AtomicBool,
    /// Octets missing from every allocated buffer
    pub(crate) shortfall: AtomicUsize,
    allocations: Mutex<Vec<usize>>,
    delivered: Mutex<Vec<(VendorFamily, Vec<u8>)>>,
}

impl MockSink {
    pub(crate) fn failing_alloc() -> Self {
        let sink = Self::default();
        sink.fail_alloc.store(true, Ordering::SeqCst);
        sink
    }

    pub(crate) fn short_by(shortfall: usize) -> Self {
        let sink = Self::default();
        sink.shortfall.store(shortfall, Ordering::SeqCst);
        sink
    }

    pub(crate) fn allocations(&self) -> Vec<usize> {
        self.allocations.lock().unwrap().clone()
    }

    pub(crate) fn delivered(&self) -> Vec<(VendorFamily, Vec<u8>)> {
        self.delivered.lock().unwrap().clone()
    }
}

impl EventSink for MockSink {
    fn alloc(&self, _family: VendorFamily, len: usize) -> Option<AttributeWriter> {
        self.allocations.lock().unwrap().push(len);
        if flag(&self.fail_alloc) {
            return None;
        }
        let shortfall = self.shortfall.load(Ordering::SeqCst);
        Some(AttributeWriter::with_capacity(len.saturating_sub(shortfall)))
    }

    fn deliver(&self, family: VendorFamily, buffer: Vec<u8>) {
        self.delivered.lock().unwrap().push((family, buffer));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    SetMode(String),
    Open(String),
    Start(String, u16),
    Delete(VdevId, String, u16),
    Close(VdevId),
    CreateRsp(VdevId, NdiResponse),
    DeleteRsp(VdevId),
    NewPeer(VdevId, bool),
    PeerDeparted(VdevId, bool),
}

#[derive(Debug)]
pub(crate) struct MockCallbacks {
    next_id: AtomicU8,
    pub(crate) fail_set_mode: AtomicBool,
    pub(crate) fail_start: AtomicBool,
    pub(crate) fail_delete: AtomicBool,
    pub(crate) fail_new_peer: AtomicBool,
    calls: Mutex<Vec<Call>>,
}

impl Default for MockCallbacks {
    fn default() -> Self {
        Self {
            next_id: AtomicU8::new(1),
            fail_set_mode: AtomicBool::new(false),
            fail_start: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_new_peer: AtomicBool::new(false),
            calls: Mutex::new(vec![]),
        }
    }
}

impl MockCallbacks {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl InterfaceCallbacks for MockCallbacks {
    fn ndi_set_mode(&self, name: &str) -> Result<(), CollaboratorError> {
        self.record(Call::SetMode(name.to_string()));
        if flag(&self.fail_set_mode) {
            return Err(EFAULT);
        }
        Ok(())
    }

    fn ndi_open(&self, name: &str) -> Result<VirtualInterface, CollaboratorError> {
        self.record(Call::Open(name.to_string()));
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(VirtualInterface::new(
            id,
            name,
            OpMode::Ndi,
            MacAddress::new([0x02, 0, 0, 0, 0, id]),
        ))
    }

    fn ndi_start(&self, name: &str, transaction_id: u16) -> Result<(), CollaboratorError> {
        self.record(Call::Start(name.to_string(), transaction_id));
        if flag(&self.fail_start) {
            return Err(EFAULT);
        }
        Ok(())
    }

    fn ndi_delete(
        &self,
        vdev_id: VdevId,
        name: &str,
        transaction_id: u16,
    ) -> Result<(), CollaboratorError> {
        self.record(Call::Delete(vdev_id, name.to_string(), transaction_id));
        if flag(&self.fail_delete) {
            return Err(EFAULT);
        }
        Ok(())
    }

    fn ndi_close(&self, vdev_id: VdevId) {
        self.record(Call::Close(vdev_id));
    }

    fn drv_ndi_create_rsp_handler(&self, vdev_id: VdevId, response: &NdiResponse) {
        self.record(Call::CreateRsp(vdev_id, *response));
    }

    fn drv_ndi_delete_rsp_handler(&self, vdev_id: VdevId) {
        self.record(Call::DeleteRsp(vdev_id));
    }

    fn new_peer_ind(
        &self,
        vdev_id: VdevId,
        _peer: &PeerIndication,
        first_peer: bool,
    ) -> Result<(), CollaboratorError> {
        self.record(Call::NewPeer(vdev_id, first_peer));
        if flag(&self.fail_new_peer) {
            return Err(EFAULT);
        }
        Ok(())
    }

    fn peer_departed_ind(&self, vdev_id: VdevId, _peer: &PeerIndication, last_peer: bool) {
        self.record(Call::PeerDeparted(vdev_id, last_peer));
    }
}

pub(crate) const NETDEV: &str = "wifi-aware0";

/// Core wired to mocks, with the callbacks registered
#[derive(Debug)]
pub(crate) struct Harness {
    pub(crate) core: NanDataPath,
    pub(crate) sync: Arc<MockDeviceSync>,
    pub(crate) engine: Arc<MockEngine>,
    pub(crate) policy: Arc<MockPolicy>,
    pub(crate) sink: Arc<MockSink>,
    pub(crate) callbacks: Arc<MockCallbacks>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_config(NanDataPathConfig::default())
    }

    pub(crate) fn with_config(config: NanDataPathConfig) -> Self {
        let harness = Self::unregistered(config);
        harness.core.register_callbacks(harness.callbacks.clone());
        harness
    }

    /// Callbacks are created but not registered
    pub(crate) fn unregistered(config: NanDataPathConfig) -> Self {
        let sync = Arc::new(MockDeviceSync::default());
        let engine = Arc::new(MockEngine::default());
        let policy = Arc::new(MockPolicy::default());
        let sink = Arc::new(MockSink::default());
        let core = NanDataPath::new(
            config,
            sync.clone(),
            engine.clone(),
            policy.clone(),
            sink.clone(),
        );
        Self {
            core,
            sync,
            engine,
            policy,
            sink,
            callbacks: Arc::new(MockCallbacks::default()),
        }
    }

    pub(crate) fn ndp(&self, buf: &[u8]) -> i32 {
        self.core.process_ndp_command(NETDEV, buf)
    }

    /// Create `name` and confirm it, leaving it Connected
    pub(crate) fn connected_ndi(&self, name: &str, transaction_id: u16) -> VdevId {
        assert_eq!(
            self.ndp(&interface_command(
                NdpSubcommand::InterfaceCreate,
                transaction_id,
                name
            )),
            0
        );
        let vdev_id = self.core.directory().find_by_name(name).unwrap().id();
        assert_eq!(self.core.post_ndi_create_rsp(vdev_id, true), Ok(()));
        vdev_id
    }
}

fn header(subcommand: NdpSubcommand, transaction_id: u16) -> Vec<Attribute> {
    vec![
        Attribute::u32(NdpAttribute::Subcmd.into(), subcommand.into()),
        Attribute::u16(NdpAttribute::TransactionId.into(), transaction_id),
    ]
}

pub(crate) fn interface_command(
    subcommand: NdpSubcommand,
    transaction_id: u16,
    iface: &str,
) -> Vec<u8> {
    let mut plan = header(subcommand, transaction_id);
    plan.push(Attribute::string(NdpAttribute::IfaceStr.into(), iface));
    test_write_plan(&plan)
}

pub(crate) fn initiator_command(transaction_id: u16, iface: &str) -> Vec<u8> {
    let mut plan = header(NdpSubcommand::InitiatorRequest, transaction_id);
    plan.extend([
        Attribute::string(NdpAttribute::IfaceStr.into(), iface),
        Attribute::u32(NdpAttribute::ServiceInstanceId.into(), 4),
        Attribute::bytes(
            NdpAttribute::PeerDiscoveryMacAddr.into(),
            &[0x02, 0xaa, 0xbb, 0xcc, 0xdd, 0xee],
        ),
    ]);
    test_write_plan(&plan)
}

pub(crate) fn responder_command(
    transaction_id: u16,
    iface: Option<&str>,
    response_code: NdpResponseCode,
) -> Vec<u8> {
    let mut plan = header(NdpSubcommand::ResponderRequest, transaction_id);
    plan.extend(iface.map(|iface| Attribute::string(NdpAttribute::IfaceStr.into(), iface)));
    plan.extend([
        Attribute::u32(NdpAttribute::InstanceId.into(), 9),
        Attribute::u32(NdpAttribute::ResponseCode.into(), response_code.into()),
    ]);
    test_write_plan(&plan)
}

pub(crate) fn end_command(transaction_id: u16, instance_ids: &[u32]) -> Vec<u8> {
    let mut plan = header(NdpSubcommand::EndRequest, transaction_id);
    let octets = instance_ids
        .iter()
        .flat_map(|id| id.to_le_bytes())
        .collect::<Vec<u8>>();
    plan.push(Attribute::new(
        NdpAttribute::InstanceIdArray.into(),
        AttributeValue::Bytes(octets),
    ));
    test_write_plan(&plan)
}

pub(crate) fn nan_command(subcommand: Option<NanSubcommand>, freq_24ghz: Option<u32>) -> Vec<u8> {
    let mut plan = vec![Attribute::bytes(NanAttribute::CmdData.into(), &[1, 2, 3])];
    plan.extend(subcommand.map(|sub| Attribute::u32(NanAttribute::SubcmdType.into(), sub.into())));
    plan.extend(
        freq_24ghz.map(|freq| Attribute::u32(NanAttribute::Disc24GhzBandFreq.into(), freq)),
    );
    test_write_plan(&plan)
}
