//! Recording callbacks and fixtures shared by the unit tests.

use mstp_types::{BridgeId, MacAddress, PortId};

use crate::bpdu::{Bpdu, BpduFlags, CistMessage, EncodedRole, MessageTimes};
use crate::callbacks::BridgeCallbacks;
use crate::priority_vector::Times;
use crate::state::BridgeState;
use crate::types::{FlushFdbType, PortIndex, PortRole, TreeIndex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    EnableLearning(PortIndex, TreeIndex),
    DisableLearning(PortIndex, TreeIndex),
    EnableForwarding(PortIndex, TreeIndex),
    DisableForwarding(PortIndex, TreeIndex),
    FlushFdb(PortIndex, TreeIndex, FlushFdbType),
    TopologyChange(TreeIndex),
    NotifiedTopologyChange(PortIndex, TreeIndex),
    RoleChanged(PortIndex, TreeIndex, PortRole),
    ConfigChanged,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingCallbacks {
    pub calls: Vec<Call>,
    /// BPDUs handed back through `transmit_release_buffer`.
    pub sent: Vec<(PortIndex, Vec<u8>)>,
    pub unreachable: Vec<PortIndex>,
    pub log: String,
    buffer: Vec<u8>,
}

impl RecordingCallbacks {
    pub fn sent_on(&self, port: PortIndex) -> Vec<Bpdu> {
        self.sent
            .iter()
            .filter(|(p, _)| *p == port)
            .map(|(_, bytes)| Bpdu::decode(bytes).unwrap())
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl BridgeCallbacks for RecordingCallbacks {
    fn enable_learning(&mut self, port: PortIndex, tree: TreeIndex, _timestamp: u32) {
        self.calls.push(Call::EnableLearning(port, tree));
    }

    fn disable_learning(&mut self, port: PortIndex, tree: TreeIndex, _timestamp: u32) {
        self.calls.push(Call::DisableLearning(port, tree));
    }

    fn enable_forwarding(&mut self, port: PortIndex, tree: TreeIndex, _timestamp: u32) {
        self.calls.push(Call::EnableForwarding(port, tree));
    }

    fn disable_forwarding(&mut self, port: PortIndex, tree: TreeIndex, _timestamp: u32) {
        self.calls.push(Call::DisableForwarding(port, tree));
    }

    fn transmit_get_buffer(&mut self, port: PortIndex, size: usize, _timestamp: u32) -> Option<&mut [u8]> {
        if self.unreachable.contains(&port) {
            return None;
        }
        self.buffer = vec![0; size];
        Some(self.buffer.as_mut_slice())
    }

    fn transmit_release_buffer(&mut self, port: PortIndex) {
        let bytes = std::mem::take(&mut self.buffer);
        self.sent.push((port, bytes));
    }

    fn flush_fdb(&mut self, port: PortIndex, tree: TreeIndex, flush_type: FlushFdbType, _timestamp: u32) {
        self.calls.push(Call::FlushFdb(port, tree, flush_type));
    }

    fn on_topology_change(&mut self, tree: TreeIndex, _timestamp: u32) {
        self.calls.push(Call::TopologyChange(tree));
    }

    fn on_notified_topology_change(&mut self, port: PortIndex, tree: TreeIndex, _timestamp: u32) {
        self.calls.push(Call::NotifiedTopologyChange(port, tree));
    }

    fn on_port_role_changed(&mut self, port: PortIndex, tree: TreeIndex, role: PortRole, _timestamp: u32) {
        self.calls.push(Call::RoleChanged(port, tree, role));
    }

    fn on_config_changed(&mut self, _timestamp: u32) {
        self.calls.push(Call::ConfigChanged);
    }

    fn debug_log(&mut self, _port: Option<PortIndex>, _tree: Option<TreeIndex>, text: &str, _flush: bool) {
        self.log.push_str(text);
    }
}

pub(crate) fn mac(last: u8) -> MacAddress {
    MacAddress::new([0x02, 0, 0, 0, 0, last])
}

pub(crate) fn bridge_id(last: u8) -> BridgeId {
    BridgeId::from_raw(0x8000, mac(last))
}

/// A bridge with address `02:00:00:00:00:05`.
pub(crate) fn test_state(ports: usize, mstis: usize) -> BridgeState {
    BridgeState::new(ports, mstis, mac(5))
}

/// An RST BPDU from root bridge `02:00:00:00:00:<root>` on its port 1.
pub(crate) fn rst_bpdu(root: u8) -> Bpdu {
    let mut flags = BpduFlags::default();
    flags.set_role(EncodedRole::Designated);
    Bpdu::rst(CistMessage {
        flags,
        root_id: bridge_id(root),
        external_root_path_cost: 0,
        regional_root_id: bridge_id(root),
        port_id: PortId::from_raw(0x8001),
        times: MessageTimes::from_times(&Times {
            forward_delay: 15,
            hello_time: 2,
            max_age: 20,
            message_age: 0,
            remaining_hops: 0,
        }),
    })
}
