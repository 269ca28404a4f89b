//! Per-tree (CIST or MSTI) bridge state.

use mstp_types::BridgeId;

use crate::priority_vector::{PriorityVector, Times};
use crate::sm::port_role_selection;
use crate::types::{PortIndex, CIST_INDEX};

#[derive(Debug, Clone)]
pub(crate) struct Tree {
    pub index: usize,
    pub bridge_id: BridgeId,
    pub root_priority: PriorityVector,
    pub root_port: Option<PortIndex>,
    pub root_times: Times,

    pub topology_change_count: u32,
    pub last_topology_change: Option<u32>,
    /// Some port of this tree has a running tcWhile.
    pub topology_change_active: bool,

    pub role_selection_sm: port_role_selection::State,
}

impl Tree {
    pub fn new(index: usize, bridge_id: BridgeId, times: Times) -> Self {
        let mut tree = Tree {
            index,
            bridge_id,
            root_priority: PriorityVector::default(),
            root_port: None,
            root_times: times,
            topology_change_count: 0,
            last_topology_change: None,
            topology_change_active: false,
            role_selection_sm: port_role_selection::State::InitTree,
        };
        tree.root_priority = tree.bridge_priority();
        tree
    }

    pub fn is_cist(&self) -> bool {
        self.index == CIST_INDEX
    }

    /// This bridge's own priority vector for the tree.
    pub fn bridge_priority(&self) -> PriorityVector {
        if self.is_cist() {
            PriorityVector::cist_bridge(self.bridge_id)
        } else {
            PriorityVector::msti_bridge(self.bridge_id)
        }
    }
}
