//! The bridge record owned by [`crate::Bridge`] and the conditions the
//! state machines evaluate against it.

use mstp_types::{BridgeId, MacAddress};

use crate::defaults;
use crate::digest::{MstConfigId, VlanTable, CONFIG_NAME_LEN};
use crate::port::Port;
use crate::priority_vector::Times;
use crate::tree::Tree;
use crate::types::{PortIndex, PortRole, StpVersion, TreeIndex, CIST_INDEX};

#[derive(Debug, Clone)]
pub(crate) struct BridgeState {
    pub begin: bool,
    pub started: bool,
    pub address: MacAddress,
    pub force_protocol_version: StpVersion,
    /// BridgeTimes; `remaining_hops` holds MaxHops.
    pub bridge_times: Times,
    pub migrate_time: u16,
    pub tx_hold_count: u32,
    pub vlan_table: VlanTable,
    pub mst_config_id: MstConfigId,
    pub debug_log: bool,
    pub ports: Vec<Port>,
    pub trees: Vec<Tree>,
}

impl BridgeState {
    pub fn new(port_count: usize, msti_count: usize, address: MacAddress) -> Self {
        let bridge_times = Times {
            forward_delay: defaults::FORWARD_DELAY,
            hello_time: defaults::HELLO_TIME,
            max_age: defaults::MAX_AGE,
            message_age: 0,
            remaining_hops: defaults::MAX_HOPS,
        };
        let tree_count = msti_count + 1;
        let trees = (0..tree_count)
            .map(|index| {
                let id = BridgeId::from_raw(defaults::BRIDGE_PRIORITY | index as u16, address);
                Tree::new(index, id, bridge_times)
            })
            .collect();
        let ports = (0..port_count)
            .map(|index| Port::new(index as u16 + 1, tree_count, bridge_times))
            .collect();

        let vlan_table = VlanTable::default();
        let mut name = [0u8; CONFIG_NAME_LEN];
        let default_name = address.to_string();
        name[..default_name.len()].copy_from_slice(default_name.as_bytes());
        let mst_config_id = MstConfigId {
            format_selector: 0,
            name,
            revision: 0,
            digest: vlan_table.digest(),
        };

        BridgeState {
            begin: false,
            started: false,
            address,
            force_protocol_version: StpVersion::Mstp,
            bridge_times,
            migrate_time: defaults::MIGRATE_TIME,
            tx_hold_count: defaults::TX_HOLD_COUNT,
            vlan_table,
            mst_config_id,
            debug_log: true,
            ports,
            trees,
        }
    }

    pub fn stp_version(&self) -> bool {
        self.force_protocol_version < StpVersion::Rstp
    }

    pub fn rstp_version(&self) -> bool {
        self.force_protocol_version >= StpVersion::Rstp
    }

    pub fn mstp_version(&self) -> bool {
        self.force_protocol_version >= StpVersion::Mstp
    }

    pub fn max_hops(&self) -> u8 {
        self.bridge_times.remaining_hops
    }

    /// HelloTime: from the CIST portTimes of the port.
    pub fn hello_time(&self, port: PortIndex) -> u16 {
        self.ports[port].trees[CIST_INDEX].port_times.hello_time
    }

    /// FwdDelay: from the CIST designatedTimes of the port.
    pub fn fwd_delay(&self, port: PortIndex) -> u16 {
        self.ports[port].trees[CIST_INDEX].designated_times.forward_delay
    }

    /// MaxAge: from the CIST designatedTimes of the port.
    pub fn max_age(&self, port: PortIndex) -> u16 {
        self.ports[port].trees[CIST_INDEX].designated_times.max_age
    }

    /// The delay used for learning and forwarding transitions.
    pub fn forward_delay(&self, port: PortIndex) -> u16 {
        if self.ports[port].send_rstp {
            self.hello_time(port)
        } else {
            self.fwd_delay(port)
        }
    }

    pub fn edge_delay(&self, port: PortIndex) -> u16 {
        if self.ports[port].oper_point_to_point {
            self.migrate_time
        } else {
            self.max_age(port)
        }
    }

    pub fn all_synced(&self, port: PortIndex, tree: TreeIndex) -> bool {
        let settled = self.ports.iter().all(|p| {
            let pt = &p.trees[tree];
            pt.selected && pt.role == pt.selected_role && !pt.updt_info
        });
        if !settled {
            return false;
        }

        let mut others = self.ports.iter().enumerate().filter(|(q, _)| *q != port);
        match self.ports[port].trees[tree].role {
            PortRole::Root | PortRole::Alternate => others.all(|(_, p)| p.trees[tree].synced),
            PortRole::Designated | PortRole::Master => others
                .filter(|(_, p)| p.trees[tree].role != PortRole::Root)
                .all(|(_, p)| p.trees[tree].synced),
            PortRole::Backup | PortRole::Disabled => false,
        }
    }

    pub fn re_rooted(&self, port: PortIndex, tree: TreeIndex) -> bool {
        self.ports
            .iter()
            .enumerate()
            .filter(|(q, _)| *q != port)
            .all(|(_, p)| p.trees[tree].rr_while == 0)
    }

    pub fn rcvd_any_msg(&self, port: PortIndex) -> bool {
        self.ports[port].trees.iter().any(|pt| pt.rcvd_msg)
    }

    /// rcvdCistMsg for the CIST, rcvdMstiMsg for an MSTI.
    pub fn rcvd_xst_msg(&self, port: PortIndex, tree: TreeIndex) -> bool {
        let trees = &self.ports[port].trees;
        if tree == CIST_INDEX {
            trees[CIST_INDEX].rcvd_msg
        } else {
            trees[tree].rcvd_msg && !trees[CIST_INDEX].rcvd_msg
        }
    }

    /// updtCistInfo for the CIST, updtMstiInfo for an MSTI.
    pub fn updt_xst_info(&self, port: PortIndex, tree: TreeIndex) -> bool {
        let trees = &self.ports[port].trees;
        trees[tree].updt_info || trees[CIST_INDEX].updt_info
    }

    pub fn cist_root_port(&self, port: PortIndex) -> bool {
        self.ports[port].trees[CIST_INDEX].role == PortRole::Root
    }

    pub fn cist_designated_port(&self, port: PortIndex) -> bool {
        self.ports[port].trees[CIST_INDEX].role == PortRole::Designated
    }

    pub fn msti_designated_or_tc_propagating_root_port(&self, port: PortIndex) -> bool {
        self.ports[port].trees[1..].iter().any(|pt| {
            pt.role == PortRole::Designated || (pt.role == PortRole::Root && pt.tc_while != 0)
        })
    }

    pub fn msti_master_port(&self, port: PortIndex) -> bool {
        self.ports[port].trees[1..].iter().any(|pt| pt.role == PortRole::Master)
    }

    pub fn all_transmit_ready(&self, port: PortIndex) -> bool {
        self.ports[port].trees.iter().all(|pt| pt.selected && !pt.updt_info)
    }
}
