//! Procedures invoked from state machine entry actions: recording received
//! information, computing port roles, and topology change bookkeeping.

use mstp_types::{BridgeId, PortId};
use tracing::info;

use crate::bpdu::{BpduFlags, BpduKind, EncodedRole};
use crate::callbacks::BridgeCallbacks;
use crate::port::{InfoIs, RcvdInfo};
use crate::priority_vector::{PriorityVector, Times};
use crate::state::BridgeState;
use crate::types::{PortIndex, PortRole, TreeIndex, CIST_INDEX};

impl BridgeState {
    fn received_kind(&self, port: PortIndex) -> Option<BpduKind> {
        self.ports[port].received.as_ref().map(|bpdu| bpdu.kind)
    }

    fn received_rapid(&self, port: PortIndex) -> bool {
        matches!(self.received_kind(port), Some(BpduKind::Rst | BpduKind::Mst))
    }

    /// The role the received message for the tree conveys. Configuration
    /// BPDUs implicitly convey Designated.
    fn received_role(&self, port: PortIndex, tree: TreeIndex) -> Option<EncodedRole> {
        match self.received_kind(port)? {
            BpduKind::Tcn => None,
            BpduKind::Config => Some(EncodedRole::Designated),
            BpduKind::Rst | BpduKind::Mst => Some(self.ports[port].trees[tree].msg_flags.role()),
        }
    }

    pub fn better_or_same_info(&self, port: PortIndex, tree: TreeIndex, new_info_is: InfoIs) -> bool {
        let pt = &self.ports[port].trees[tree];
        match new_info_is {
            InfoIs::Received => {
                pt.info_is == InfoIs::Received && pt.msg_priority.is_better_or_same(&pt.port_priority)
            }
            InfoIs::Mine => {
                pt.info_is == InfoIs::Mine && pt.designated_priority.is_better_or_same(&pt.port_priority)
            }
            InfoIs::Aged | InfoIs::Disabled => false,
        }
    }

    pub fn clear_all_rcvd_msgs(&mut self, port: PortIndex) {
        for pt in &mut self.ports[port].trees {
            pt.rcvd_msg = false;
        }
    }

    pub fn clear_reselect_tree(&mut self, tree: TreeIndex) {
        for port in &mut self.ports {
            port.trees[tree].reselect = false;
        }
    }

    /// The received BPDU is an MST BPDU carrying our MST Configuration Identifier.
    pub fn from_same_region(&self, port: PortIndex) -> bool {
        let port = &self.ports[port];
        self.mstp_version()
            && port.rcvd_rstp
            && port
                .received
                .as_ref()
                .and_then(|bpdu| bpdu.mst.as_ref())
                .is_some_and(|mst| mst.config_id == self.mst_config_id)
    }

    pub fn new_tc_while(
        &mut self,
        callbacks: &mut dyn BridgeCallbacks,
        port: PortIndex,
        tree: TreeIndex,
        timestamp: u32,
    ) {
        if self.ports[port].trees[tree].tc_while != 0 {
            return;
        }

        if self.ports[port].send_rstp {
            let hello = self.hello_time(port);
            let p = &mut self.ports[port];
            p.trees[tree].tc_while = hello + 1;
            if tree == CIST_INDEX {
                p.new_info = true;
            } else {
                p.new_info_msti = true;
            }
        } else {
            let root_times = self.trees[CIST_INDEX].root_times;
            self.ports[port].trees[tree].tc_while = root_times.max_age + root_times.forward_delay;
        }

        let t = &mut self.trees[tree];
        t.topology_change_count += 1;
        t.last_topology_change = Some(timestamp);
        t.topology_change_active = true;
        info!(port, tree, count = t.topology_change_count, "topology change");
        callbacks.on_topology_change(tree, timestamp);
    }

    pub fn rcv_info(&self, port: PortIndex, tree: TreeIndex) -> RcvdInfo {
        let pt = &self.ports[port].trees[tree];
        match self.received_role(port, tree) {
            Some(EncodedRole::Designated) => {
                let same_priority = pt.msg_priority == pt.port_priority;
                // An MSTI carries only remaining hops; its other timers follow the CIST.
                let same_times = if tree == CIST_INDEX {
                    pt.msg_times == pt.port_times
                } else {
                    pt.msg_times.remaining_hops == pt.port_times.remaining_hops
                };
                if pt.msg_priority.is_superior_to(&pt.port_priority) || (same_priority && !same_times) {
                    RcvdInfo::SuperiorDesignated
                } else if same_priority && same_times && pt.info_is == InfoIs::Received {
                    RcvdInfo::RepeatedDesignated
                } else {
                    RcvdInfo::InferiorDesignated
                }
            }
            Some(EncodedRole::Root | EncodedRole::AlternateOrBackup)
                if pt.port_priority.is_better_or_same(&pt.msg_priority) =>
            {
                RcvdInfo::InferiorRootAlternate
            }
            _ => RcvdInfo::Other,
        }
    }

    pub fn record_agreement(&mut self, port: PortIndex, tree: TreeIndex) {
        let rstp = self.rstp_version();
        let rapid = self.received_rapid(port);
        let p = &mut self.ports[port];
        let point_to_point = p.oper_point_to_point;

        if tree == CIST_INDEX {
            let cist = &mut p.trees[CIST_INDEX];
            if rstp && rapid && point_to_point && cist.msg_flags.contains(BpduFlags::AGREEMENT) {
                cist.agreed = true;
                cist.proposing = false;
            } else {
                cist.agreed = false;
            }
            if !p.rcvd_internal {
                let (agreed, proposing) = (p.trees[CIST_INDEX].agreed, p.trees[CIST_INDEX].proposing);
                for pt in &mut p.trees[1..] {
                    pt.agreed = agreed;
                    pt.proposing = proposing;
                }
            }
        } else {
            let cist_msg = p.trees[CIST_INDEX].msg_priority;
            let cist_port = p.trees[CIST_INDEX].port_priority;
            let same_cist = cist_msg.root_id == cist_port.root_id
                && cist_msg.external_root_path_cost == cist_port.external_root_path_cost
                && cist_msg.regional_root_id == cist_port.regional_root_id;
            let pt = &mut p.trees[tree];
            if point_to_point && same_cist && pt.msg_flags.contains(BpduFlags::AGREEMENT) {
                pt.agreed = true;
                pt.proposing = false;
            } else {
                pt.agreed = false;
            }
        }
    }

    pub fn record_dispute(&mut self, port: PortIndex, tree: TreeIndex) {
        let rapid = self.received_rapid(port);
        let p = &mut self.ports[port];
        if !rapid || !p.trees[tree].msg_flags.contains(BpduFlags::LEARNING) {
            return;
        }
        let external = tree == CIST_INDEX && !p.rcvd_internal;
        for (t, pt) in p.trees.iter_mut().enumerate() {
            if t == tree || (external && t != CIST_INDEX) {
                pt.disputed = true;
                pt.agreed = false;
            }
        }
    }

    pub fn record_mastered(&mut self, port: PortIndex, tree: TreeIndex) {
        let p = &mut self.ports[port];
        if tree == CIST_INDEX {
            if !p.rcvd_internal {
                for pt in &mut p.trees[1..] {
                    pt.mastered = false;
                }
            }
        } else {
            let pt = &mut p.trees[tree];
            pt.mastered = pt.msg_flags.contains(BpduFlags::ACK_OR_MASTER);
        }
    }

    pub fn record_priority(&mut self, port: PortIndex, tree: TreeIndex) {
        let pt = &mut self.ports[port].trees[tree];
        pt.port_priority = pt.msg_priority;
    }

    pub fn record_proposal(&mut self, port: PortIndex, tree: TreeIndex) {
        let proposal = self.received_rapid(port)
            && self.received_role(port, tree) == Some(EncodedRole::Designated)
            && self.ports[port].trees[tree].msg_flags.contains(BpduFlags::PROPOSAL);
        if !proposal {
            return;
        }
        let p = &mut self.ports[port];
        p.trees[tree].proposed = true;
        if tree == CIST_INDEX && !p.rcvd_internal {
            for pt in &mut p.trees[1..] {
                pt.proposed = true;
            }
        }
    }

    pub fn record_times(&mut self, port: PortIndex, tree: TreeIndex) {
        let pt = &mut self.ports[port].trees[tree];
        if tree == CIST_INDEX {
            pt.port_times = pt.msg_times;
        } else {
            pt.port_times.remaining_hops = pt.msg_times.remaining_hops;
        }
    }

    /// Loads the message priority, times and flags of every tree the
    /// received BPDU speaks for and flags them with rcvdMsg.
    pub fn set_rcvd_msgs(&mut self, port: PortIndex) {
        let max_hops = self.max_hops();
        let tree_count = self.trees.len();
        let p = &mut self.ports[port];
        let Some(bpdu) = p.received.as_ref() else {
            return;
        };

        if bpdu.kind == BpduKind::Tcn {
            p.rcvd_tcn = true;
            for pt in &mut p.trees[1..] {
                pt.rcvd_tc = true;
            }
            return;
        }

        let internal = p.rcvd_internal;
        let designated = bpdu.designated_bridge_id();
        let cist = bpdu.cist;
        let hops = match (&bpdu.mst, internal) {
            (Some(mst), true) => mst.remaining_hops,
            _ => max_hops,
        };
        let mut times = cist.times.to_times(hops);
        times.hello_time = times.hello_time.max(1);

        let cist_pt = &mut p.trees[CIST_INDEX];
        cist_pt.msg_priority = PriorityVector {
            root_id: cist.root_id,
            external_root_path_cost: cist.external_root_path_cost,
            regional_root_id: cist.regional_root_id,
            internal_root_path_cost: match (&bpdu.mst, internal) {
                (Some(mst), true) => mst.internal_root_path_cost,
                _ => 0,
            },
            designated_bridge_id: designated,
            designated_port_id: cist.port_id,
            bridge_port_id: cist_pt.port_id,
        };
        cist_pt.msg_times = times;
        cist_pt.msg_flags = cist.flags;
        cist_pt.rcvd_msg = true;

        if !internal {
            return;
        }
        let Some(mst) = bpdu.mst.as_ref() else {
            return;
        };
        for msti in &mst.mstis {
            let tree = usize::from(msti.mstid());
            if tree == CIST_INDEX || tree >= tree_count {
                continue;
            }
            let pt = &mut p.trees[tree];
            pt.msg_priority = PriorityVector {
                root_id: BridgeId::default(),
                external_root_path_cost: 0,
                regional_root_id: msti.regional_root_id,
                internal_root_path_cost: msti.internal_root_path_cost,
                designated_bridge_id: BridgeId::from_raw(
                    (u16::from(msti.bridge_priority & 0xf0) << 8) | msti.mstid(),
                    designated.address(),
                ),
                designated_port_id: PortId::from_raw(
                    (u16::from(msti.port_priority & 0xf0) << 8) | cist.port_id.number(),
                ),
                bridge_port_id: pt.port_id,
            };
            pt.msg_times = Times {
                remaining_hops: msti.remaining_hops,
                ..pt.port_times
            };
            pt.msg_flags = msti.flags;
            pt.rcvd_msg = true;
        }
    }

    /// newInfoCist or newInfoMsti, whichever the tree transmits through.
    pub fn set_new_info_xst(&mut self, port: PortIndex, tree: TreeIndex) {
        let p = &mut self.ports[port];
        if tree == CIST_INDEX {
            p.new_info = true;
        } else {
            p.new_info_msti = true;
        }
    }

    pub fn set_re_root_tree(&mut self, tree: TreeIndex) {
        for port in &mut self.ports {
            port.trees[tree].re_root = true;
        }
    }

    pub fn set_selected_tree(&mut self, tree: TreeIndex) {
        if self.ports.iter().any(|p| p.trees[tree].reselect) {
            return;
        }
        for port in &mut self.ports {
            port.trees[tree].selected = true;
        }
    }

    pub fn set_sync_tree(&mut self, tree: TreeIndex) {
        for port in &mut self.ports {
            port.trees[tree].sync = true;
        }
    }

    pub fn set_tc_flags(&mut self, port: PortIndex, tree: TreeIndex) {
        let p = &mut self.ports[port];
        let flags = p.trees[tree].msg_flags;
        if tree != CIST_INDEX {
            if flags.contains(BpduFlags::TOPOLOGY_CHANGE) {
                p.trees[tree].rcvd_tc = true;
            }
            return;
        }

        if flags.contains(BpduFlags::ACK_OR_MASTER) {
            p.rcvd_tc_ack = true;
        }
        if flags.contains(BpduFlags::TOPOLOGY_CHANGE) {
            let all_trees = !p.rcvd_internal;
            for (t, pt) in p.trees.iter_mut().enumerate() {
                if t == CIST_INDEX || all_trees {
                    pt.rcvd_tc = true;
                }
            }
        }
    }

    pub fn set_tc_prop_tree(&mut self, port: PortIndex, tree: TreeIndex) {
        for (q, p) in self.ports.iter_mut().enumerate() {
            if q != port {
                p.trees[tree].tc_prop = true;
            }
        }
    }

    pub fn updt_bpdu_version(&mut self, port: PortIndex) {
        match self.received_kind(port) {
            Some(BpduKind::Config | BpduKind::Tcn) => self.ports[port].rcvd_stp = true,
            Some(BpduKind::Rst | BpduKind::Mst) => self.ports[port].rcvd_rstp = true,
            None => {}
        }
    }

    pub fn updt_rcvd_info_while(&mut self, port: PortIndex, tree: TreeIndex) {
        let hello = self.hello_time(port);
        let p = &mut self.ports[port];
        let external = tree == CIST_INDEX && !p.info_internal;
        let pt = &mut p.trees[tree];
        let fresh = if external {
            pt.port_times.message_age + 1 <= pt.port_times.max_age
        } else {
            pt.port_times.remaining_hops > 1
        };
        pt.rcvd_info_while = if fresh { 3 * hello } else { 0 };
    }

    pub fn updt_role_disabled_tree(&mut self, tree: TreeIndex) {
        for port in &mut self.ports {
            port.trees[tree].selected_role = PortRole::Disabled;
        }
    }

    /// The root path priority vector through `port`: its port priority
    /// vector with the path cost to this bridge added.
    fn root_path_priority(&self, port: PortIndex, tree: TreeIndex) -> PriorityVector {
        let p = &self.ports[port];
        let pt = &p.trees[tree];
        let pp = pt.port_priority;
        if tree == CIST_INDEX && !p.info_internal {
            PriorityVector {
                external_root_path_cost: pp.external_root_path_cost.saturating_add(p.external_path_cost()),
                regional_root_id: self.trees[tree].bridge_id,
                internal_root_path_cost: 0,
                bridge_port_id: pt.port_id,
                ..pp
            }
        } else {
            PriorityVector {
                internal_root_path_cost: pp.internal_root_path_cost.saturating_add(p.internal_path_cost(tree)),
                bridge_port_id: pt.port_id,
                ..pp
            }
        }
    }

    /// Computes the root priority vector, root times, designated priority
    /// vectors and selected roles of every port for the tree.
    pub fn updt_roles_tree(&mut self, tree: TreeIndex) {
        let own_address = self.address;
        let bridge_id = self.trees[tree].bridge_id;

        let mut root_priority = self.trees[tree].bridge_priority();
        let mut root_port = None;
        for (q, p) in self.ports.iter().enumerate() {
            let pt = &p.trees[tree];
            if pt.info_is != InfoIs::Received
                || (tree != CIST_INDEX && !p.info_internal)
                || pt.port_priority.designated_bridge_id.address() == own_address
            {
                continue;
            }
            let candidate = self.root_path_priority(q, tree);
            if candidate.is_better_than(&root_priority) {
                root_priority = candidate;
                root_port = Some(q);
            }
        }

        let root_times = match root_port {
            None => self.bridge_times,
            Some(q) => {
                let p = &self.ports[q];
                let mut times = p.trees[tree].port_times;
                if tree == CIST_INDEX && !p.info_internal {
                    times.message_age += 1;
                } else {
                    times.remaining_hops = times.remaining_hops.saturating_sub(1);
                }
                if tree != CIST_INDEX {
                    let cist_times = self.trees[CIST_INDEX].root_times;
                    times = Times {
                        remaining_hops: times.remaining_hops,
                        ..cist_times
                    };
                }
                times
            }
        };

        {
            let t = &mut self.trees[tree];
            if t.root_port != root_port || t.root_priority != root_priority {
                info!(
                    tree,
                    root = %root_priority.root_id,
                    regional_root = %root_priority.regional_root_id,
                    root_port = ?root_port,
                    "root changed"
                );
            }
            t.root_priority = root_priority;
            t.root_port = root_port;
            t.root_times = root_times;
        }

        let cist_roles: Vec<PortRole> = self.ports.iter().map(|p| p.trees[CIST_INDEX].selected_role).collect();
        for (q, p) in self.ports.iter_mut().enumerate() {
            let cist_received_externally =
                p.trees[CIST_INDEX].info_is == InfoIs::Received && !p.info_internal;
            let pt = &mut p.trees[tree];
            pt.designated_priority = PriorityVector {
                designated_bridge_id: bridge_id,
                designated_port_id: pt.port_id,
                bridge_port_id: pt.port_id,
                ..root_priority
            };
            pt.designated_times = root_times;
            let stale = pt.port_priority != pt.designated_priority || pt.port_times != root_times;

            if tree != CIST_INDEX && cist_received_externally && pt.info_is != InfoIs::Disabled {
                let boundary_role = match cist_roles[q] {
                    PortRole::Root => Some(PortRole::Master),
                    PortRole::Alternate => Some(PortRole::Alternate),
                    PortRole::Backup => Some(PortRole::Backup),
                    _ => None,
                };
                if let Some(role) = boundary_role {
                    pt.selected_role = role;
                    pt.updt_info = stale;
                    continue;
                }
            }

            match pt.info_is {
                InfoIs::Disabled => pt.selected_role = PortRole::Disabled,
                InfoIs::Aged => {
                    pt.selected_role = PortRole::Designated;
                    pt.updt_info = true;
                }
                InfoIs::Mine => {
                    pt.selected_role = PortRole::Designated;
                    if stale {
                        pt.updt_info = true;
                    }
                }
                InfoIs::Received if root_port == Some(q) => {
                    pt.selected_role = PortRole::Root;
                    pt.updt_info = false;
                }
                InfoIs::Received if !pt.designated_priority.is_better_than(&pt.port_priority) => {
                    pt.selected_role = if pt.port_priority.designated_bridge_id.address() == own_address {
                        PortRole::Backup
                    } else {
                        PortRole::Alternate
                    };
                    pt.updt_info = false;
                }
                InfoIs::Received => {
                    pt.selected_role = PortRole::Designated;
                    pt.updt_info = true;
                }
            }
        }
    }

    /// Value of the Master flag in the MSTI message for this port.
    pub fn msti_master_flag(&self, port: PortIndex, tree: TreeIndex) -> bool {
        let role = self.ports[port].trees[tree].role;
        if !matches!(role, PortRole::Root | PortRole::Designated) {
            return false;
        }
        self.ports
            .iter()
            .any(|p| p.trees[tree].role == PortRole::Master || p.trees[tree].mastered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpdu::{Bpdu, CistMessage, MessageTimes, MstExtension, MstiMessage};
    use mstp_types::MacAddress;
    use pretty_assertions::assert_eq;

    fn mac(last: u8) -> MacAddress {
        MacAddress::new([0, 0, 0, 0, 0, last])
    }

    fn bridge_id(last: u8) -> BridgeId {
        BridgeId::new(0x8000, 0, mac(last)).unwrap()
    }

    fn designated_rst(root: u8, cost: u32, sender: u8) -> Bpdu {
        let mut flags = BpduFlags::default();
        flags.set_role(EncodedRole::Designated);
        Bpdu::rst(CistMessage {
            flags,
            root_id: bridge_id(root),
            external_root_path_cost: cost,
            regional_root_id: bridge_id(sender),
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

    fn receive(state: &mut BridgeState, port: PortIndex, bpdu: Bpdu) {
        state.ports[port].received = Some(bpdu);
        state.ports[port].rcvd_rstp = true;
        state.ports[port].rcvd_internal = state.from_same_region(port);
        state.set_rcvd_msgs(port);
    }

    #[test]
    fn test_set_rcvd_msgs_external_rst() {
        let mut state = BridgeState::new(2, 1, mac(5));
        receive(&mut state, 0, designated_rst(1, 0, 1));

        let pt = &state.ports[0].trees[CIST_INDEX];
        assert!(pt.rcvd_msg);
        assert_eq!(pt.msg_priority.root_id, bridge_id(1));
        assert_eq!(pt.msg_priority.designated_bridge_id, bridge_id(1));
        assert_eq!(pt.msg_priority.bridge_port_id, state.ports[0].trees[0].port_id);
        assert_eq!(pt.msg_times.remaining_hops, state.max_hops());
        assert!(!state.ports[0].trees[1].rcvd_msg);
    }

    #[test]
    fn test_rcv_info_classification() {
        let mut state = BridgeState::new(1, 0, mac(5));
        state.ports[0].trees[0].port_priority = state.trees[0].bridge_priority();
        receive(&mut state, 0, designated_rst(1, 0, 1));
        assert_eq!(state.rcv_info(0, 0), RcvdInfo::SuperiorDesignated);

        state.record_priority(0, 0);
        state.record_times(0, 0);
        state.ports[0].trees[0].info_is = InfoIs::Received;
        assert_eq!(state.rcv_info(0, 0), RcvdInfo::RepeatedDesignated);

        receive(&mut state, 0, designated_rst(2, 0, 2));
        assert_eq!(state.rcv_info(0, 0), RcvdInfo::InferiorDesignated);

        let mut worse_root = designated_rst(2, 0, 2);
        worse_root.cist.flags.set_role(EncodedRole::Root);
        receive(&mut state, 0, worse_root);
        assert_eq!(state.rcv_info(0, 0), RcvdInfo::InferiorRootAlternate);
    }

    #[test]
    fn test_rcv_info_msti_repeat_ignores_cist_timers() {
        let mut state = BridgeState::new(1, 1, mac(5));
        state.ports[0].trees[1].port_priority = state.trees[1].bridge_priority();

        let mut flags = BpduFlags::default();
        flags.set_role(EncodedRole::Designated);
        let mut cist = designated_rst(1, 0, 1).cist;
        cist.times = MessageTimes::from_times(&Times {
            forward_delay: 20,
            hello_time: 2,
            max_age: 30,
            message_age: 0,
            remaining_hops: 0,
        });
        let bpdu = Bpdu::mst(
            cist,
            MstExtension {
                config_id: state.mst_config_id.clone(),
                internal_root_path_cost: 0,
                bridge_id: bridge_id(1),
                remaining_hops: 20,
                mstis: vec![MstiMessage {
                    flags,
                    regional_root_id: BridgeId::new(0x8000, 1, mac(1)).unwrap(),
                    internal_root_path_cost: 0,
                    bridge_priority: 0x80,
                    port_priority: 0x80,
                    remaining_hops: 19,
                }],
            },
        );

        receive(&mut state, 0, bpdu.clone());
        assert!(state.ports[0].rcvd_internal);
        assert_eq!(state.rcv_info(0, 1), RcvdInfo::SuperiorDesignated);
        state.record_priority(0, 1);
        state.record_times(0, 1);
        state.ports[0].trees[1].info_is = InfoIs::Received;

        receive(&mut state, 0, bpdu);
        assert_eq!(state.ports[0].trees[1].msg_times.remaining_hops, 19);
        assert_eq!(state.ports[0].trees[1].port_times.max_age, 20);
        assert_eq!(state.rcv_info(0, 1), RcvdInfo::RepeatedDesignated);
    }

    #[test]
    fn test_updt_roles_tree_selects_root_and_designated() {
        let mut state = BridgeState::new(2, 0, mac(5));
        for port in 0..2 {
            state.ports[port].speed_mbps = 100;
        }
        receive(&mut state, 0, designated_rst(1, 0, 1));
        state.record_priority(0, 0);
        state.record_times(0, 0);
        state.ports[0].trees[0].info_is = InfoIs::Received;
        state.ports[1].trees[0].info_is = InfoIs::Aged;

        state.updt_roles_tree(0);

        let tree = &state.trees[0];
        assert_eq!(tree.root_port, Some(0));
        assert_eq!(tree.root_priority.root_id, bridge_id(1));
        assert_eq!(tree.root_priority.external_root_path_cost, 200_000);
        assert_eq!(tree.root_times.message_age, 1);
        assert_eq!(state.ports[0].trees[0].selected_role, PortRole::Root);
        assert_eq!(state.ports[1].trees[0].selected_role, PortRole::Designated);
        assert!(state.ports[1].trees[0].updt_info);
        assert_eq!(
            state.ports[1].trees[0].designated_priority.designated_bridge_id,
            state.trees[0].bridge_id
        );
    }

    #[test]
    fn test_updt_roles_tree_backup_for_own_bridge_info() {
        let mut state = BridgeState::new(2, 0, mac(1));
        let own = state.trees[0].bridge_id;
        receive(&mut state, 1, designated_rst(1, 0, 1));
        state.ports[1].trees[0].msg_priority.designated_bridge_id = own;
        state.ports[1].trees[0].msg_priority.designated_port_id = PortId::from_raw(0x8001);
        state.record_priority(1, 0);
        state.ports[1].trees[0].info_is = InfoIs::Received;
        state.ports[0].trees[0].info_is = InfoIs::Mine;

        state.updt_roles_tree(0);

        assert_eq!(state.trees[0].root_port, None);
        assert_eq!(state.ports[1].trees[0].selected_role, PortRole::Backup);
    }

    #[test]
    fn test_set_tc_flags_external_propagates_to_mstis() {
        let mut state = BridgeState::new(1, 2, mac(5));
        let mut bpdu = designated_rst(1, 0, 1);
        bpdu.cist.flags.set(BpduFlags::TOPOLOGY_CHANGE, true);
        receive(&mut state, 0, bpdu);
        state.set_tc_flags(0, 0);
        assert!(state.ports[0].trees.iter().all(|pt| pt.rcvd_tc));
    }

    #[test]
    fn test_updt_rcvd_info_while() {
        let mut state = BridgeState::new(1, 0, mac(5));
        state.ports[0].trees[0].port_times.message_age = 5;
        state.updt_rcvd_info_while(0, 0);
        assert_eq!(state.ports[0].trees[0].rcvd_info_while, 6);

        state.ports[0].trees[0].port_times.message_age = 20;
        state.updt_rcvd_info_while(0, 0);
        assert_eq!(state.ports[0].trees[0].rcvd_info_while, 0);
    }

    #[test]
    fn test_record_agreement_requires_point_to_point() {
        let mut state = BridgeState::new(1, 0, mac(5));
        let mut bpdu = designated_rst(1, 0, 1);
        bpdu.cist.flags.set(BpduFlags::AGREEMENT, true);
        receive(&mut state, 0, bpdu);

        state.record_agreement(0, 0);
        assert!(!state.ports[0].trees[0].agreed);

        state.ports[0].oper_point_to_point = true;
        state.ports[0].trees[0].proposing = true;
        state.record_agreement(0, 0);
        assert!(state.ports[0].trees[0].agreed);
        assert!(!state.ports[0].trees[0].proposing);
    }
}
