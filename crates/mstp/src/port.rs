//! Per-port and per-port-per-tree records.

use mstp_types::PortId;

use crate::bpdu::{Bpdu, BpduFlags};
use crate::defaults;
use crate::priority_vector::{PriorityVector, Times};
use crate::sm::{
    bridge_detection, port_information, port_protocol_migration, port_receive,
    port_role_transitions, port_state_transition, port_transmit, topology_change,
};
use crate::types::{PortRole, PortStats};

/// Where a port's recorded priority information came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InfoIs {
    Disabled,
    Aged,
    Mine,
    Received,
}

/// Classification of a received message against the recorded information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RcvdInfo {
    SuperiorDesignated,
    RepeatedDesignated,
    InferiorDesignated,
    InferiorRootAlternate,
    Other,
}

/// Path cost recommended for a link speed, 20 Tb/s divided by the speed.
pub fn path_cost_for_speed(speed_mbps: u32) -> u32 {
    if speed_mbps == 0 {
        return defaults::MAX_PATH_COST;
    }
    let cost = 20_000_000_000u64 / u64::from(speed_mbps);
    cost.clamp(1, u64::from(defaults::MAX_PATH_COST)) as u32
}

/// State of one port for one tree.
#[derive(Debug, Clone)]
pub(crate) struct PortTree {
    pub port_id: PortId,
    /// 0 selects the speed-derived cost.
    pub admin_internal_path_cost: u32,

    pub info_is: InfoIs,
    pub rcvd_info: RcvdInfo,
    pub role: PortRole,
    pub selected_role: PortRole,

    pub port_priority: PriorityVector,
    pub designated_priority: PriorityVector,
    pub msg_priority: PriorityVector,
    pub port_times: Times,
    pub designated_times: Times,
    pub msg_times: Times,
    pub msg_flags: BpduFlags,

    pub agree: bool,
    pub agreed: bool,
    pub disputed: bool,
    pub forward: bool,
    pub forwarding: bool,
    pub learn: bool,
    pub learning: bool,
    pub mastered: bool,
    pub proposed: bool,
    pub proposing: bool,
    pub rcvd_msg: bool,
    pub rcvd_tc: bool,
    pub re_root: bool,
    pub reselect: bool,
    pub selected: bool,
    pub sync: bool,
    pub synced: bool,
    pub tc_prop: bool,
    pub updt_info: bool,

    pub fd_while: u16,
    pub rr_while: u16,
    pub rb_while: u16,
    pub tc_while: u16,
    pub rcvd_info_while: u16,

    pub information_sm: port_information::State,
    pub role_transitions_sm: port_role_transitions::State,
    pub state_transition_sm: port_state_transition::State,
    pub topology_change_sm: topology_change::State,
}

impl PortTree {
    pub fn new(port_id: PortId, times: Times) -> Self {
        PortTree {
            port_id,
            admin_internal_path_cost: 0,
            info_is: InfoIs::Disabled,
            rcvd_info: RcvdInfo::Other,
            role: PortRole::Disabled,
            selected_role: PortRole::Disabled,
            port_priority: PriorityVector::default(),
            designated_priority: PriorityVector::default(),
            msg_priority: PriorityVector::default(),
            port_times: times,
            designated_times: times,
            msg_times: times,
            msg_flags: BpduFlags::default(),
            agree: false,
            agreed: false,
            disputed: false,
            forward: false,
            forwarding: false,
            learn: false,
            learning: false,
            mastered: false,
            proposed: false,
            proposing: false,
            rcvd_msg: false,
            rcvd_tc: false,
            re_root: false,
            reselect: false,
            selected: false,
            sync: false,
            synced: false,
            tc_prop: false,
            updt_info: false,
            fd_while: 0,
            rr_while: 0,
            rb_while: 0,
            tc_while: 0,
            rcvd_info_while: 0,
            information_sm: port_information::State::Disabled,
            role_transitions_sm: port_role_transitions::State::InitPort,
            state_transition_sm: port_state_transition::State::Discarding,
            topology_change_sm: topology_change::State::Inactive,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Port {
    pub admin_edge: bool,
    pub auto_edge: bool,
    /// 0 selects the speed-derived cost.
    pub admin_external_path_cost: u32,
    pub speed_mbps: u32,

    pub port_enabled: bool,
    pub oper_point_to_point: bool,
    pub oper_edge: bool,
    pub info_internal: bool,
    pub rcvd_internal: bool,
    pub new_info: bool,
    pub new_info_msti: bool,
    pub rcvd_bpdu: bool,
    pub rcvd_rstp: bool,
    pub rcvd_stp: bool,
    pub rcvd_tc_ack: bool,
    pub rcvd_tcn: bool,
    pub send_rstp: bool,
    pub tc_ack: bool,
    pub mcheck: bool,

    pub tx_count: u32,
    pub edge_delay_while: u16,
    pub hello_when: u16,
    pub mdelay_while: u16,

    /// The BPDU handed to Port Receive, kept until the next one arrives.
    pub received: Option<Bpdu>,
    pub trees: Vec<PortTree>,
    pub stats: PortStats,

    pub receive_sm: port_receive::State,
    pub migration_sm: port_protocol_migration::State,
    pub detection_sm: bridge_detection::State,
    pub transmit_sm: port_transmit::State,
}

impl Port {
    pub fn new(number: u16, tree_count: usize, times: Times) -> Self {
        let port_id = PortId::from_raw((u16::from(defaults::PORT_PRIORITY) << 8) | number);
        Port {
            admin_edge: false,
            auto_edge: true,
            admin_external_path_cost: 0,
            speed_mbps: 0,
            port_enabled: false,
            oper_point_to_point: false,
            oper_edge: false,
            info_internal: false,
            rcvd_internal: false,
            new_info: false,
            new_info_msti: false,
            rcvd_bpdu: false,
            rcvd_rstp: false,
            rcvd_stp: false,
            rcvd_tc_ack: false,
            rcvd_tcn: false,
            send_rstp: false,
            tc_ack: false,
            mcheck: false,
            tx_count: 0,
            edge_delay_while: 0,
            hello_when: 0,
            mdelay_while: 0,
            received: None,
            trees: (0..tree_count).map(|_| PortTree::new(port_id, times)).collect(),
            stats: PortStats::default(),
            receive_sm: port_receive::State::Discard,
            migration_sm: port_protocol_migration::State::CheckingRstp,
            detection_sm: bridge_detection::State::NotEdge,
            transmit_sm: port_transmit::State::TransmitInit,
        }
    }

    pub fn external_path_cost(&self) -> u32 {
        match self.admin_external_path_cost {
            0 => path_cost_for_speed(self.speed_mbps),
            cost => cost,
        }
    }

    pub fn internal_path_cost(&self, tree: usize) -> u32 {
        match self.trees[tree].admin_internal_path_cost {
            0 => path_cost_for_speed(self.speed_mbps),
            cost => cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_path_cost_for_speed() {
        assert_eq!(path_cost_for_speed(100), 200_000);
        assert_eq!(path_cost_for_speed(1_000), 20_000);
        assert_eq!(path_cost_for_speed(10_000), 2_000);
        assert_eq!(path_cost_for_speed(0), defaults::MAX_PATH_COST);
        assert_eq!(path_cost_for_speed(1), defaults::MAX_PATH_COST);
        assert_eq!(path_cost_for_speed(u32::MAX), 4);
    }

    #[test]
    fn test_admin_cost_overrides_speed() {
        let mut port = Port::new(1, 2, Times::default());
        port.speed_mbps = 1_000;
        assert_eq!(port.external_path_cost(), 20_000);
        port.admin_external_path_cost = 7;
        assert_eq!(port.external_path_cost(), 7);

        port.trees[1].admin_internal_path_cost = 9;
        assert_eq!(port.internal_path_cost(0), 20_000);
        assert_eq!(port.internal_path_cost(1), 9);
    }

    #[test]
    fn test_new_port_ids() {
        let port = Port::new(3, 2, Times::default());
        assert_eq!(port.trees.len(), 2);
        assert_eq!(port.trees[1].port_id.raw(), 0x8003);
    }
}
