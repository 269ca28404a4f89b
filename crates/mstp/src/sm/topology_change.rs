//! Topology Change: detects topology changes on forwarding ports, flushes
//! learned addresses and propagates change notices to the other ports.

use tracing::debug;

use crate::callbacks::BridgeCallbacks;
use crate::scheduler::{OnPortTree, StateMachine};
use crate::state::BridgeState;
use crate::types::{FlushFdbType, PortIndex, PortRole, TreeIndex, CIST_INDEX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Inactive,
    Learning,
    Detected,
    Active,
    NotifiedTcn,
    NotifiedTc,
    Propagating,
    Acknowledged,
}

pub(crate) struct TopologyChange;

fn flush(bridge: &BridgeState, callbacks: &mut dyn BridgeCallbacks, port: PortIndex, tree: TreeIndex, timestamp: u32) {
    let flush_type = if bridge.rstp_version() {
        FlushFdbType::Immediate
    } else {
        FlushFdbType::RapidAgeing
    };
    debug!(port, tree, ?flush_type, "flushing filtering database");
    callbacks.flush_fdb(port, tree, flush_type, timestamp);
}

impl StateMachine for TopologyChange {
    type State = State;
    type Target = OnPortTree;

    const NAME: &'static str = "TopologyChange";

    fn state(bridge: &BridgeState, OnPortTree(port, tree): OnPortTree) -> State {
        bridge.ports[port].trees[tree].topology_change_sm
    }

    fn set_state(bridge: &mut BridgeState, OnPortTree(port, tree): OnPortTree, state: State) {
        bridge.ports[port].trees[tree].topology_change_sm = state;
    }

    fn begin_state(_bridge: &BridgeState, _target: OnPortTree) -> State {
        State::Inactive
    }

    fn check_conditions(bridge: &BridgeState, OnPortTree(port, tree): OnPortTree, state: State) -> Option<State> {
        let p = &bridge.ports[port];
        let pt = &p.trees[tree];
        let cist = tree == CIST_INDEX;
        let rcvd_tcn = cist && p.rcvd_tcn;
        let rcvd_tc_ack = cist && p.rcvd_tc_ack;
        let propagating_role = matches!(pt.role, PortRole::Root | PortRole::Designated | PortRole::Master);

        match state {
            State::Inactive => pt.learn.then_some(State::Learning),
            State::Learning => {
                let pending = pt.rcvd_tc || rcvd_tcn || rcvd_tc_ack || pt.tc_prop;
                if pending {
                    Some(State::Learning)
                } else if propagating_role && pt.forward && !p.oper_edge {
                    Some(State::Detected)
                } else if !propagating_role && !(pt.learn || pt.learning) {
                    Some(State::Inactive)
                } else {
                    None
                }
            }
            State::Detected
            | State::NotifiedTc
            | State::Propagating
            | State::Acknowledged => Some(State::Active),
            State::NotifiedTcn => Some(State::NotifiedTc),
            State::Active => {
                if !propagating_role || p.oper_edge {
                    Some(State::Learning)
                } else if rcvd_tcn {
                    Some(State::NotifiedTcn)
                } else if pt.rcvd_tc {
                    Some(State::NotifiedTc)
                } else if pt.tc_prop && !p.oper_edge {
                    Some(State::Propagating)
                } else if rcvd_tc_ack {
                    Some(State::Acknowledged)
                } else {
                    None
                }
            }
        }
    }

    fn enter_state(
        bridge: &mut BridgeState,
        callbacks: &mut dyn BridgeCallbacks,
        OnPortTree(port, tree): OnPortTree,
        state: State,
        timestamp: u32,
    ) {
        let cist = tree == CIST_INDEX;
        match state {
            State::Inactive => {
                flush(bridge, callbacks, port, tree, timestamp);
                let p = &mut bridge.ports[port];
                p.trees[tree].tc_while = 0;
                if cist {
                    p.tc_ack = false;
                }
            }
            State::Learning => {
                let p = &mut bridge.ports[port];
                if cist {
                    p.rcvd_tcn = false;
                    p.rcvd_tc_ack = false;
                }
                p.trees[tree].rcvd_tc = false;
                p.trees[tree].tc_prop = false;
            }
            State::Detected => {
                bridge.new_tc_while(callbacks, port, tree, timestamp);
                bridge.set_tc_prop_tree(port, tree);
                bridge.set_new_info_xst(port, tree);
            }
            State::Active => {}
            State::NotifiedTcn => bridge.new_tc_while(callbacks, port, tree, timestamp),
            State::NotifiedTc => {
                let p = &mut bridge.ports[port];
                if cist {
                    p.rcvd_tcn = false;
                }
                p.trees[tree].rcvd_tc = false;
                if cist && p.trees[tree].role == PortRole::Designated {
                    p.tc_ack = true;
                }
                bridge.set_tc_prop_tree(port, tree);
                callbacks.on_notified_topology_change(port, tree, timestamp);
            }
            State::Propagating => {
                bridge.new_tc_while(callbacks, port, tree, timestamp);
                flush(bridge, callbacks, port, tree, timestamp);
                bridge.ports[port].trees[tree].tc_prop = false;
            }
            State::Acknowledged => {
                let p = &mut bridge.ports[port];
                p.trees[tree].tc_while = 0;
                p.rcvd_tc_ack = false;
            }
        }
    }
}
