//! Port Information: records the best information received on a port and
//! ages it out when the sender goes quiet.

use crate::callbacks::BridgeCallbacks;
use crate::port::{InfoIs, RcvdInfo};
use crate::scheduler::{OnPortTree, StateMachine};
use crate::state::BridgeState;
use crate::types::CIST_INDEX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Disabled,
    Aged,
    Update,
    SuperiorDesignated,
    RepeatedDesignated,
    InferiorDesignated,
    NotDesignated,
    Other,
    Current,
    Receive,
}

pub(crate) struct PortInformation;

impl StateMachine for PortInformation {
    type State = State;
    type Target = OnPortTree;

    const NAME: &'static str = "PortInformation";

    fn state(bridge: &BridgeState, OnPortTree(port, tree): OnPortTree) -> State {
        bridge.ports[port].trees[tree].information_sm
    }

    fn set_state(bridge: &mut BridgeState, OnPortTree(port, tree): OnPortTree, state: State) {
        bridge.ports[port].trees[tree].information_sm = state;
    }

    fn begin_state(_bridge: &BridgeState, _target: OnPortTree) -> State {
        State::Disabled
    }

    fn check_conditions(bridge: &BridgeState, OnPortTree(port, tree): OnPortTree, state: State) -> Option<State> {
        let p = &bridge.ports[port];
        let pt = &p.trees[tree];

        if !p.port_enabled && pt.info_is != InfoIs::Disabled {
            return (state != State::Disabled).then_some(State::Disabled);
        }

        match state {
            State::Disabled => {
                if pt.rcvd_msg {
                    Some(State::Disabled)
                } else if p.port_enabled {
                    Some(State::Aged)
                } else {
                    None
                }
            }
            State::Aged => (pt.selected && pt.updt_info).then_some(State::Update),
            State::Update
            | State::SuperiorDesignated
            | State::RepeatedDesignated
            | State::InferiorDesignated
            | State::NotDesignated
            | State::Other => Some(State::Current),
            State::Current => {
                let rcvd_xst_msg = bridge.rcvd_xst_msg(port, tree);
                if pt.selected && pt.updt_info {
                    Some(State::Update)
                } else if pt.info_is == InfoIs::Received
                    && pt.rcvd_info_while == 0
                    && !pt.updt_info
                    && !rcvd_xst_msg
                {
                    Some(State::Aged)
                } else if rcvd_xst_msg && !bridge.updt_xst_info(port, tree) {
                    Some(State::Receive)
                } else {
                    None
                }
            }
            State::Receive => Some(match pt.rcvd_info {
                RcvdInfo::SuperiorDesignated => State::SuperiorDesignated,
                RcvdInfo::RepeatedDesignated => State::RepeatedDesignated,
                RcvdInfo::InferiorDesignated => State::InferiorDesignated,
                RcvdInfo::InferiorRootAlternate => State::NotDesignated,
                RcvdInfo::Other => State::Other,
            }),
        }
    }

    fn enter_state(
        bridge: &mut BridgeState,
        _callbacks: &mut dyn BridgeCallbacks,
        OnPortTree(port, tree): OnPortTree,
        state: State,
        _timestamp: u32,
    ) {
        match state {
            State::Disabled => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.rcvd_msg = false;
                pt.proposing = false;
                pt.proposed = false;
                pt.agree = false;
                pt.agreed = false;
                pt.rcvd_info_while = 0;
                pt.info_is = InfoIs::Disabled;
                pt.reselect = true;
                pt.selected = false;
            }
            State::Aged => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.info_is = InfoIs::Aged;
                pt.reselect = true;
                pt.selected = false;
            }
            State::Update => {
                let better_or_same = bridge.better_or_same_info(port, tree, InfoIs::Mine);
                let p = &mut bridge.ports[port];
                let pt = &mut p.trees[tree];
                pt.proposing = false;
                pt.proposed = false;
                pt.agreed = pt.agreed && better_or_same;
                pt.synced = pt.synced && pt.agreed;
                pt.port_priority = pt.designated_priority;
                pt.port_times = pt.designated_times;
                pt.updt_info = false;
                pt.info_is = InfoIs::Mine;
                if tree == CIST_INDEX {
                    p.new_info = true;
                } else {
                    p.new_info_msti = true;
                }
            }
            State::SuperiorDesignated => {
                bridge.ports[port].info_internal = bridge.ports[port].rcvd_internal;
                {
                    let pt = &mut bridge.ports[port].trees[tree];
                    pt.agreed = false;
                    pt.proposing = false;
                }
                bridge.record_proposal(port, tree);
                bridge.set_tc_flags(port, tree);
                let better_or_same = bridge.better_or_same_info(port, tree, InfoIs::Received);
                {
                    let pt = &mut bridge.ports[port].trees[tree];
                    pt.agree = pt.agree && better_or_same;
                }
                bridge.record_agreement(port, tree);
                {
                    let pt = &mut bridge.ports[port].trees[tree];
                    pt.synced = pt.synced && pt.agreed;
                }
                bridge.record_priority(port, tree);
                bridge.record_times(port, tree);
                bridge.updt_rcvd_info_while(port, tree);
                let pt = &mut bridge.ports[port].trees[tree];
                pt.info_is = InfoIs::Received;
                pt.reselect = true;
                pt.selected = false;
                pt.rcvd_msg = false;
            }
            State::RepeatedDesignated => {
                bridge.ports[port].info_internal = bridge.ports[port].rcvd_internal;
                bridge.record_proposal(port, tree);
                bridge.set_tc_flags(port, tree);
                bridge.record_agreement(port, tree);
                bridge.updt_rcvd_info_while(port, tree);
                bridge.ports[port].trees[tree].rcvd_msg = false;
            }
            State::InferiorDesignated => {
                bridge.record_dispute(port, tree);
                bridge.ports[port].trees[tree].rcvd_msg = false;
            }
            State::NotDesignated => {
                bridge.record_agreement(port, tree);
                bridge.set_tc_flags(port, tree);
                bridge.ports[port].trees[tree].rcvd_msg = false;
            }
            State::Other => bridge.ports[port].trees[tree].rcvd_msg = false,
            State::Current => {}
            State::Receive => {
                bridge.ports[port].trees[tree].rcvd_info = bridge.rcv_info(port, tree);
                bridge.record_mastered(port, tree);
            }
        }
    }
}
