use crate::callbacks::BridgeCallbacks;
use crate::scheduler::{OnPort, StateMachine};
use crate::state::BridgeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Discard,
    Receive,
}

/// Hands a received BPDU to the per-tree Port Information machines.
pub(crate) struct PortReceive;

impl StateMachine for PortReceive {
    type State = State;
    type Target = OnPort;

    const NAME: &'static str = "PortReceive";

    fn state(bridge: &BridgeState, OnPort(port): OnPort) -> State {
        bridge.ports[port].receive_sm
    }

    fn set_state(bridge: &mut BridgeState, OnPort(port): OnPort, state: State) {
        bridge.ports[port].receive_sm = state;
    }

    fn begin_state(_bridge: &BridgeState, _target: OnPort) -> State {
        State::Discard
    }

    fn check_conditions(bridge: &BridgeState, OnPort(port): OnPort, state: State) -> Option<State> {
        let p = &bridge.ports[port];
        if (p.rcvd_bpdu || p.edge_delay_while != bridge.migrate_time) && !p.port_enabled {
            return Some(State::Discard);
        }

        match state {
            State::Discard if p.rcvd_bpdu && p.port_enabled => Some(State::Receive),
            State::Receive if p.rcvd_bpdu && p.port_enabled && !bridge.rcvd_any_msg(port) => {
                Some(State::Receive)
            }
            _ => None,
        }
    }

    fn enter_state(
        bridge: &mut BridgeState,
        _callbacks: &mut dyn BridgeCallbacks,
        OnPort(port): OnPort,
        state: State,
        _timestamp: u32,
    ) {
        match state {
            State::Discard => {
                let migrate_time = bridge.migrate_time;
                let p = &mut bridge.ports[port];
                p.rcvd_bpdu = false;
                p.rcvd_rstp = false;
                p.rcvd_stp = false;
                bridge.clear_all_rcvd_msgs(port);
                bridge.ports[port].edge_delay_while = migrate_time;
            }
            State::Receive => {
                bridge.updt_bpdu_version(port);
                bridge.ports[port].rcvd_internal = bridge.from_same_region(port);
                bridge.set_rcvd_msgs(port);
                let edge_delay = bridge.edge_delay(port);
                let p = &mut bridge.ports[port];
                p.oper_edge = false;
                p.rcvd_bpdu = false;
                p.edge_delay_while = edge_delay;
            }
        }
    }
}
