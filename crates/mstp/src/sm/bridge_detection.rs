use crate::callbacks::BridgeCallbacks;
use crate::scheduler::{OnPort, StateMachine};
use crate::state::BridgeState;
use crate::types::CIST_INDEX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Edge,
    NotEdge,
}

/// Maintains operEdge from the admin setting and the edge delay timer.
pub(crate) struct BridgeDetection;

impl StateMachine for BridgeDetection {
    type State = State;
    type Target = OnPort;

    const NAME: &'static str = "BridgeDetection";

    fn state(bridge: &BridgeState, OnPort(port): OnPort) -> State {
        bridge.ports[port].detection_sm
    }

    fn set_state(bridge: &mut BridgeState, OnPort(port): OnPort, state: State) {
        bridge.ports[port].detection_sm = state;
    }

    fn begin_state(bridge: &BridgeState, OnPort(port): OnPort) -> State {
        if bridge.ports[port].admin_edge {
            State::Edge
        } else {
            State::NotEdge
        }
    }

    fn check_conditions(bridge: &BridgeState, OnPort(port): OnPort, state: State) -> Option<State> {
        let p = &bridge.ports[port];
        match state {
            State::Edge => ((!p.port_enabled && !p.admin_edge) || !p.oper_edge).then_some(State::NotEdge),
            State::NotEdge => {
                let auto = p.edge_delay_while == 0
                    && p.auto_edge
                    && p.send_rstp
                    && p.trees[CIST_INDEX].proposing;
                ((!p.port_enabled && p.admin_edge) || auto).then_some(State::Edge)
            }
        }
    }

    fn enter_state(
        bridge: &mut BridgeState,
        _callbacks: &mut dyn BridgeCallbacks,
        OnPort(port): OnPort,
        state: State,
        _timestamp: u32,
    ) {
        bridge.ports[port].oper_edge = state == State::Edge;
    }
}
