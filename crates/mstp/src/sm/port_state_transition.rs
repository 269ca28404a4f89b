use crate::callbacks::BridgeCallbacks;
use crate::scheduler::{OnPortTree, StateMachine};
use crate::state::BridgeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Discarding,
    Learning,
    Forwarding,
}

/// Drives the host's learning and forwarding state from `learn` and `forward`.
pub(crate) struct PortStateTransition;

impl StateMachine for PortStateTransition {
    type State = State;
    type Target = OnPortTree;

    const NAME: &'static str = "PortStateTransition";

    fn state(bridge: &BridgeState, OnPortTree(port, tree): OnPortTree) -> State {
        bridge.ports[port].trees[tree].state_transition_sm
    }

    fn set_state(bridge: &mut BridgeState, OnPortTree(port, tree): OnPortTree, state: State) {
        bridge.ports[port].trees[tree].state_transition_sm = state;
    }

    fn begin_state(_bridge: &BridgeState, _target: OnPortTree) -> State {
        State::Discarding
    }

    fn check_conditions(bridge: &BridgeState, OnPortTree(port, tree): OnPortTree, state: State) -> Option<State> {
        let pt = &bridge.ports[port].trees[tree];
        match state {
            State::Discarding => pt.learn.then_some(State::Learning),
            State::Learning if !pt.learn => Some(State::Discarding),
            State::Learning => pt.forward.then_some(State::Forwarding),
            State::Forwarding => (!pt.forward).then_some(State::Discarding),
        }
    }

    fn enter_state(
        bridge: &mut BridgeState,
        callbacks: &mut dyn BridgeCallbacks,
        OnPortTree(port, tree): OnPortTree,
        state: State,
        timestamp: u32,
    ) {
        let pt = &mut bridge.ports[port].trees[tree];
        match state {
            State::Discarding => {
                callbacks.disable_learning(port, tree, timestamp);
                pt.learning = false;
                callbacks.disable_forwarding(port, tree, timestamp);
                pt.forwarding = false;
            }
            State::Learning => {
                callbacks.enable_learning(port, tree, timestamp);
                pt.learning = true;
            }
            State::Forwarding => {
                callbacks.enable_forwarding(port, tree, timestamp);
                pt.forwarding = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_state, Call, RecordingCallbacks};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_follows_learn_and_forward() {
        let mut bridge = test_state(1, 1);
        let target = OnPortTree(0, 1);
        assert_eq!(PortStateTransition::check_conditions(&bridge, target, State::Discarding), None);

        bridge.ports[0].trees[1].learn = true;
        assert_eq!(
            PortStateTransition::check_conditions(&bridge, target, State::Discarding),
            Some(State::Learning)
        );
        bridge.ports[0].trees[1].forward = true;
        assert_eq!(
            PortStateTransition::check_conditions(&bridge, target, State::Learning),
            Some(State::Forwarding)
        );
        bridge.ports[0].trees[1].learn = false;
        bridge.ports[0].trees[1].forward = false;
        assert_eq!(
            PortStateTransition::check_conditions(&bridge, target, State::Forwarding),
            Some(State::Discarding)
        );
    }

    #[test]
    fn test_entry_notifies_host() {
        let mut bridge = test_state(1, 0);
        let mut callbacks = RecordingCallbacks::default();
        let target = OnPortTree(0, 0);
        PortStateTransition::enter_state(&mut bridge, &mut callbacks, target, State::Learning, 0);
        PortStateTransition::enter_state(&mut bridge, &mut callbacks, target, State::Forwarding, 0);
        assert!(bridge.ports[0].trees[0].learning);
        assert!(bridge.ports[0].trees[0].forwarding);

        PortStateTransition::enter_state(&mut bridge, &mut callbacks, target, State::Discarding, 0);
        assert!(!bridge.ports[0].trees[0].forwarding);
        assert_eq!(
            callbacks.calls,
            vec![
                Call::EnableLearning(0, 0),
                Call::EnableForwarding(0, 0),
                Call::DisableLearning(0, 0),
                Call::DisableForwarding(0, 0),
            ]
        );
    }
}
