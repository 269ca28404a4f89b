use crate::callbacks::BridgeCallbacks;
use crate::scheduler::{OnTree, StateMachine};
use crate::state::BridgeState;
use crate::types::CIST_INDEX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    InitTree,
    RoleSelection,
}

/// Recomputes the roles of a tree's ports whenever some port asks for it.
pub(crate) struct PortRoleSelection;

impl StateMachine for PortRoleSelection {
    type State = State;
    type Target = OnTree;

    const NAME: &'static str = "PortRoleSelection";

    fn state(bridge: &BridgeState, OnTree(tree): OnTree) -> State {
        bridge.trees[tree].role_selection_sm
    }

    fn set_state(bridge: &mut BridgeState, OnTree(tree): OnTree, state: State) {
        bridge.trees[tree].role_selection_sm = state;
    }

    fn begin_state(_bridge: &BridgeState, _target: OnTree) -> State {
        State::InitTree
    }

    fn check_conditions(bridge: &BridgeState, OnTree(tree): OnTree, state: State) -> Option<State> {
        match state {
            State::InitTree => Some(State::RoleSelection),
            State::RoleSelection => bridge
                .ports
                .iter()
                .any(|p| p.trees[tree].reselect)
                .then_some(State::RoleSelection),
        }
    }

    fn enter_state(
        bridge: &mut BridgeState,
        _callbacks: &mut dyn BridgeCallbacks,
        OnTree(tree): OnTree,
        state: State,
        _timestamp: u32,
    ) {
        match state {
            State::InitTree => bridge.updt_role_disabled_tree(tree),
            State::RoleSelection => {
                bridge.clear_reselect_tree(tree);
                bridge.updt_roles_tree(tree);
                bridge.set_selected_tree(tree);

                // MSTI roles at boundary ports derive from the CIST roles.
                if tree == CIST_INDEX {
                    for port in &mut bridge.ports {
                        for pt in &mut port.trees[1..] {
                            pt.reselect = true;
                            pt.selected = false;
                        }
                    }
                }
            }
        }
    }
}
