//! Run-to-fixpoint driver for the state machines.
//!
//! A machine is a closed state enum plus two functions: a pure
//! `check_conditions` that names the next state, if any, and `enter_state`
//! that performs the entry actions. For each event the scheduler applies the
//! event's input, then sweeps every instance of every machine, entering any
//! state a predicate selects, until a whole sweep changes nothing.

use std::fmt;
use tracing::{debug, error, trace};

use crate::bpdu::Bpdu;
use crate::callbacks::BridgeCallbacks;
use crate::sm::{
    BridgeDetection, PortInformation, PortProtocolMigration, PortReceive, PortRoleSelection,
    PortRoleTransitions, PortStateTransition, PortTransmit, TopologyChange,
};
use crate::state::BridgeState;
use crate::timers;
use crate::types::{PortIndex, TreeIndex};

/// Upper bound on sweeps per event; the machines settle in far fewer.
const MAX_SWEEPS: usize = 1000;

/// Everything that makes the machines run.
#[derive(Debug, Clone)]
pub(crate) enum Event {
    Begin,
    BpduReceived { port: PortIndex, bpdu: Box<Bpdu> },
    Tick,
    PortEnabled { port: PortIndex, speed_mbps: u32, point_to_point: bool },
    PortDisabled { port: PortIndex },
    ConfigChanged,
}

/// What one machine instance runs for.
pub(crate) trait Target: Copy + fmt::Debug {
    fn all(bridge: &BridgeState) -> Vec<Self>;
    fn port(&self) -> Option<PortIndex>;
    fn tree(&self) -> Option<TreeIndex>;
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OnPort(pub PortIndex);

#[derive(Debug, Clone, Copy)]
pub(crate) struct OnPortTree(pub PortIndex, pub TreeIndex);

#[derive(Debug, Clone, Copy)]
pub(crate) struct OnTree(pub TreeIndex);

impl Target for OnPort {
    fn all(bridge: &BridgeState) -> Vec<Self> {
        (0..bridge.ports.len()).map(OnPort).collect()
    }

    fn port(&self) -> Option<PortIndex> {
        Some(self.0)
    }

    fn tree(&self) -> Option<TreeIndex> {
        None
    }
}

impl Target for OnPortTree {
    fn all(bridge: &BridgeState) -> Vec<Self> {
        let trees = bridge.trees.len();
        (0..bridge.ports.len())
            .flat_map(|port| (0..trees).map(move |tree| OnPortTree(port, tree)))
            .collect()
    }

    fn port(&self) -> Option<PortIndex> {
        Some(self.0)
    }

    fn tree(&self) -> Option<TreeIndex> {
        Some(self.1)
    }
}

impl Target for OnTree {
    fn all(bridge: &BridgeState) -> Vec<Self> {
        (0..bridge.trees.len()).map(OnTree).collect()
    }

    fn port(&self) -> Option<PortIndex> {
        None
    }

    fn tree(&self) -> Option<TreeIndex> {
        Some(self.0)
    }
}

pub(crate) trait StateMachine {
    type State: Copy + Eq + fmt::Debug;
    type Target: Target;

    const NAME: &'static str;

    fn state(bridge: &BridgeState, target: Self::Target) -> Self::State;

    fn set_state(bridge: &mut BridgeState, target: Self::Target, state: Self::State);

    /// The state BEGIN forces.
    fn begin_state(bridge: &BridgeState, target: Self::Target) -> Self::State;

    /// Returns the state to enter next, or `None` to stay. Must not mutate.
    fn check_conditions(
        bridge: &BridgeState,
        target: Self::Target,
        state: Self::State,
    ) -> Option<Self::State>;

    fn enter_state(
        bridge: &mut BridgeState,
        callbacks: &mut dyn BridgeCallbacks,
        target: Self::Target,
        state: Self::State,
        timestamp: u32,
    );
}

fn enter<M: StateMachine>(
    bridge: &mut BridgeState,
    callbacks: &mut dyn BridgeCallbacks,
    target: M::Target,
    state: M::State,
    timestamp: u32,
) {
    trace!(machine = M::NAME, ?target, ?state, "enter");
    if bridge.debug_log {
        let text = format!("{}: {:?}\n", M::NAME, state);
        callbacks.debug_log(target.port(), target.tree(), &text, false);
    }
    M::set_state(bridge, target, state);
    M::enter_state(bridge, callbacks, target, state, timestamp);
}

fn reset<M: StateMachine>(bridge: &mut BridgeState, callbacks: &mut dyn BridgeCallbacks, timestamp: u32) {
    for target in M::Target::all(bridge) {
        let state = M::begin_state(bridge, target);
        enter::<M>(bridge, callbacks, target, state, timestamp);
    }
}

fn sweep<M: StateMachine>(bridge: &mut BridgeState, callbacks: &mut dyn BridgeCallbacks, timestamp: u32) -> bool {
    let mut changed = false;
    for target in M::Target::all(bridge) {
        let current = M::state(bridge, target);
        if let Some(next) = M::check_conditions(bridge, target, current) {
            enter::<M>(bridge, callbacks, target, next, timestamp);
            changed = true;
        }
    }
    changed
}

/// Forces every machine instance into its BEGIN state.
pub(crate) fn reset_all(bridge: &mut BridgeState, callbacks: &mut dyn BridgeCallbacks, timestamp: u32) {
    bridge.begin = true;
    reset::<PortReceive>(bridge, callbacks, timestamp);
    reset::<PortProtocolMigration>(bridge, callbacks, timestamp);
    reset::<BridgeDetection>(bridge, callbacks, timestamp);
    reset::<PortInformation>(bridge, callbacks, timestamp);
    reset::<PortRoleSelection>(bridge, callbacks, timestamp);
    reset::<PortRoleTransitions>(bridge, callbacks, timestamp);
    reset::<PortStateTransition>(bridge, callbacks, timestamp);
    reset::<TopologyChange>(bridge, callbacks, timestamp);
    reset::<PortTransmit>(bridge, callbacks, timestamp);
    bridge.begin = false;
}

fn run_to_fixpoint(bridge: &mut BridgeState, callbacks: &mut dyn BridgeCallbacks, timestamp: u32) {
    for sweeps in 1..=MAX_SWEEPS {
        let mut changed = false;
        changed |= sweep::<PortReceive>(bridge, callbacks, timestamp);
        changed |= sweep::<PortProtocolMigration>(bridge, callbacks, timestamp);
        changed |= sweep::<BridgeDetection>(bridge, callbacks, timestamp);
        changed |= sweep::<PortInformation>(bridge, callbacks, timestamp);
        changed |= sweep::<PortRoleSelection>(bridge, callbacks, timestamp);
        changed |= sweep::<PortRoleTransitions>(bridge, callbacks, timestamp);
        changed |= sweep::<PortStateTransition>(bridge, callbacks, timestamp);
        changed |= sweep::<TopologyChange>(bridge, callbacks, timestamp);
        changed |= sweep::<PortTransmit>(bridge, callbacks, timestamp);
        if !changed {
            trace!(sweeps, "state machines settled");
            if bridge.debug_log && sweeps > 1 {
                callbacks.debug_log(None, None, "", true);
            }
            return;
        }
    }
    error!(sweeps = MAX_SWEEPS, "state machines did not settle");
}

/// Applies an event's input to the bridge and runs the machines to quiescence.
pub(crate) fn dispatch(
    bridge: &mut BridgeState,
    callbacks: &mut dyn BridgeCallbacks,
    event: Event,
    timestamp: u32,
) {
    debug!(?event, timestamp, "dispatch");
    match event {
        Event::Begin => reset_all(bridge, callbacks, timestamp),
        Event::BpduReceived { port, bpdu } => {
            let port = &mut bridge.ports[port];
            port.received = Some(*bpdu);
            port.rcvd_bpdu = true;
            port.stats.bpdus_received += 1;
        }
        Event::Tick => timers::tick(bridge),
        Event::PortEnabled {
            port,
            speed_mbps,
            point_to_point,
        } => {
            let port = &mut bridge.ports[port];
            port.port_enabled = true;
            port.speed_mbps = speed_mbps;
            port.oper_point_to_point = point_to_point;
        }
        Event::PortDisabled { port } => bridge.ports[port].port_enabled = false,
        Event::ConfigChanged => {}
    }
    // A stopped bridge only records port and configuration inputs.
    if bridge.started {
        run_to_fixpoint(bridge, callbacks, timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sm::port_role_transitions;
    use crate::testing::{test_state, Call, RecordingCallbacks};
    use crate::types::PortRole;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stopped_bridge_records_inputs_only() {
        let mut state = test_state(2, 0);
        let mut callbacks = RecordingCallbacks::default();
        dispatch(
            &mut state,
            &mut callbacks,
            Event::PortEnabled {
                port: 1,
                speed_mbps: 100,
                point_to_point: true,
            },
            0,
        );
        assert!(state.ports[1].port_enabled);
        assert_eq!(state.ports[1].speed_mbps, 100);
        assert!(callbacks.calls.is_empty());
        assert!(callbacks.sent.is_empty());
    }

    #[test]
    fn test_begin_settles_enabled_port_as_designated() {
        let mut state = test_state(2, 1);
        let mut callbacks = RecordingCallbacks::default();
        state.ports[0].port_enabled = true;
        state.ports[0].speed_mbps = 1000;
        state.ports[0].oper_point_to_point = true;
        state.started = true;

        dispatch(&mut state, &mut callbacks, Event::Begin, 0);
        assert!(!state.begin);
        for tree in 0..2 {
            assert_eq!(state.ports[0].trees[tree].role, PortRole::Designated);
            assert_eq!(state.ports[1].trees[tree].role, PortRole::Disabled);
            assert_eq!(
                state.ports[1].trees[tree].role_transitions_sm,
                port_role_transitions::State::DisabledPort
            );
        }
        assert!(callbacks.calls.contains(&Call::DisableForwarding(1, 1)));
        assert!(!callbacks.sent.is_empty());
    }

    #[test]
    fn test_settled_bridge_ignores_config_event() {
        let mut state = test_state(1, 0);
        let mut callbacks = RecordingCallbacks::default();
        state.started = true;
        dispatch(&mut state, &mut callbacks, Event::Begin, 0);
        let calls = callbacks.calls.len();
        let sent = callbacks.sent.len();

        dispatch(&mut state, &mut callbacks, Event::ConfigChanged, 0);
        assert_eq!(callbacks.calls.len(), calls);
        assert_eq!(callbacks.sent.len(), sent);
    }
}
