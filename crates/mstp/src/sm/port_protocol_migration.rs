use crate::callbacks::BridgeCallbacks;
use crate::scheduler::{OnPort, StateMachine};
use crate::state::BridgeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    CheckingRstp,
    SelectingStp,
    Sensing,
}

/// Chooses between RST/MST and Configuration BPDUs from what the peer sends.
pub(crate) struct PortProtocolMigration;

impl StateMachine for PortProtocolMigration {
    type State = State;
    type Target = OnPort;

    const NAME: &'static str = "PortProtocolMigration";

    fn state(bridge: &BridgeState, OnPort(port): OnPort) -> State {
        bridge.ports[port].migration_sm
    }

    fn set_state(bridge: &mut BridgeState, OnPort(port): OnPort, state: State) {
        bridge.ports[port].migration_sm = state;
    }

    fn begin_state(_bridge: &BridgeState, _target: OnPort) -> State {
        State::CheckingRstp
    }

    fn check_conditions(bridge: &BridgeState, OnPort(port): OnPort, state: State) -> Option<State> {
        let p = &bridge.ports[port];
        match state {
            State::CheckingRstp => {
                if p.mdelay_while == 0 {
                    Some(State::Sensing)
                } else if p.mdelay_while != bridge.migrate_time && !p.port_enabled {
                    Some(State::CheckingRstp)
                } else {
                    None
                }
            }
            State::SelectingStp => {
                (p.mdelay_while == 0 || !p.port_enabled || p.mcheck).then_some(State::Sensing)
            }
            State::Sensing => {
                if !p.port_enabled || p.mcheck || (bridge.rstp_version() && !p.send_rstp && p.rcvd_rstp) {
                    Some(State::CheckingRstp)
                } else if p.send_rstp && p.rcvd_stp {
                    Some(State::SelectingStp)
                } else {
                    None
                }
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
        let rstp = bridge.rstp_version();
        let migrate_time = bridge.migrate_time;
        let p = &mut bridge.ports[port];
        match state {
            State::CheckingRstp => {
                p.mcheck = false;
                p.send_rstp = rstp;
                p.mdelay_while = migrate_time;
            }
            State::SelectingStp => {
                p.send_rstp = false;
                p.mdelay_while = migrate_time;
            }
            State::Sensing => {
                p.rcvd_rstp = false;
                p.rcvd_stp = false;
            }
        }
    }
}
