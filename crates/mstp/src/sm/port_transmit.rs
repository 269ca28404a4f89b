//! Port Transmit: paces BPDU transmission and builds the BPDUs sent.

use tracing::{trace, warn};

use crate::bpdu::{Bpdu, BpduFlags, CistMessage, EncodedRole, MessageTimes, MstExtension, MstiMessage};
use crate::callbacks::BridgeCallbacks;
use crate::error::MstpError;
use crate::scheduler::{OnPort, StateMachine};
use crate::state::BridgeState;
use crate::types::{PortIndex, PortRole, StpVersion, CIST_INDEX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    TransmitInit,
    TransmitPeriodic,
    TransmitConfig,
    TransmitTcn,
    TransmitRstp,
    Idle,
}

pub(crate) struct PortTransmit;

fn encode_role(role: PortRole) -> EncodedRole {
    match role {
        PortRole::Root => EncodedRole::Root,
        PortRole::Designated => EncodedRole::Designated,
        PortRole::Alternate | PortRole::Backup => EncodedRole::AlternateOrBackup,
        PortRole::Master | PortRole::Disabled => EncodedRole::Master,
    }
}

/// Hands `bpdu` to the host through the transmit buffer callbacks.
fn transmit(bridge: &mut BridgeState, callbacks: &mut dyn BridgeCallbacks, port: PortIndex, bpdu: &Bpdu, timestamp: u32) {
    let size = bpdu.encoded_len();
    let Some(buffer) = callbacks.transmit_get_buffer(port, size, timestamp) else {
        let err = MstpError::UnreachablePort { port };
        warn!(error = %err, "BPDU dropped");
        bridge.ports[port].stats.transmit_dropped += 1;
        return;
    };
    let encoded = bpdu.encode(buffer);
    callbacks.transmit_release_buffer(port);
    match encoded {
        Ok(_) => {
            trace!(port, kind = ?bpdu.kind, "BPDU transmitted");
            bridge.ports[port].stats.bpdus_transmitted += 1;
        }
        Err(err) => warn!(port, error = %err, "BPDU encoding failed"),
    }
}

fn tx_config(bridge: &mut BridgeState, callbacks: &mut dyn BridgeCallbacks, port: PortIndex, timestamp: u32) {
    let p = &bridge.ports[port];
    let pt = &p.trees[CIST_INDEX];
    let mut flags = BpduFlags::default();
    flags.set(BpduFlags::TOPOLOGY_CHANGE, pt.tc_while != 0);
    flags.set(BpduFlags::ACK_OR_MASTER, p.tc_ack);

    let mut times = pt.designated_times;
    times.hello_time = pt.port_times.hello_time;
    let bpdu = Bpdu::config(CistMessage {
        flags,
        root_id: pt.designated_priority.root_id,
        external_root_path_cost: pt.designated_priority.external_root_path_cost,
        regional_root_id: pt.designated_priority.regional_root_id,
        port_id: pt.designated_priority.designated_port_id,
        times: MessageTimes::from_times(&times),
    });
    transmit(bridge, callbacks, port, &bpdu, timestamp);
}

fn tx_tcn(bridge: &mut BridgeState, callbacks: &mut dyn BridgeCallbacks, port: PortIndex, timestamp: u32) {
    transmit(bridge, callbacks, port, &Bpdu::tcn(), timestamp);
}

/// Sends an RST BPDU, or an MST BPDU carrying every MSTI when running MSTP.
fn tx_mstp(bridge: &mut BridgeState, callbacks: &mut dyn BridgeCallbacks, port: PortIndex, timestamp: u32) {
    let p = &bridge.ports[port];
    let cist = &p.trees[CIST_INDEX];

    let mut flags = BpduFlags::default();
    flags.set(BpduFlags::TOPOLOGY_CHANGE, cist.tc_while != 0);
    flags.set(BpduFlags::PROPOSAL, cist.proposing);
    flags.set_role(encode_role(cist.role));
    flags.set(BpduFlags::LEARNING, cist.learning);
    flags.set(BpduFlags::FORWARDING, cist.forwarding);
    flags.set(BpduFlags::AGREEMENT, cist.agree);

    let message = CistMessage {
        flags,
        root_id: cist.designated_priority.root_id,
        external_root_path_cost: cist.designated_priority.external_root_path_cost,
        regional_root_id: cist.designated_priority.regional_root_id,
        port_id: cist.designated_priority.designated_port_id,
        times: MessageTimes::from_times(&cist.designated_times),
    };

    let bpdu = if bridge.force_protocol_version < StpVersion::Mstp {
        Bpdu::rst(message)
    } else {
        let mstis = (1..p.trees.len())
            .map(|tree| {
                let pt = &p.trees[tree];
                let mut flags = BpduFlags::default();
                flags.set(BpduFlags::TOPOLOGY_CHANGE, pt.tc_while != 0);
                flags.set(BpduFlags::PROPOSAL, pt.proposing);
                flags.set_role(encode_role(pt.role));
                flags.set(BpduFlags::LEARNING, pt.learning);
                flags.set(BpduFlags::FORWARDING, pt.forwarding);
                flags.set(BpduFlags::AGREEMENT, pt.agree);
                flags.set(BpduFlags::ACK_OR_MASTER, bridge.msti_master_flag(port, tree));
                MstiMessage {
                    flags,
                    regional_root_id: pt.designated_priority.regional_root_id,
                    internal_root_path_cost: pt.designated_priority.internal_root_path_cost,
                    bridge_priority: (pt.designated_priority.designated_bridge_id.priority() >> 8) as u8,
                    port_priority: pt.port_id.priority(),
                    remaining_hops: pt.designated_times.remaining_hops,
                }
            })
            .collect();
        Bpdu::mst(
            message,
            MstExtension {
                config_id: bridge.mst_config_id,
                internal_root_path_cost: cist.designated_priority.internal_root_path_cost,
                bridge_id: cist.designated_priority.designated_bridge_id,
                remaining_hops: cist.designated_times.remaining_hops,
                mstis,
            },
        )
    };
    transmit(bridge, callbacks, port, &bpdu, timestamp);
}

impl StateMachine for PortTransmit {
    type State = State;
    type Target = OnPort;

    const NAME: &'static str = "PortTransmit";

    fn state(bridge: &BridgeState, OnPort(port): OnPort) -> State {
        bridge.ports[port].transmit_sm
    }

    fn set_state(bridge: &mut BridgeState, OnPort(port): OnPort, state: State) {
        bridge.ports[port].transmit_sm = state;
    }

    fn begin_state(_bridge: &BridgeState, _target: OnPort) -> State {
        State::TransmitInit
    }

    fn check_conditions(bridge: &BridgeState, OnPort(port): OnPort, state: State) -> Option<State> {
        let p = &bridge.ports[port];
        if !p.port_enabled {
            return (state != State::TransmitInit).then_some(State::TransmitInit);
        }

        match state {
            State::TransmitInit
            | State::TransmitPeriodic
            | State::TransmitConfig
            | State::TransmitTcn
            | State::TransmitRstp => Some(State::Idle),
            State::Idle => {
                if !bridge.all_transmit_ready(port) {
                    return None;
                }
                let can_send = p.tx_count < bridge.tx_hold_count && p.hello_when != 0;
                if p.hello_when == 0 {
                    Some(State::TransmitPeriodic)
                } else if !p.send_rstp && p.new_info && bridge.cist_designated_port(port) && can_send {
                    Some(State::TransmitConfig)
                } else if !p.send_rstp && p.new_info && bridge.cist_root_port(port) && can_send {
                    Some(State::TransmitTcn)
                } else if p.send_rstp
                    && (p.new_info || (p.new_info_msti && !bridge.msti_master_port(port)))
                    && can_send
                {
                    Some(State::TransmitRstp)
                } else {
                    None
                }
            }
        }
    }

    fn enter_state(
        bridge: &mut BridgeState,
        callbacks: &mut dyn BridgeCallbacks,
        OnPort(port): OnPort,
        state: State,
        timestamp: u32,
    ) {
        match state {
            State::TransmitInit => {
                let p = &mut bridge.ports[port];
                p.new_info = true;
                p.new_info_msti = true;
                p.tx_count = 0;
            }
            State::TransmitPeriodic => {
                let cist_tc = bridge.cist_root_port(port) && bridge.ports[port].trees[CIST_INDEX].tc_while != 0;
                let cist = bridge.cist_designated_port(port) || cist_tc;
                let msti = bridge.msti_designated_or_tc_propagating_root_port(port);
                let p = &mut bridge.ports[port];
                p.new_info = p.new_info || cist;
                p.new_info_msti = p.new_info_msti || msti;
            }
            State::TransmitConfig => {
                bridge.ports[port].new_info = false;
                tx_config(bridge, callbacks, port, timestamp);
                let p = &mut bridge.ports[port];
                p.tx_count += 1;
                p.tc_ack = false;
            }
            State::TransmitTcn => {
                bridge.ports[port].new_info = false;
                tx_tcn(bridge, callbacks, port, timestamp);
                bridge.ports[port].tx_count += 1;
            }
            State::TransmitRstp => {
                let p = &mut bridge.ports[port];
                p.new_info = false;
                p.new_info_msti = false;
                tx_mstp(bridge, callbacks, port, timestamp);
                let p = &mut bridge.ports[port];
                p.tx_count += 1;
                p.tc_ack = false;
            }
            State::Idle => bridge.ports[port].hello_when = bridge.hello_time(port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpdu::BpduKind;
    use crate::testing::{test_state, RecordingCallbacks};
    use pretty_assertions::assert_eq;

    fn ready(bridge: &mut BridgeState, role: PortRole) {
        for p in &mut bridge.ports {
            p.port_enabled = true;
            p.hello_when = 2;
            for pt in &mut p.trees {
                pt.selected = true;
                pt.role = role;
            }
        }
    }

    #[test]
    fn test_idle_waits_for_role_selection() {
        let mut bridge = test_state(1, 0);
        ready(&mut bridge, PortRole::Designated);
        bridge.ports[0].send_rstp = true;
        bridge.ports[0].new_info = true;
        bridge.ports[0].trees[0].updt_info = true;
        assert_eq!(PortTransmit::check_conditions(&bridge, OnPort(0), State::Idle), None);

        bridge.ports[0].trees[0].updt_info = false;
        assert_eq!(PortTransmit::check_conditions(&bridge, OnPort(0), State::Idle), Some(State::TransmitRstp));
    }

    #[test]
    fn test_hold_count_limits_transmission() {
        let mut bridge = test_state(1, 0);
        ready(&mut bridge, PortRole::Designated);
        bridge.ports[0].send_rstp = true;
        bridge.ports[0].new_info = true;
        bridge.ports[0].tx_count = bridge.tx_hold_count;
        assert_eq!(PortTransmit::check_conditions(&bridge, OnPort(0), State::Idle), None);

        bridge.ports[0].hello_when = 0;
        assert_eq!(
            PortTransmit::check_conditions(&bridge, OnPort(0), State::Idle),
            Some(State::TransmitPeriodic)
        );
    }

    #[test]
    fn test_transmit_mst_bpdu() {
        let mut bridge = test_state(1, 2);
        let mut callbacks = RecordingCallbacks::default();
        ready(&mut bridge, PortRole::Designated);
        bridge.ports[0].send_rstp = true;
        for tree in 0..3 {
            let designated = bridge.trees[tree].bridge_priority();
            bridge.ports[0].trees[tree].designated_priority = designated;
        }
        bridge.ports[0].trees[0].proposing = true;

        PortTransmit::enter_state(&mut bridge, &mut callbacks, OnPort(0), State::TransmitRstp, 0);

        let sent = callbacks.sent_on(0);
        assert_eq!(sent.len(), 1);
        let bpdu = &sent[0];
        assert_eq!(bpdu.kind, BpduKind::Mst);
        assert!(bpdu.cist.flags.contains(BpduFlags::PROPOSAL));
        assert_eq!(bpdu.cist.flags.role(), EncodedRole::Designated);
        let mst = bpdu.mst.as_ref().unwrap();
        assert_eq!(mst.config_id, bridge.mst_config_id);
        assert_eq!(mst.mstis.len(), 2);
        assert_eq!(mst.mstis[1].mstid(), 2);
        assert_eq!(mst.mstis[1].bridge_priority, 0x80);
        assert_eq!(bridge.ports[0].tx_count, 1);
        assert_eq!(bridge.ports[0].stats.bpdus_transmitted, 1);
        assert!(!bridge.ports[0].new_info);
    }

    #[test]
    fn test_transmit_config_bpdu_when_talking_stp() {
        let mut bridge = test_state(1, 0);
        let mut callbacks = RecordingCallbacks::default();
        ready(&mut bridge, PortRole::Designated);
        bridge.ports[0].new_info = true;
        bridge.ports[0].tc_ack = true;
        assert_eq!(PortTransmit::check_conditions(&bridge, OnPort(0), State::Idle), Some(State::TransmitConfig));

        PortTransmit::enter_state(&mut bridge, &mut callbacks, OnPort(0), State::TransmitConfig, 0);
        let sent = callbacks.sent_on(0);
        assert_eq!(sent[0].kind, BpduKind::Config);
        assert!(sent[0].cist.flags.contains(BpduFlags::ACK_OR_MASTER));
        assert!(!bridge.ports[0].tc_ack);
    }

    #[test]
    fn test_unreachable_port_counts_drop() {
        let mut bridge = test_state(1, 0);
        let mut callbacks = RecordingCallbacks::default();
        callbacks.unreachable.push(0);
        PortTransmit::enter_state(&mut bridge, &mut callbacks, OnPort(0), State::TransmitTcn, 0);
        assert!(callbacks.sent.is_empty());
        assert_eq!(bridge.ports[0].stats.transmit_dropped, 1);
        assert_eq!(bridge.ports[0].tx_count, 1);
    }
}
