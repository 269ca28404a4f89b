//! Port Role Transitions: moves each port-tree towards its selected role,
//! running the proposal/agreement handshake and the learn/forward timers.

use tracing::info;

use crate::callbacks::BridgeCallbacks;
use crate::port::{Port, PortTree};
use crate::scheduler::{OnPortTree, StateMachine};
use crate::state::BridgeState;
use crate::types::{PortRole, CIST_INDEX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    InitPort,
    DisablePort,
    DisabledPort,

    RootPort,
    RootProposed,
    RootAgreed,
    Reroot,
    RootForward,
    RootLearn,
    Rerooted,

    DesignatedPort,
    DesignatedPropose,
    DesignatedAgreed,
    DesignatedSynced,
    DesignatedRetired,
    DesignatedDiscard,
    DesignatedLearn,
    DesignatedForward,

    MasterPort,
    MasterProposed,
    MasterAgreed,
    MasterSynced,
    MasterRetired,
    MasterDiscard,
    MasterLearn,
    MasterForward,

    BlockPort,
    AlternatePort,
    AlternateProposed,
    AlternateAgreed,
    BackupPort,
}

pub(crate) struct PortRoleTransitions;

/// The Synced, Retired and Discard exits shared by Designated and Master ports.
fn sync_or_discard(p: &Port, pt: &PortTree, synced: State, retired: State, discard: State) -> Option<State> {
    if (!pt.learning && !pt.forwarding && !pt.synced)
        || (pt.agreed && !pt.synced)
        || (p.oper_edge && !pt.synced)
        || (pt.sync && pt.synced)
    {
        Some(synced)
    } else if pt.rr_while == 0 && pt.re_root {
        Some(retired)
    } else if ((pt.sync && !pt.synced) || (pt.re_root && pt.rr_while != 0) || pt.disputed)
        && !p.oper_edge
        && (pt.learn || pt.forward)
    {
        Some(discard)
    } else {
        None
    }
}

impl StateMachine for PortRoleTransitions {
    type State = State;
    type Target = OnPortTree;

    const NAME: &'static str = "PortRoleTransitions";

    fn state(bridge: &BridgeState, OnPortTree(port, tree): OnPortTree) -> State {
        bridge.ports[port].trees[tree].role_transitions_sm
    }

    fn set_state(bridge: &mut BridgeState, OnPortTree(port, tree): OnPortTree, state: State) {
        bridge.ports[port].trees[tree].role_transitions_sm = state;
    }

    fn begin_state(_bridge: &BridgeState, _target: OnPortTree) -> State {
        State::InitPort
    }

    fn check_conditions(bridge: &BridgeState, OnPortTree(port, tree): OnPortTree, state: State) -> Option<State> {
        use State::*;

        let p = &bridge.ports[port];
        let pt = &p.trees[tree];

        match state {
            InitPort => return Some(DisablePort),
            RootProposed | RootAgreed | Reroot | RootForward | RootLearn | Rerooted => return Some(RootPort),
            DesignatedPropose | DesignatedAgreed | DesignatedSynced | DesignatedRetired | DesignatedDiscard
            | DesignatedLearn | DesignatedForward => return Some(DesignatedPort),
            MasterProposed | MasterAgreed | MasterSynced | MasterRetired | MasterDiscard | MasterLearn
            | MasterForward => return Some(MasterPort),
            AlternateProposed | AlternateAgreed | BackupPort => return Some(AlternatePort),
            _ => {}
        }

        // Everything below waits for role selection to settle.
        if !pt.selected || pt.updt_info {
            return None;
        }

        if pt.role != pt.selected_role {
            return Some(match pt.selected_role {
                PortRole::Disabled => DisablePort,
                PortRole::Root => RootPort,
                PortRole::Designated => DesignatedPort,
                PortRole::Master => MasterPort,
                PortRole::Alternate | PortRole::Backup => BlockPort,
            });
        }

        let all_synced = || bridge.all_synced(port, tree);
        let fwd_delay = bridge.fwd_delay(port);
        let forward_delay = bridge.forward_delay(port);

        match state {
            DisablePort => (!pt.learning && !pt.forwarding).then_some(DisabledPort),
            DisabledPort => (pt.fd_while != bridge.max_age(port) || pt.sync || pt.re_root || !pt.synced)
                .then_some(DisabledPort),

            RootPort => {
                let timed = pt.fd_while == 0
                    || (bridge.re_rooted(port, tree) && pt.rb_while == 0 && bridge.rstp_version());
                if pt.proposed && !pt.agree {
                    Some(RootProposed)
                } else if (all_synced() && !pt.agree) || (pt.proposed && pt.agree) {
                    Some(RootAgreed)
                } else if !pt.forward && !pt.re_root {
                    Some(Reroot)
                } else if pt.re_root && pt.forward {
                    Some(Rerooted)
                } else if timed && !pt.learn {
                    Some(RootLearn)
                } else if timed && pt.learn && !pt.forward {
                    Some(RootForward)
                } else if pt.rr_while != fwd_delay {
                    Some(RootPort)
                } else {
                    None
                }
            }

            DesignatedPort => {
                let timed = (pt.fd_while == 0 || pt.agreed || p.oper_edge)
                    && (pt.rr_while == 0 || !pt.re_root)
                    && !pt.sync;
                if !pt.forward && !pt.agreed && !pt.proposing && !p.oper_edge {
                    Some(DesignatedPropose)
                } else if all_synced() && (pt.proposed || !pt.agree) {
                    Some(DesignatedAgreed)
                } else if let Some(next) =
                    sync_or_discard(p, pt, DesignatedSynced, DesignatedRetired, DesignatedDiscard)
                {
                    Some(next)
                } else if timed && !pt.learn {
                    Some(DesignatedLearn)
                } else if timed && pt.learn && !pt.forward {
                    Some(DesignatedForward)
                } else {
                    None
                }
            }

            MasterPort => {
                let timed = pt.fd_while == 0 || all_synced();
                if pt.proposed && !pt.agree {
                    Some(MasterProposed)
                } else if (all_synced() && !pt.agree) || (pt.proposed && pt.agree) {
                    Some(MasterAgreed)
                } else if let Some(next) = sync_or_discard(p, pt, MasterSynced, MasterRetired, MasterDiscard) {
                    Some(next)
                } else if timed && !pt.learn {
                    Some(MasterLearn)
                } else if timed && pt.learn && !pt.forward {
                    Some(MasterForward)
                } else {
                    None
                }
            }

            BlockPort => (!pt.learning && !pt.forwarding).then_some(AlternatePort),
            AlternatePort => {
                let hello = bridge.hello_time(port);
                if pt.proposed && !pt.agree {
                    Some(AlternateProposed)
                } else if (all_synced() && !pt.agree) || (pt.proposed && pt.agree) {
                    Some(AlternateAgreed)
                } else if pt.rb_while != 2 * hello && pt.role == PortRole::Backup {
                    Some(BackupPort)
                } else if pt.fd_while != forward_delay || pt.sync || pt.re_root || !pt.synced {
                    Some(AlternatePort)
                } else {
                    None
                }
            }

            _ => None,
        }
    }

    fn enter_state(
        bridge: &mut BridgeState,
        callbacks: &mut dyn BridgeCallbacks,
        OnPortTree(port, tree): OnPortTree,
        state: State,
        timestamp: u32,
    ) {
        use State::*;

        let fwd_delay = bridge.fwd_delay(port);
        let forward_delay = bridge.forward_delay(port);
        let max_age = bridge.max_age(port);
        let hello = bridge.hello_time(port);
        let edge_delay = bridge.edge_delay(port);
        let send_rstp = bridge.ports[port].send_rstp;
        let old_role = bridge.ports[port].trees[tree].role;

        match state {
            InitPort => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.role = PortRole::Disabled;
                pt.learn = false;
                pt.forward = false;
                pt.synced = false;
                pt.sync = true;
                pt.re_root = true;
                pt.rr_while = fwd_delay;
                pt.fd_while = max_age;
                pt.rb_while = 0;
            }
            DisablePort | BlockPort => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.role = pt.selected_role;
                pt.learn = false;
                pt.forward = false;
            }
            DisabledPort => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.fd_while = max_age;
                pt.synced = true;
                pt.rr_while = 0;
                pt.sync = false;
                pt.re_root = false;
            }

            RootPort => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.role = PortRole::Root;
                pt.rr_while = fwd_delay;
            }
            RootProposed | MasterProposed | AlternateProposed => {
                bridge.set_sync_tree(tree);
                bridge.ports[port].trees[tree].proposed = false;
            }
            RootAgreed | DesignatedAgreed | MasterAgreed => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.proposed = false;
                pt.sync = false;
                pt.agree = true;
                if state != MasterAgreed {
                    bridge.set_new_info_xst(port, tree);
                }
            }
            Reroot => bridge.set_re_root_tree(tree),
            RootForward => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.fd_while = 0;
                pt.forward = true;
            }
            RootLearn | DesignatedLearn | MasterLearn => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.fd_while = forward_delay;
                pt.learn = true;
            }
            Rerooted | DesignatedRetired | MasterRetired => bridge.ports[port].trees[tree].re_root = false,

            DesignatedPort => bridge.ports[port].trees[tree].role = PortRole::Designated,
            DesignatedPropose => {
                bridge.ports[port].trees[tree].proposing = true;
                if tree == CIST_INDEX {
                    bridge.ports[port].edge_delay_while = edge_delay;
                }
                bridge.set_new_info_xst(port, tree);
            }
            DesignatedSynced | MasterSynced => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.rr_while = 0;
                pt.synced = true;
                pt.sync = false;
            }
            DesignatedDiscard | MasterDiscard => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.learn = false;
                pt.forward = false;
                pt.disputed = false;
                pt.fd_while = forward_delay;
            }
            DesignatedForward => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.forward = true;
                pt.fd_while = 0;
                pt.agreed = send_rstp;
            }

            MasterPort => bridge.ports[port].trees[tree].role = PortRole::Master,
            MasterForward => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.forward = true;
                pt.fd_while = 0;
                pt.agreed = send_rstp;
            }

            AlternatePort => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.fd_while = forward_delay;
                pt.synced = true;
                pt.rr_while = 0;
                pt.sync = false;
                pt.re_root = false;
            }
            AlternateAgreed => {
                let pt = &mut bridge.ports[port].trees[tree];
                pt.proposed = false;
                pt.agree = true;
                bridge.set_new_info_xst(port, tree);
            }
            BackupPort => bridge.ports[port].trees[tree].rb_while = 2 * hello,
        }

        let role = bridge.ports[port].trees[tree].role;
        if role != old_role {
            info!(port, tree, from = %old_role, to = %role, "port role changed");
            callbacks.on_port_role_changed(port, tree, role, timestamp);
        }
    }
}
