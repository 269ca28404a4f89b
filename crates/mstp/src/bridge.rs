//! The public engine handle.
//!
//! A [`Bridge`] owns the protocol state of one bridge and the host's
//! callbacks. Every entry point runs the state machines to completion before
//! returning; the host serializes calls per bridge.

use tracing::{debug, info, instrument};

use mstp_types::{BridgeId, MacAddress, PortId, VlanId};

use crate::bpdu::{bpdu_from_frame, Bpdu};
use crate::callbacks::BridgeCallbacks;
use crate::config::{self, BridgeConfig, MstConfig, PortConfig, TimersConfig, TreePriority, VlanAssignment};
use crate::defaults;
use crate::digest::{encode_name, MstConfigId};
use crate::error::{MstpError, MstpResult};
use crate::priority_vector::{PriorityVector, Times, PRIORITY_VECTOR_LEN};
use crate::scheduler::{self, Event};
use crate::state::BridgeState;
use crate::types::{PortIndex, PortRole, PortStats, StpVersion, TreeIndex, CIST_INDEX};

/// What a successful configuration change requires of the machines.
enum Effect {
    /// Nothing beyond a run of the machines.
    Settle,
    /// Role selection on one tree, or on all of them.
    Reselect(Option<TreeIndex>),
    /// BEGIN on a running bridge.
    Restart,
}

pub struct Bridge<C: BridgeCallbacks> {
    state: BridgeState,
    callbacks: C,
}

impl<C: BridgeCallbacks> Bridge<C> {
    /// Creates a stopped bridge with `port_count` ports and `msti_count` MSTIs
    /// besides the CIST.
    pub fn new(port_count: usize, msti_count: usize, address: MacAddress, callbacks: C) -> MstpResult<Self> {
        config::validate_counts(port_count, msti_count)?;
        info!(port_count, msti_count, %address, "bridge created");
        Ok(Bridge {
            state: BridgeState::new(port_count, msti_count, address),
            callbacks,
        })
    }

    /// Builds a bridge from a validated configuration, started when the
    /// configuration says so.
    pub fn from_config(config: &BridgeConfig, callbacks: C) -> MstpResult<Self> {
        config.validate()?;
        let mut bridge = Self::new(config.port_count, config.msti_count, config.address, callbacks)?;
        let state = &mut bridge.state;

        state.force_protocol_version = config.protocol_version;
        state.debug_log = config.debug_log;
        state.bridge_times.hello_time = config.timers.hello_time;
        state.bridge_times.max_age = config.timers.max_age;
        state.bridge_times.forward_delay = config.timers.forward_delay;
        state.bridge_times.remaining_hops = config.timers.max_hops;
        state.tx_hold_count = config.timers.tx_hold_count;

        for entry in &config.bridge_priorities {
            let tree = &mut state.trees[entry.tree];
            tree.bridge_id = tree.bridge_id.with_priority(entry.priority);
            tree.root_priority = tree.bridge_priority();
        }

        for entry in &config.mst.vlans {
            state.vlan_table.assign(entry.vlan, entry.tree)?;
        }
        let name = match &config.mst.name {
            Some(name) => name.clone(),
            None => config.address.to_string(),
        };
        state.mst_config_id = MstConfigId::new(&name, config.mst.revision, &state.vlan_table)?;

        for entry in &config.ports {
            let port = &mut state.ports[entry.port];
            port.admin_edge = entry.admin_edge;
            port.auto_edge = entry.auto_edge;
            port.admin_external_path_cost = entry.external_path_cost;
        }

        if config.stp_enabled {
            bridge.start_bridge(0);
        }
        Ok(bridge)
    }

    /// The persistent configuration of this bridge.
    pub fn to_config(&self) -> BridgeConfig {
        let state = &self.state;
        let default_name = state.address.to_string();
        let name = state.mst_config_id.name_str();

        BridgeConfig {
            address: state.address,
            port_count: state.ports.len(),
            msti_count: self.msti_count(),
            stp_enabled: state.started,
            protocol_version: state.force_protocol_version,
            debug_log: state.debug_log,
            timers: TimersConfig {
                hello_time: state.bridge_times.hello_time,
                max_age: state.bridge_times.max_age,
                forward_delay: state.bridge_times.forward_delay,
                tx_hold_count: state.tx_hold_count,
                max_hops: state.bridge_times.remaining_hops,
            },
            bridge_priorities: state
                .trees
                .iter()
                .filter(|t| t.bridge_id.priority() != defaults::BRIDGE_PRIORITY)
                .map(|t| TreePriority {
                    tree: t.index,
                    priority: t.bridge_id.priority(),
                })
                .collect(),
            mst: MstConfig {
                name: (name != default_name).then_some(name),
                revision: state.mst_config_id.revision,
                vlans: state
                    .vlan_table
                    .assignments()
                    .map(|(vlan, tree)| VlanAssignment { vlan, tree })
                    .collect(),
            },
            ports: state
                .ports
                .iter()
                .enumerate()
                .filter(|(_, p)| p.admin_edge || !p.auto_edge || p.admin_external_path_cost != 0)
                .map(|(index, p)| PortConfig {
                    port: index,
                    admin_edge: p.admin_edge,
                    auto_edge: p.auto_edge,
                    external_path_cost: p.admin_external_path_cost,
                })
                .collect(),
        }
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut C {
        &mut self.callbacks
    }

    fn dispatch(&mut self, event: Event, timestamp: u32) {
        scheduler::dispatch(&mut self.state, &mut self.callbacks, event, timestamp);
    }

    fn check_port(&self, port: PortIndex) {
        assert!(
            port < self.state.ports.len(),
            "port index {port} out of range, bridge has {} ports",
            self.state.ports.len()
        );
    }

    fn check_tree(&self, tree: TreeIndex) {
        assert!(
            tree < self.state.trees.len(),
            "tree index {tree} out of range, bridge has {} trees",
            self.state.trees.len()
        );
    }

    // ---- lifecycle ----

    pub fn start_bridge(&mut self, timestamp: u32) {
        if self.state.started {
            return;
        }
        info!(timestamp, version = %self.state.force_protocol_version, "starting bridge");
        self.state.started = true;
        self.dispatch(Event::Begin, timestamp);
    }

    /// Forces every port to Discarding and leaves the engine inert.
    pub fn stop_bridge(&mut self, timestamp: u32) {
        if !self.state.started {
            return;
        }
        info!(timestamp, "stopping bridge");
        scheduler::reset_all(&mut self.state, &mut self.callbacks, timestamp);
        self.state.started = false;
    }

    pub fn is_bridge_started(&self) -> bool {
        self.state.started
    }

    // ---- events ----

    fn reject(&mut self, port: PortIndex, err: MstpError) -> MstpError {
        self.state.ports[port].stats.malformed_bpdus += 1;
        debug!(port, error = %err, "BPDU dropped");
        if self.state.debug_log {
            let text = format!("{err}\n");
            self.callbacks.debug_log(Some(port), None, &text, true);
        }
        err
    }

    /// Processes the BPDU octets (starting at the protocol identifier)
    /// received on `port`. Malformed BPDUs are counted and returned as
    /// errors without touching the protocol state.
    #[instrument(skip(self, bpdu), fields(len = bpdu.len()))]
    pub fn on_bpdu_received(&mut self, port: PortIndex, bpdu: &[u8], timestamp: u32) -> MstpResult<()> {
        self.check_port(port);
        if !self.state.started || !self.state.ports[port].port_enabled {
            debug!("BPDU ignored on inactive port");
            return Ok(());
        }

        let decoded = Bpdu::decode(bpdu).map_err(|err| self.reject(port, err))?;
        self.dispatch(
            Event::BpduReceived {
                port,
                bpdu: Box::new(decoded),
            },
            timestamp,
        );
        Ok(())
    }

    /// Like [`Self::on_bpdu_received`], for a whole 802.3 frame.
    pub fn on_frame_received(&mut self, port: PortIndex, frame: &[u8], timestamp: u32) -> MstpResult<()> {
        self.check_port(port);
        if !self.state.started || !self.state.ports[port].port_enabled {
            return Ok(());
        }
        let bpdu = bpdu_from_frame(frame).map_err(|err| self.reject(port, err))?;
        self.on_bpdu_received(port, bpdu, timestamp)
    }

    pub fn on_one_second_tick(&mut self, timestamp: u32) {
        if self.state.started {
            self.dispatch(Event::Tick, timestamp);
        }
    }

    pub fn on_port_enabled(&mut self, port: PortIndex, speed_mbps: u32, point_to_point: bool, timestamp: u32) {
        self.check_port(port);
        info!(port, speed_mbps, point_to_point, "port enabled");
        self.dispatch(
            Event::PortEnabled {
                port,
                speed_mbps,
                point_to_point,
            },
            timestamp,
        );
    }

    pub fn on_port_disabled(&mut self, port: PortIndex, timestamp: u32) {
        self.check_port(port);
        info!(port, "port disabled");
        self.dispatch(Event::PortDisabled { port }, timestamp);
    }

    // ---- configuration ----

    fn apply(&mut self, effect: Effect, timestamp: u32) {
        match effect {
            Effect::Restart if self.state.started => self.dispatch(Event::Begin, timestamp),
            Effect::Reselect(trees) => {
                let trees = match trees {
                    Some(tree) => tree..tree + 1,
                    None => 0..self.state.trees.len(),
                };
                for port in &mut self.state.ports {
                    for pt in &mut port.trees[trees.clone()] {
                        pt.reselect = true;
                        pt.selected = false;
                    }
                }
                self.dispatch(Event::ConfigChanged, timestamp);
            }
            Effect::Restart | Effect::Settle => self.dispatch(Event::ConfigChanged, timestamp),
        }
        self.callbacks.on_config_changed(timestamp);
    }

    pub fn set_bridge_address(&mut self, address: MacAddress, timestamp: u32) -> MstpResult<()> {
        if address.is_multicast() {
            return Err(MstpError::invalid_config("bridge_address", "must be a unicast address"));
        }
        let old = self.state.address;
        if old == address {
            return Ok(());
        }
        info!(%old, new = %address, "bridge address changed");
        self.state.address = address;
        for tree in &mut self.state.trees {
            tree.bridge_id = tree.bridge_id.with_address(address);
        }

        // A region name left at its default follows the address.
        let effect = if self.state.mst_config_id.name_str() == old.to_string() {
            self.state.mst_config_id.name = encode_name(&address.to_string())?;
            Effect::Restart
        } else {
            Effect::Reselect(None)
        };
        self.apply(effect, timestamp);
        Ok(())
    }

    pub fn set_bridge_priority(&mut self, tree: TreeIndex, priority: u16, timestamp: u32) -> MstpResult<()> {
        config::validate_tree(tree, self.msti_count())?;
        config::validate_bridge_priority(priority)?;
        let t = &mut self.state.trees[tree];
        t.bridge_id = t.bridge_id.with_priority(priority);
        info!(tree, priority, "bridge priority changed");
        self.apply(Effect::Reselect(Some(tree)), timestamp);
        Ok(())
    }

    pub fn set_stp_version(&mut self, version: StpVersion, timestamp: u32) -> MstpResult<()> {
        if self.state.force_protocol_version == version {
            return Ok(());
        }
        info!(from = %self.state.force_protocol_version, to = %version, "protocol version changed");
        self.state.force_protocol_version = version;
        self.apply(Effect::Restart, timestamp);
        Ok(())
    }

    pub fn set_bridge_times(
        &mut self,
        hello_time: u16,
        max_age: u16,
        forward_delay: u16,
        timestamp: u32,
    ) -> MstpResult<()> {
        config::validate_times(hello_time, max_age, forward_delay)?;
        let times = &mut self.state.bridge_times;
        times.hello_time = hello_time;
        times.max_age = max_age;
        times.forward_delay = forward_delay;
        self.apply(Effect::Reselect(None), timestamp);
        Ok(())
    }

    pub fn set_tx_hold_count(&mut self, count: u32, timestamp: u32) -> MstpResult<()> {
        config::validate_tx_hold_count(count)?;
        self.state.tx_hold_count = count;
        self.apply(Effect::Settle, timestamp);
        Ok(())
    }

    pub fn set_max_hops(&mut self, hops: u8, timestamp: u32) -> MstpResult<()> {
        config::validate_max_hops(hops)?;
        self.state.bridge_times.remaining_hops = hops;
        self.apply(Effect::Reselect(None), timestamp);
        Ok(())
    }

    pub fn set_port_admin_edge(&mut self, port: PortIndex, admin_edge: bool, timestamp: u32) -> MstpResult<()> {
        self.check_port(port);
        self.state.ports[port].admin_edge = admin_edge;
        self.apply(Effect::Settle, timestamp);
        Ok(())
    }

    pub fn set_port_auto_edge(&mut self, port: PortIndex, auto_edge: bool, timestamp: u32) -> MstpResult<()> {
        self.check_port(port);
        self.state.ports[port].auto_edge = auto_edge;
        self.apply(Effect::Settle, timestamp);
        Ok(())
    }

    /// 0 derives the cost from the link speed.
    pub fn set_port_external_path_cost(&mut self, port: PortIndex, cost: u32, timestamp: u32) -> MstpResult<()> {
        self.check_port(port);
        config::validate_path_cost(cost)?;
        self.state.ports[port].admin_external_path_cost = cost;
        self.apply(Effect::Reselect(Some(CIST_INDEX)), timestamp);
        Ok(())
    }

    /// 0 derives the cost from the link speed.
    pub fn set_port_internal_path_cost(
        &mut self,
        port: PortIndex,
        tree: TreeIndex,
        cost: u32,
        timestamp: u32,
    ) -> MstpResult<()> {
        self.check_port(port);
        self.check_tree(tree);
        config::validate_path_cost(cost)?;
        self.state.ports[port].trees[tree].admin_internal_path_cost = cost;
        self.apply(Effect::Reselect(Some(tree)), timestamp);
        Ok(())
    }

    pub fn set_port_priority(&mut self, port: PortIndex, tree: TreeIndex, priority: u8, timestamp: u32) -> MstpResult<()> {
        self.check_port(port);
        self.check_tree(tree);
        config::validate_port_priority(priority)?;
        let pt = &mut self.state.ports[port].trees[tree];
        pt.port_id = pt.port_id.with_priority(priority);
        self.apply(Effect::Reselect(Some(tree)), timestamp);
        Ok(())
    }

    pub fn set_mst_config_name(&mut self, name: &str, timestamp: u32) -> MstpResult<()> {
        config::validate_config_name(name)?;
        self.state.mst_config_id.name = encode_name(name)?;
        info!(name, "MST configuration name changed");
        self.apply(Effect::Restart, timestamp);
        Ok(())
    }

    pub fn set_mst_config_revision(&mut self, revision: u16, timestamp: u32) -> MstpResult<()> {
        self.state.mst_config_id.revision = revision;
        self.apply(Effect::Restart, timestamp);
        Ok(())
    }

    /// Maps `vlan` to `tree` and recomputes the configuration digest.
    pub fn set_vlan_tree(&mut self, vlan: VlanId, tree: TreeIndex, timestamp: u32) -> MstpResult<()> {
        config::validate_tree(tree, self.msti_count())?;
        self.state.vlan_table.assign(vlan, tree)?;
        self.state.mst_config_id.digest = self.state.vlan_table.digest();
        debug!(%vlan, tree, "VLAN assigned");
        self.apply(Effect::Restart, timestamp);
        Ok(())
    }

    /// Switches the state machine trace offered to `debug_log`.
    pub fn set_debug_log(&mut self, enabled: bool) {
        self.state.debug_log = enabled;
    }

    // ---- bridge queries ----

    pub fn bridge_address(&self) -> MacAddress {
        self.state.address
    }

    pub fn stp_version(&self) -> StpVersion {
        self.state.force_protocol_version
    }

    pub fn port_count(&self) -> usize {
        self.state.ports.len()
    }

    pub fn msti_count(&self) -> usize {
        self.state.trees.len() - 1
    }

    pub fn tree_count(&self) -> usize {
        self.state.trees.len()
    }

    pub fn tx_hold_count(&self) -> u32 {
        self.state.tx_hold_count
    }

    /// The CIST root is this bridge.
    pub fn is_root_bridge(&self) -> bool {
        let cist = &self.state.trees[CIST_INDEX];
        cist.root_priority.root_id == cist.bridge_id
    }

    pub fn is_regional_root_bridge(&self, tree: TreeIndex) -> bool {
        self.check_tree(tree);
        let t = &self.state.trees[tree];
        t.root_priority.regional_root_id == t.bridge_id
    }

    pub fn tree_index_from_vlan(&self, vlan: VlanId) -> TreeIndex {
        self.state.vlan_table.tree_of(vlan)
    }

    pub fn mst_config_id(&self) -> &MstConfigId {
        &self.state.mst_config_id
    }

    // ---- tree queries ----

    pub fn bridge_id(&self, tree: TreeIndex) -> BridgeId {
        self.check_tree(tree);
        self.state.trees[tree].bridge_id
    }

    pub fn bridge_priority(&self, tree: TreeIndex) -> u16 {
        self.bridge_id(tree).priority()
    }

    pub fn root_priority_vector(&self, tree: TreeIndex) -> [u8; PRIORITY_VECTOR_LEN] {
        self.check_tree(tree);
        self.state.trees[tree].root_priority.to_bytes()
    }

    pub fn root_priority(&self, tree: TreeIndex) -> PriorityVector {
        self.check_tree(tree);
        self.state.trees[tree].root_priority
    }

    pub fn root_port(&self, tree: TreeIndex) -> Option<PortIndex> {
        self.check_tree(tree);
        self.state.trees[tree].root_port
    }

    pub fn root_times(&self, tree: TreeIndex) -> Times {
        self.check_tree(tree);
        self.state.trees[tree].root_times
    }

    pub fn topology_change_count(&self, tree: TreeIndex) -> u32 {
        self.check_tree(tree);
        self.state.trees[tree].topology_change_count
    }

    pub fn last_topology_change(&self, tree: TreeIndex) -> Option<u32> {
        self.check_tree(tree);
        self.state.trees[tree].last_topology_change
    }

    pub fn topology_change_active(&self, tree: TreeIndex) -> bool {
        self.check_tree(tree);
        self.state.trees[tree].topology_change_active
    }

    // ---- port queries ----

    pub fn port_enabled(&self, port: PortIndex) -> bool {
        self.check_port(port);
        self.state.ports[port].port_enabled
    }

    pub fn admin_edge(&self, port: PortIndex) -> bool {
        self.check_port(port);
        self.state.ports[port].admin_edge
    }

    pub fn auto_edge(&self, port: PortIndex) -> bool {
        self.check_port(port);
        self.state.ports[port].auto_edge
    }

    pub fn oper_edge(&self, port: PortIndex) -> bool {
        self.check_port(port);
        self.state.ports[port].oper_edge
    }

    pub fn oper_point_to_point(&self, port: PortIndex) -> bool {
        self.check_port(port);
        self.state.ports[port].oper_point_to_point
    }

    /// The port is exchanging RST or MST BPDUs rather than Configuration BPDUs.
    pub fn port_send_rstp(&self, port: PortIndex) -> bool {
        self.check_port(port);
        self.state.ports[port].send_rstp
    }

    pub fn port_external_path_cost(&self, port: PortIndex) -> u32 {
        self.check_port(port);
        self.state.ports[port].external_path_cost()
    }

    pub fn port_internal_path_cost(&self, port: PortIndex, tree: TreeIndex) -> u32 {
        self.check_port(port);
        self.check_tree(tree);
        self.state.ports[port].internal_path_cost(tree)
    }

    pub fn port_stats(&self, port: PortIndex) -> PortStats {
        self.check_port(port);
        self.state.ports[port].stats
    }

    // ---- port-tree queries ----

    pub fn port_role(&self, port: PortIndex, tree: TreeIndex) -> PortRole {
        self.check_port(port);
        self.check_tree(tree);
        self.state.ports[port].trees[tree].role
    }

    pub fn port_learning(&self, port: PortIndex, tree: TreeIndex) -> bool {
        self.check_port(port);
        self.check_tree(tree);
        self.state.ports[port].trees[tree].learning
    }

    pub fn port_forwarding(&self, port: PortIndex, tree: TreeIndex) -> bool {
        self.check_port(port);
        self.check_tree(tree);
        self.state.ports[port].trees[tree].forwarding
    }

    pub fn port_id(&self, port: PortIndex, tree: TreeIndex) -> PortId {
        self.check_port(port);
        self.check_tree(tree);
        self.state.ports[port].trees[tree].port_id
    }

    pub fn port_priority(&self, port: PortIndex, tree: TreeIndex) -> u8 {
        self.port_id(port, tree).priority()
    }

    /// The priority vector recorded for the port, received or its own.
    pub fn port_priority_vector(&self, port: PortIndex, tree: TreeIndex) -> PriorityVector {
        self.check_port(port);
        self.check_tree(tree);
        self.state.ports[port].trees[tree].port_priority
    }

    pub fn port_designated_priority(&self, port: PortIndex, tree: TreeIndex) -> PriorityVector {
        self.check_port(port);
        self.check_tree(tree);
        self.state.ports[port].trees[tree].designated_priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpdu::encode_frame;
    use crate::testing::{mac, Call, RecordingCallbacks};
    use pretty_assertions::assert_eq;

    type TestBridge = Bridge<RecordingCallbacks>;

    fn bridge(last: u8, ports: usize) -> TestBridge {
        Bridge::new(ports, 0, mac(last), RecordingCallbacks::default()).unwrap()
    }

    /// Carries every BPDU sent on `a`'s port `pa` to `b`'s port `pb` and back
    /// until both sides fall silent.
    fn exchange(a: &mut TestBridge, pa: PortIndex, b: &mut TestBridge, pb: PortIndex, timestamp: u32) {
        for _ in 0..50 {
            let from_a: Vec<_> = a.callbacks_mut().sent.drain(..).collect();
            let from_b: Vec<_> = b.callbacks_mut().sent.drain(..).collect();
            if from_a.is_empty() && from_b.is_empty() {
                return;
            }
            for (_, bytes) in from_a.into_iter().filter(|(p, _)| *p == pa) {
                b.on_bpdu_received(pb, &bytes, timestamp).unwrap();
            }
            for (_, bytes) in from_b.into_iter().filter(|(p, _)| *p == pb) {
                a.on_bpdu_received(pa, &bytes, timestamp).unwrap();
            }
        }
    }

    fn connected_pair() -> (TestBridge, TestBridge) {
        let mut a = bridge(1, 1);
        let mut b = bridge(2, 1);
        a.start_bridge(0);
        b.start_bridge(0);
        a.on_port_enabled(0, 1000, true, 0);
        b.on_port_enabled(0, 1000, true, 0);
        exchange(&mut a, 0, &mut b, 0, 0);
        (a, b)
    }

    #[test]
    fn test_new_validates_counts() {
        assert!(Bridge::new(0, 0, mac(1), RecordingCallbacks::default()).is_err());
        assert!(Bridge::new(4096, 0, mac(1), RecordingCallbacks::default()).is_err());
        assert!(Bridge::new(2, 65, mac(1), RecordingCallbacks::default()).is_err());

        let b = Bridge::new(4, 3, mac(1), RecordingCallbacks::default()).unwrap();
        assert_eq!(b.port_count(), 4);
        assert_eq!(b.msti_count(), 3);
        assert_eq!(b.tree_count(), 4);
        assert_eq!(b.stp_version(), StpVersion::Mstp);
        assert_eq!(b.mst_config_id().name_str(), "02:00:00:00:00:01");
        assert!(!b.is_bridge_started());
    }

    #[test]
    fn test_start_discards_all_ports() {
        let mut b = bridge(1, 2);
        b.start_bridge(0);
        assert!(b.is_bridge_started());
        assert!(b.is_root_bridge());
        for port in 0..2 {
            assert!(b.callbacks().calls.contains(&Call::DisableForwarding(port, 0)));
            assert_eq!(b.port_role(port, 0), PortRole::Disabled);
            assert!(!b.port_forwarding(port, 0));
        }
    }

    #[test]
    fn test_single_bridge_edge_port_forwards() {
        let mut b = bridge(1, 1);
        b.set_port_admin_edge(0, true, 0).unwrap();
        b.start_bridge(0);
        b.on_port_enabled(0, 1000, true, 0);
        assert_eq!(b.port_role(0, 0), PortRole::Designated);
        assert!(b.oper_edge(0));
        assert!(b.port_forwarding(0, 0));
        assert!(!b.callbacks().sent_on(0).is_empty());
    }

    #[test]
    fn test_two_bridges_converge() {
        let (a, b) = connected_pair();

        assert!(a.is_root_bridge());
        assert!(!b.is_root_bridge());
        assert_eq!(a.port_role(0, 0), PortRole::Designated);
        assert_eq!(b.port_role(0, 0), PortRole::Root);
        assert!(a.port_forwarding(0, 0));
        assert!(b.port_forwarding(0, 0));
        assert_eq!(b.root_port(0), Some(0));
        assert_eq!(b.root_priority(0).root_id, a.bridge_id(0));
        assert_eq!(b.root_priority(0).external_root_path_cost, 20_000);
        assert_eq!(b.root_times(0).message_age, 1);
        assert!(b.callbacks().calls.contains(&Call::RoleChanged(0, 0, PortRole::Root)));
    }

    #[test]
    fn test_repeated_bpdu_is_idempotent() {
        let (mut a, mut b) = connected_pair();
        a.on_one_second_tick(1);
        a.on_one_second_tick(2);
        let (_, bpdu) = a.callbacks().sent.last().cloned().unwrap();

        b.on_bpdu_received(0, &bpdu, 3).unwrap();
        let root = b.root_priority(0);
        let port_priority = b.port_priority_vector(0, 0);
        let sent = b.callbacks().sent.len();

        b.on_bpdu_received(0, &bpdu, 3).unwrap();
        assert_eq!(b.root_priority(0), root);
        assert_eq!(b.port_priority_vector(0, 0), port_priority);
        assert_eq!(b.port_role(0, 0), PortRole::Root);
        assert!(b.port_forwarding(0, 0));
        assert_eq!(b.callbacks().sent.len(), sent);
    }

    #[test]
    fn test_repeated_mst_bpdu_with_foreign_timers_is_not_superior() {
        let mut a = Bridge::new(1, 1, mac(1), RecordingCallbacks::default()).unwrap();
        let mut b = Bridge::new(1, 1, mac(2), RecordingCallbacks::default()).unwrap();
        for bridge in [&mut a, &mut b] {
            bridge.set_mst_config_name("lab", 0).unwrap();
            bridge.start_bridge(0);
            bridge.on_port_enabled(0, 1000, true, 0);
        }
        a.set_bridge_times(2, 30, 20, 0).unwrap();
        exchange(&mut a, 0, &mut b, 0, 0);
        assert_eq!(b.port_role(0, 1), PortRole::Root);
        assert_eq!(b.root_times(0).max_age, 30);

        a.on_one_second_tick(1);
        a.on_one_second_tick(2);
        let (_, bpdu) = a.callbacks().sent.last().cloned().unwrap();
        b.on_bpdu_received(0, &bpdu, 3).unwrap();

        b.set_debug_log(true);
        b.callbacks_mut().log.clear();
        let sent = b.callbacks().sent.len();
        b.on_bpdu_received(0, &bpdu, 3).unwrap();

        assert!(b.callbacks().log.contains("PortInformation: RepeatedDesignated"));
        assert!(!b.callbacks().log.contains("SuperiorDesignated"));
        assert_eq!(b.port_role(0, 1), PortRole::Root);
        assert!(b.port_forwarding(0, 1));
        assert_eq!(b.callbacks().sent.len(), sent);
    }

    #[test]
    fn test_malformed_bpdu_is_dropped() {
        let (_, mut b) = connected_pair();
        let calls = b.callbacks().calls.len();
        let role = b.port_role(0, 0);

        let err = b.on_bpdu_received(0, &[0x00, 0x00, 0x02, 0x02, 0x3c], 5).unwrap_err();
        assert!(matches!(err, MstpError::MalformedBpdu { .. }));
        assert_eq!(b.port_stats(0).malformed_bpdus, 1);
        assert_eq!(b.callbacks().calls.len(), calls);
        assert_eq!(b.port_role(0, 0), role);
        assert!(b.callbacks().log.contains("Malformed BPDU"));
    }

    #[test]
    fn test_frame_with_wrong_destination_is_malformed() {
        let (_, mut b) = connected_pair();
        let mut frame = encode_frame(mac(1), &Bpdu::tcn().to_vec().unwrap());
        frame[0] = 0x00;
        assert!(b.on_frame_received(0, &frame, 0).is_err());
        assert_eq!(b.port_stats(0).malformed_bpdus, 1);
    }

    #[test]
    fn test_port_disable_reverts_to_root_bridge() {
        let (_, mut b) = connected_pair();
        b.on_port_disabled(0, 10);
        assert!(b.is_root_bridge());
        assert_eq!(b.port_role(0, 0), PortRole::Disabled);
        assert!(!b.port_forwarding(0, 0));
    }

    #[test]
    fn test_received_information_ages_out() {
        let (_, mut b) = connected_pair();
        for t in 1..=10 {
            b.on_one_second_tick(t);
        }
        assert!(b.is_root_bridge());
        assert_eq!(b.port_role(0, 0), PortRole::Designated);
    }

    #[test]
    fn test_setters_validate_and_notify() {
        let mut b = bridge(1, 2);
        assert!(b.set_bridge_priority(0, 100, 0).is_err());
        assert!(b.set_bridge_priority(1, 4096, 0).is_err());
        assert!(b.set_bridge_times(2, 40, 15, 0).is_err());
        assert!(b.set_tx_hold_count(11, 0).is_err());
        assert!(b.set_max_hops(5, 0).is_err());
        assert!(b.set_port_priority(0, 0, 8, 0).is_err());
        assert!(b.set_port_external_path_cost(0, 200_000_001, 0).is_err());
        assert!(b.set_mst_config_name(&"x".repeat(33), 0).is_err());
        assert!(b.set_bridge_address(MacAddress::BRIDGE_GROUP, 0).is_err());
        assert_eq!(b.callbacks().count(&Call::ConfigChanged), 0);

        b.set_bridge_priority(0, 4096, 0).unwrap();
        b.set_port_priority(1, 0, 0x20, 0).unwrap();
        b.set_tx_hold_count(3, 0).unwrap();
        assert_eq!(b.bridge_priority(0), 4096);
        assert_eq!(b.port_priority(1, 0), 0x20);
        assert_eq!(b.tx_hold_count(), 3);
        assert_eq!(b.callbacks().count(&Call::ConfigChanged), 3);
    }

    #[test]
    fn test_priority_change_moves_root() {
        let (mut a, mut b) = connected_pair();
        b.set_bridge_priority(0, 4096, 1).unwrap();
        exchange(&mut a, 0, &mut b, 0, 1);
        assert!(b.is_root_bridge());
        assert!(!a.is_root_bridge());
        assert_eq!(a.port_role(0, 0), PortRole::Root);
        assert_eq!(b.port_role(0, 0), PortRole::Designated);
    }

    #[test]
    fn test_bridge_address_change_follows_default_region_name() {
        let mut b = bridge(1, 1);
        b.set_bridge_address(mac(9), 0).unwrap();
        assert_eq!(b.mst_config_id().name_str(), "02:00:00:00:00:09");
        assert_eq!(b.bridge_id(0).address(), mac(9));

        b.set_mst_config_name("region", 0).unwrap();
        b.set_bridge_address(mac(7), 0).unwrap();
        assert_eq!(b.mst_config_id().name_str(), "region");
    }

    #[test]
    fn test_vlan_assignment_changes_digest() {
        let mut b = Bridge::new(1, 2, mac(1), RecordingCallbacks::default()).unwrap();
        let before = b.mst_config_id().digest;
        let vlan = VlanId::new(100).unwrap();
        b.set_vlan_tree(vlan, 2, 0).unwrap();
        assert_ne!(b.mst_config_id().digest, before);
        assert_eq!(b.tree_index_from_vlan(vlan), 2);
        assert!(b.set_vlan_tree(vlan, 3, 0).is_err());
    }

    #[test]
    fn test_stop_bridge_ignores_events() {
        let (_, mut b) = connected_pair();
        b.stop_bridge(5);
        assert!(!b.is_bridge_started());
        assert!(!b.port_forwarding(0, 0));

        let received = b.port_stats(0).bpdus_received;
        b.on_bpdu_received(0, &Bpdu::tcn().to_vec().unwrap(), 6).unwrap();
        assert_eq!(b.port_stats(0).bpdus_received, received);
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = BridgeConfig {
            port_count: 3,
            msti_count: 1,
            ..BridgeConfig::default()
        };
        config.mst.name = Some("lab".to_string());
        config.mst.vlans.push(VlanAssignment {
            vlan: VlanId::new(10).unwrap(),
            tree: 1,
        });
        config.bridge_priorities.push(TreePriority { tree: 1, priority: 8192 });
        config.ports.push(PortConfig {
            port: 2,
            admin_edge: true,
            auto_edge: false,
            external_path_cost: 500,
        });

        let b = Bridge::from_config(&config, RecordingCallbacks::default()).unwrap();
        assert!(b.is_bridge_started());
        assert!(b.admin_edge(2));
        assert_eq!(b.port_external_path_cost(2), 500);
        assert_eq!(b.bridge_priority(1), 8192);
        assert_eq!(b.to_config(), config);
    }

    #[test]
    #[should_panic(expected = "port index 5 out of range")]
    fn test_out_of_range_port_panics() {
        let b = bridge(1, 2);
        let _ = b.port_role(5, 0);
    }
}
