//! A simulated bridged LAN.
//!
//! Bridges are joined by point-to-point links. Everything a bridge transmits
//! is framed, queued on its callbacks and delivered to the peer of the link
//! the port belongs to. Time advances only through [`Network::run_for`].

use mstp::{
    encode_frame, Bridge, BridgeCallbacks, BridgeConfig, FlushFdbType, MacAddress,
    MstpResult, PortIndex, PortRole, TreeIndex,
};
use tracing::{debug, warn};

pub const LINK_SPEED_MBPS: u32 = 1000;

/// Bound on delivery rounds per step; a settled network needs a handful.
const MAX_DELIVERY_ROUNDS: usize = 1000;

/// Side effects a bridge reported through its callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    Learning { port: PortIndex, tree: TreeIndex, enabled: bool },
    Forwarding { port: PortIndex, tree: TreeIndex, enabled: bool },
    Flush { port: PortIndex, tree: TreeIndex, flush_type: FlushFdbType },
    TopologyChange { tree: TreeIndex },
    NotifiedTopologyChange { port: PortIndex, tree: TreeIndex },
    RoleChanged { port: PortIndex, tree: TreeIndex, role: PortRole },
}

/// Host side of one simulated bridge.
#[derive(Debug)]
pub struct HarnessCallbacks {
    address: MacAddress,
    buffer: Vec<u8>,
    /// Framed BPDUs waiting for delivery, by egress port.
    outbox: Vec<(PortIndex, Vec<u8>)>,
    pub events: Vec<NetworkEvent>,
    pub frames_sent: usize,
}

impl HarnessCallbacks {
    pub fn new(address: MacAddress) -> Self {
        HarnessCallbacks {
            address,
            buffer: Vec::new(),
            outbox: Vec::new(),
            events: Vec::new(),
            frames_sent: 0,
        }
    }

    pub fn take_outbox(&mut self) -> Vec<(PortIndex, Vec<u8>)> {
        std::mem::take(&mut self.outbox)
    }

    pub fn count(&self, matches: impl Fn(&NetworkEvent) -> bool) -> usize {
        self.events.iter().filter(|e| matches(e)).count()
    }
}

impl BridgeCallbacks for HarnessCallbacks {
    fn enable_learning(&mut self, port: PortIndex, tree: TreeIndex, _timestamp: u32) {
        self.events.push(NetworkEvent::Learning { port, tree, enabled: true });
    }

    fn disable_learning(&mut self, port: PortIndex, tree: TreeIndex, _timestamp: u32) {
        self.events.push(NetworkEvent::Learning { port, tree, enabled: false });
    }

    fn enable_forwarding(&mut self, port: PortIndex, tree: TreeIndex, _timestamp: u32) {
        self.events.push(NetworkEvent::Forwarding { port, tree, enabled: true });
    }

    fn disable_forwarding(&mut self, port: PortIndex, tree: TreeIndex, _timestamp: u32) {
        self.events.push(NetworkEvent::Forwarding { port, tree, enabled: false });
    }

    fn transmit_get_buffer(&mut self, _port: PortIndex, size: usize, _timestamp: u32) -> Option<&mut [u8]> {
        self.buffer.clear();
        self.buffer.resize(size, 0);
        Some(self.buffer.as_mut_slice())
    }

    fn transmit_release_buffer(&mut self, port: PortIndex) {
        let frame = encode_frame(self.address, &self.buffer);
        self.outbox.push((port, frame));
        self.frames_sent += 1;
    }

    fn flush_fdb(&mut self, port: PortIndex, tree: TreeIndex, flush_type: FlushFdbType, _timestamp: u32) {
        self.events.push(NetworkEvent::Flush { port, tree, flush_type });
    }

    fn on_topology_change(&mut self, tree: TreeIndex, _timestamp: u32) {
        self.events.push(NetworkEvent::TopologyChange { tree });
    }

    fn on_notified_topology_change(&mut self, port: PortIndex, tree: TreeIndex, _timestamp: u32) {
        self.events.push(NetworkEvent::NotifiedTopologyChange { port, tree });
    }

    fn on_port_role_changed(&mut self, port: PortIndex, tree: TreeIndex, role: PortRole, _timestamp: u32) {
        self.events.push(NetworkEvent::RoleChanged { port, tree, role });
    }
}

/// A point-to-point link between two bridge ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub a: (usize, PortIndex),
    pub b: (usize, PortIndex),
    pub up: bool,
}

impl Link {
    fn peer_of(&self, end: (usize, PortIndex)) -> Option<(usize, PortIndex)> {
        if !self.up {
            None
        } else if self.a == end {
            Some(self.b)
        } else if self.b == end {
            Some(self.a)
        } else {
            None
        }
    }
}

#[derive(Default)]
pub struct Network {
    pub bridges: Vec<Bridge<HarnessCallbacks>>,
    pub links: Vec<Link>,
    now: u32,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u32 {
        self.now
    }

    /// Adds a started bridge and returns its index.
    pub fn add_bridge(&mut self, address: MacAddress, port_count: usize, msti_count: usize) -> MstpResult<usize> {
        let mut bridge = Bridge::new(port_count, msti_count, address, HarnessCallbacks::new(address))?;
        bridge.start_bridge(self.now);
        self.bridges.push(bridge);
        Ok(self.bridges.len() - 1)
    }

    /// Adds a bridge built from `config`; it starts when the configuration
    /// enables the protocol.
    pub fn add_configured_bridge(&mut self, config: &BridgeConfig) -> MstpResult<usize> {
        let bridge = Bridge::from_config(config, HarnessCallbacks::new(config.address))?;
        self.bridges.push(bridge);
        Ok(self.bridges.len() - 1)
    }

    pub fn bridge(&self, index: usize) -> &Bridge<HarnessCallbacks> {
        &self.bridges[index]
    }

    pub fn bridge_mut(&mut self, index: usize) -> &mut Bridge<HarnessCallbacks> {
        &mut self.bridges[index]
    }

    /// Joins two ports, brings both up and delivers what they send.
    pub fn connect(&mut self, a: (usize, PortIndex), b: (usize, PortIndex)) -> usize {
        self.links.push(Link { a, b, up: true });
        let now = self.now;
        for (bridge, port) in [a, b] {
            self.bridges[bridge].on_port_enabled(port, LINK_SPEED_MBPS, true, now);
        }
        self.deliver();
        self.links.len() - 1
    }

    /// Takes a link down; both ends see the port disabled.
    pub fn disconnect(&mut self, link: usize) {
        let Link { a, b, .. } = self.links[link];
        self.links[link].up = false;
        let now = self.now;
        debug!(?a, ?b, "link down");
        for (bridge, port) in [a, b] {
            self.bridges[bridge].on_port_disabled(port, now);
        }
        self.deliver();
    }

    pub fn reconnect(&mut self, link: usize) {
        let Link { a, b, .. } = self.links[link];
        self.links[link].up = true;
        let now = self.now;
        for (bridge, port) in [a, b] {
            self.bridges[bridge].on_port_enabled(port, LINK_SPEED_MBPS, true, now);
        }
        self.deliver();
    }

    fn peer_of(&self, end: (usize, PortIndex)) -> Option<(usize, PortIndex)> {
        self.links.iter().find_map(|link| link.peer_of(end))
    }

    /// Delivers queued frames until no bridge has anything left to send.
    /// Frames on ports without an up link are lost.
    pub fn deliver(&mut self) {
        let now = self.now;
        for _ in 0..MAX_DELIVERY_ROUNDS {
            let mut in_flight = Vec::new();
            for (index, bridge) in self.bridges.iter_mut().enumerate() {
                for (port, frame) in bridge.callbacks_mut().take_outbox() {
                    in_flight.push(((index, port), frame));
                }
            }
            if in_flight.is_empty() {
                return;
            }
            for (from, frame) in in_flight {
                let Some((bridge, port)) = self.peer_of(from) else {
                    continue;
                };
                if let Err(err) = self.bridges[bridge].on_frame_received(port, &frame, now) {
                    warn!(bridge, port, error = %err, "frame rejected");
                }
            }
        }
        warn!(rounds = MAX_DELIVERY_ROUNDS, "network did not fall silent");
    }

    /// Advances time one second at a time, delivering after every tick.
    pub fn run_for(&mut self, seconds: u32) {
        for _ in 0..seconds {
            self.now += 1;
            let now = self.now;
            for bridge in &mut self.bridges {
                bridge.on_one_second_tick(now);
            }
            self.deliver();
        }
    }

    /// Hands `frame` to a bridge port as if it came off the wire.
    pub fn inject(&mut self, bridge: usize, port: PortIndex, frame: &[u8]) -> MstpResult<()> {
        let now = self.now;
        self.bridges[bridge].on_frame_received(port, frame, now)
    }
}
