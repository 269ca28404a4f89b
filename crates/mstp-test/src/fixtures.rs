//! Test fixtures for common topologies and configurations.

use mstp::{BridgeConfig, MacAddress, MstpResult, VlanAssignment, VlanId};

use crate::Network;

/// `02:00:00:00:00:<n>`. Lower `n` wins root elections at equal priority.
pub fn bridge_mac(n: u8) -> MacAddress {
    MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, n])
}

/// Bridges `0 -- 1`, joined on port 0 of each. Bridge 0 is the root.
pub fn two_bridges() -> MstpResult<Network> {
    let mut net = Network::new();
    let a = net.add_bridge(bridge_mac(1), 1, 0)?;
    let b = net.add_bridge(bridge_mac(2), 1, 0)?;
    net.connect((a, 0), (b, 0));
    Ok(net)
}

/// Three bridges in a ring, two ports each. Bridge 0 is the root.
///
/// ```text
///        0
///   p0 /   \ p1
///  p0 /     \ p0
///    1 ----- 2
///     p1   p1
/// ```
///
/// Link indices: 0 is `0-1`, 1 is `0-2`, 2 is `1-2`.
pub fn triangle() -> MstpResult<Network> {
    let mut net = Network::new();
    for n in 1..=3 {
        net.add_bridge(bridge_mac(n), 2, 0)?;
    }
    net.connect((0, 0), (1, 0));
    net.connect((0, 1), (2, 0));
    net.connect((1, 1), (2, 1));
    Ok(net)
}

/// `count` bridges in a line: port 1 of bridge `i` to port 0 of bridge
/// `i + 1`. Bridge 0 is the root.
pub fn chain(count: u8) -> MstpResult<Network> {
    let mut net = Network::new();
    for n in 1..=count {
        net.add_bridge(bridge_mac(n), 2, 0)?;
    }
    for i in 0..usize::from(count).saturating_sub(1) {
        net.connect((i, 1), (i + 1, 0));
    }
    Ok(net)
}

/// A started one-port bridge in region `name`, with one MSTI carrying
/// `vlans`.
pub fn region_member(n: u8, name: &str, vlans: &[u16]) -> BridgeConfig {
    let mut config = BridgeConfig {
        address: bridge_mac(n),
        port_count: 1,
        msti_count: 1,
        ..BridgeConfig::default()
    };
    config.mst.name = Some(name.to_string());
    config.mst.vlans = vlans
        .iter()
        .filter_map(|vlan| VlanId::new(*vlan).ok())
        .map(|vlan| VlanAssignment { vlan, tree: 1 })
        .collect();
    config
}
