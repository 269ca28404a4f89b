//! MST regions: MSTI roles inside a region and at its boundary.

use mstp::{PortRole, TreePriority, VlanId, CIST_INDEX};
use mstp_test::{assert_converged, assert_port, fixtures, init_test_logging, Network};
use pretty_assertions::assert_eq;

const MSTI: usize = 1;

fn connect_configs(a: mstp::BridgeConfig, b: mstp::BridgeConfig) -> Network {
    let mut net = Network::new();
    let a = net.add_configured_bridge(&a).unwrap();
    let b = net.add_configured_bridge(&b).unwrap();
    net.connect((a, 0), (b, 0));
    net.run_for(40);
    net
}

/// Scenario:
/// 1. Two bridges share a region name and VLAN map
/// 2. Bridge 1 has the better MSTI priority
/// 3. The MSTI roots at bridge 1 while the CIST roots at bridge 0
#[test]
fn test_msti_root_follows_msti_priority_inside_region() {
    init_test_logging("warn");
    let a = fixtures::region_member(1, "lab", &[10, 20]);
    let mut b = fixtures::region_member(2, "lab", &[10, 20]);
    b.bridge_priorities.push(TreePriority {
        tree: MSTI,
        priority: 4096,
    });
    let net = connect_configs(a, b);

    assert_eq!(net.bridge(0).mst_config_id(), net.bridge(1).mst_config_id());
    assert_eq!(assert_converged(&net), Ok(0));
    assert_eq!(net.bridge(1).tree_index_from_vlan(VlanId::new(20).unwrap()), MSTI);

    assert!(net.bridge(1).is_regional_root_bridge(MSTI));
    assert!(!net.bridge(0).is_regional_root_bridge(MSTI));
    assert_port(&net, 0, 0, MSTI, PortRole::Root, true).unwrap();
    assert_port(&net, 1, 0, MSTI, PortRole::Designated, true).unwrap();
    assert_eq!(net.bridge(0).root_port(MSTI), Some(0));

    // Inside a region the CIST accrues internal cost only.
    let cist_root = net.bridge(1).root_priority(CIST_INDEX);
    assert_eq!(cist_root.external_root_path_cost, 0);
    assert_eq!(cist_root.internal_root_path_cost, 20_000);
    assert!(!net.bridge(1).is_regional_root_bridge(CIST_INDEX));
}

#[test]
fn test_region_boundary_makes_master_port() {
    init_test_logging("warn");
    let a = fixtures::region_member(1, "east", &[10]);
    let b = fixtures::region_member(2, "west", &[10]);
    let net = connect_configs(a, b);

    assert_ne!(net.bridge(0).mst_config_id(), net.bridge(1).mst_config_id());
    assert_eq!(assert_converged(&net), Ok(0));
    assert_port(&net, 1, 0, CIST_INDEX, PortRole::Root, true).unwrap();

    assert_eq!(net.bridge(1).port_role(0, MSTI), PortRole::Master);
    assert_eq!(net.bridge(0).port_role(0, MSTI), PortRole::Designated);
    assert!(net.bridge(0).is_regional_root_bridge(MSTI));
    assert!(net.bridge(1).is_regional_root_bridge(MSTI));
    assert!(net.bridge(1).is_regional_root_bridge(CIST_INDEX));
    assert_eq!(net.bridge(1).root_priority(CIST_INDEX).external_root_path_cost, 20_000);
}

#[test]
fn test_different_vlan_map_splits_region() {
    init_test_logging("warn");
    let a = fixtures::region_member(1, "lab", &[10]);
    let b = fixtures::region_member(2, "lab", &[20]);
    let net = connect_configs(a, b);

    let (ida, idb) = (net.bridge(0).mst_config_id(), net.bridge(1).mst_config_id());
    assert_eq!(ida.name_str(), idb.name_str());
    assert_ne!(ida.digest, idb.digest);
    assert_eq!(net.bridge(1).port_role(0, MSTI), PortRole::Master);
}
