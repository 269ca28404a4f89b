//! Interoperation with neighbors forced to RSTP or legacy STP.

use mstp::{PortRole, StpVersion, CIST_INDEX};
use mstp_test::{assert_converged, assert_port, fixtures, init_test_logging, Network};
use pretty_assertions::assert_eq;

fn pair_with_version(version: StpVersion) -> Network {
    let mut net = Network::new();
    let a = net.add_bridge(fixtures::bridge_mac(1), 1, 0).unwrap();
    let b = net.add_bridge(fixtures::bridge_mac(2), 1, 0).unwrap();
    net.bridge_mut(b).set_stp_version(version, 0).unwrap();
    net.connect((a, 0), (b, 0));
    net
}

#[test]
fn test_rstp_neighbor_converges_rapidly() {
    init_test_logging("warn");
    let net = pair_with_version(StpVersion::Rstp);

    assert_eq!(net.bridge(1).stp_version(), StpVersion::Rstp);
    assert_eq!(assert_converged(&net), Ok(0));
    assert_port(&net, 0, 0, CIST_INDEX, PortRole::Designated, true).unwrap();
    assert_port(&net, 1, 0, CIST_INDEX, PortRole::Root, true).unwrap();
    assert!(net.bridge(0).port_send_rstp(0));
    assert!(net.bridge(1).port_send_rstp(0));
}

/// Scenario:
/// 1. Connect an MSTP bridge to a bridge forced to legacy STP
/// 2. The MSTP side falls back to Configuration BPDUs on that port
/// 3. Both sides reach forwarding on forward delay timers
#[test]
fn test_legacy_neighbor_uses_timer_based_transitions() {
    init_test_logging("warn");
    let mut net = pair_with_version(StpVersion::LegacyStp);

    assert!(!net.bridge(1).port_send_rstp(0));
    assert!(!net.bridge(1).port_forwarding(0, CIST_INDEX));

    net.run_for(50);

    assert_eq!(assert_converged(&net), Ok(0));
    assert!(!net.bridge(0).port_send_rstp(0));
    assert_port(&net, 0, 0, CIST_INDEX, PortRole::Designated, true).unwrap();
    assert_port(&net, 1, 0, CIST_INDEX, PortRole::Root, true).unwrap();
    assert!(net.bridge(0).topology_change_count(CIST_INDEX) >= 1);
}

#[test]
fn test_upgraded_neighbor_is_detected_again() {
    init_test_logging("warn");
    let mut net = pair_with_version(StpVersion::LegacyStp);
    net.run_for(50);
    assert!(!net.bridge(0).port_send_rstp(0));

    let now = net.now();
    net.bridge_mut(1).set_stp_version(StpVersion::Mstp, now).unwrap();
    net.deliver();
    net.run_for(10);

    assert!(net.bridge(1).port_send_rstp(0));
    assert!(net.bridge(0).port_send_rstp(0));
    assert_eq!(assert_converged(&net), Ok(0));
}
