//! Verification helpers for simulated networks.
//!
//! Each helper returns a [`VerificationError`] describing the first
//! violation found, so tests can `?` or `expect` them.

use mstp::{PortIndex, PortRole, TreeIndex};
use thiserror::Error;

use crate::Network;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("expected exactly one root bridge for tree {tree}, found {roots:?}")]
    RootCount { tree: TreeIndex, roots: Vec<usize> },

    #[error("bridge {bridge} port {port} tree {tree}: expected role {expected}, found {actual}")]
    RoleMismatch {
        bridge: usize,
        port: PortIndex,
        tree: TreeIndex,
        expected: PortRole,
        actual: PortRole,
    },

    #[error("bridge {bridge} port {port} tree {tree}: expected forwarding={expected}")]
    ForwardingMismatch {
        bridge: usize,
        port: PortIndex,
        tree: TreeIndex,
        expected: bool,
    },

    #[error("tree {tree}: forwarding links form a loop through bridge {bridge}")]
    Loop { tree: TreeIndex, bridge: usize },

    #[error("tree {tree}: bridge {bridge} is cut off from bridge 0")]
    Partitioned { tree: TreeIndex, bridge: usize },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Checks one port's role and forwarding state.
pub fn assert_port(
    net: &Network,
    bridge: usize,
    port: PortIndex,
    tree: TreeIndex,
    role: PortRole,
    forwarding: bool,
) -> VerifyResult<()> {
    let b = net.bridge(bridge);
    let actual = b.port_role(port, tree);
    if actual != role {
        return Err(VerificationError::RoleMismatch {
            bridge,
            port,
            tree,
            expected: role,
            actual,
        });
    }
    if b.port_forwarding(port, tree) != forwarding {
        return Err(VerificationError::ForwardingMismatch {
            bridge,
            port,
            tree,
            expected: forwarding,
        });
    }
    Ok(())
}

/// Every bridge agrees on one root for the CIST.
pub fn assert_single_root(net: &Network) -> VerifyResult<usize> {
    let roots: Vec<usize> = (0..net.bridges.len())
        .filter(|&i| net.bridge(i).is_root_bridge())
        .collect();
    match roots.as_slice() {
        [root] => Ok(*root),
        _ => Err(VerificationError::RootCount { tree: 0, roots }),
    }
}

fn find(parent: &mut [usize], mut node: usize) -> usize {
    while parent[node] != node {
        parent[node] = parent[parent[node]];
        node = parent[node];
    }
    node
}

/// The links forwarding at both ends form a spanning tree over the bridges
/// that up links connect.
pub fn assert_loop_free(net: &Network, tree: TreeIndex) -> VerifyResult<()> {
    let n = net.bridges.len();
    let mut forwarding = (0..n).collect::<Vec<_>>();
    let mut reachable = (0..n).collect::<Vec<_>>();

    for link in net.links.iter().filter(|l| l.up) {
        let (ba, pa) = link.a;
        let (bb, pb) = link.b;

        let (ra, rb) = (find(&mut reachable, ba), find(&mut reachable, bb));
        reachable[ra] = rb;

        let a_fwd = net.bridge(ba).port_forwarding(pa, tree);
        let b_fwd = net.bridge(bb).port_forwarding(pb, tree);
        if a_fwd && b_fwd {
            let (ra, rb) = (find(&mut forwarding, ba), find(&mut forwarding, bb));
            if ra == rb {
                return Err(VerificationError::Loop { tree, bridge: ba });
            }
            forwarding[ra] = rb;
        }
    }

    for bridge in 1..n {
        let connected = find(&mut reachable, bridge) == find(&mut reachable, 0);
        let spanned = find(&mut forwarding, bridge) == find(&mut forwarding, 0);
        if connected && !spanned {
            return Err(VerificationError::Partitioned { tree, bridge });
        }
    }
    Ok(())
}

/// The CIST has one root and spans the network without a loop.
pub fn assert_converged(net: &Network) -> VerifyResult<usize> {
    let root = assert_single_root(net)?;
    assert_loop_free(net, 0)?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::two_bridges;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_pair_has_two_roots() {
        let mut net = two_bridges().unwrap();
        net.disconnect(0);
        assert_eq!(
            assert_single_root(&net),
            Err(VerificationError::RootCount { tree: 0, roots: vec![0, 1] })
        );
        assert_eq!(assert_loop_free(&net, 0), Ok(()));
    }

    #[test]
    fn test_role_mismatch_is_reported() {
        let net = two_bridges().unwrap();
        let err = assert_port(&net, 0, 0, 0, PortRole::Root, true).unwrap_err();
        assert_eq!(
            err,
            VerificationError::RoleMismatch {
                bridge: 0,
                port: 0,
                tree: 0,
                expected: PortRole::Root,
                actual: PortRole::Designated,
            }
        );
    }
}
