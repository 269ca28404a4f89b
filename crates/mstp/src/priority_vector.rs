//! Priority vectors and timer parameter sets.
//!
//! A priority vector is compared field by field in declaration order, each
//! field unsigned, lower is better. The derived `Ord` is exactly that
//! lexical comparison. MSTI vectors leave the two CIST-only leading fields
//! at zero so the same type serves both kinds of tree.

use mstp_types::{BridgeId, PortId};
use std::cmp::Ordering;
use std::fmt;

/// Size of the encoded form returned by [`PriorityVector::to_bytes`].
pub const PRIORITY_VECTOR_LEN: usize = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PriorityVector {
    pub root_id: BridgeId,
    pub external_root_path_cost: u32,
    pub regional_root_id: BridgeId,
    pub internal_root_path_cost: u32,
    pub designated_bridge_id: BridgeId,
    pub designated_port_id: PortId,
    pub bridge_port_id: PortId,
}

impl PriorityVector {
    /// The bridge priority vector of a CIST: the bridge is root, regional
    /// root and designated bridge, with zero costs.
    pub fn cist_bridge(bridge_id: BridgeId) -> Self {
        PriorityVector {
            root_id: bridge_id,
            external_root_path_cost: 0,
            regional_root_id: bridge_id,
            internal_root_path_cost: 0,
            designated_bridge_id: bridge_id,
            designated_port_id: PortId::default(),
            bridge_port_id: PortId::default(),
        }
    }

    /// The bridge priority vector of an MSTI.
    pub fn msti_bridge(bridge_id: BridgeId) -> Self {
        PriorityVector {
            root_id: BridgeId::default(),
            external_root_path_cost: 0,
            ..Self::cist_bridge(bridge_id)
        }
    }

    /// Three-way comparison; `Less` means `self` is the better vector.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    pub fn is_better_than(&self, other: &Self) -> bool {
        self < other
    }

    pub fn is_better_or_same(&self, other: &Self) -> bool {
        self <= other
    }

    /// True when a message vector should replace the recorded port vector:
    /// it is better, or it is a changed vector from the same designated
    /// bridge and port that sent the recorded one.
    pub fn is_superior_to(&self, port_priority: &Self) -> bool {
        self.is_better_than(port_priority)
            || (self != port_priority && self.same_designated_port(port_priority))
    }

    /// Designated bridge address and designated port number match.
    pub fn same_designated_port(&self, other: &Self) -> bool {
        self.designated_bridge_id.address() == other.designated_bridge_id.address()
            && self.designated_port_id.number() == other.designated_port_id.number()
    }

    /// The 36-octet big-endian encoding, in comparison order.
    pub fn to_bytes(&self) -> [u8; PRIORITY_VECTOR_LEN] {
        let mut out = [0u8; PRIORITY_VECTOR_LEN];
        out[0..8].copy_from_slice(&self.root_id.to_bytes());
        out[8..12].copy_from_slice(&self.external_root_path_cost.to_be_bytes());
        out[12..20].copy_from_slice(&self.regional_root_id.to_bytes());
        out[20..24].copy_from_slice(&self.internal_root_path_cost.to_be_bytes());
        out[24..32].copy_from_slice(&self.designated_bridge_id.to_bytes());
        out[32..34].copy_from_slice(&self.designated_port_id.raw().to_be_bytes());
        out[34..36].copy_from_slice(&self.bridge_port_id.raw().to_be_bytes());
        out
    }
}

impl fmt::Display for PriorityVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}:{}:{}",
            self.root_id,
            self.external_root_path_cost,
            self.regional_root_id,
            self.internal_root_path_cost,
            self.designated_bridge_id,
            self.designated_port_id,
            self.bridge_port_id
        )
    }
}

/// Timer parameter values in whole seconds, plus the MST hop count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Times {
    pub forward_delay: u16,
    pub hello_time: u16,
    pub max_age: u16,
    pub message_age: u16,
    pub remaining_hops: u8,
}

impl Times {
    /// The 802.1Q consistency rule
    /// `2 * (forward_delay - 1) >= max_age >= 2 * (hello_time + 1)`.
    pub fn is_consistent(&self) -> bool {
        let fwd = u32::from(self.forward_delay);
        let max_age = u32::from(self.max_age);
        let hello = u32::from(self.hello_time);
        fwd >= 1 && 2 * (fwd - 1) >= max_age && max_age >= 2 * (hello + 1)
    }

    /// Compares everything except `remaining_hops`, which only MST BPDUs carry.
    pub fn same_timers(&self, other: &Self) -> bool {
        self.forward_delay == other.forward_delay
            && self.hello_time == other.hello_time
            && self.max_age == other.max_age
            && self.message_age == other.message_age
    }
}
