//! Identifier types shared by the spanning tree engine and its hosts.
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`BridgeId`]: 802.1Q bridge identifiers (priority, system ID extension, address)
//! - [`PortId`]: 802.1Q port identifiers (priority, port number)
//! - [`VlanId`]: IEEE 802.1Q VLAN identifiers
//!
//! All identifiers order the way they compare on the wire: big-endian,
//! unsigned, lower is better.

mod bridge_id;
mod mac;
mod port_id;
mod vlan;

pub use bridge_id::BridgeId;
pub use mac::MacAddress;
pub use port_id::PortId;
pub use vlan::VlanId;

/// Common error type for parsing and validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid bridge identifier: {0}")]
    InvalidBridgeId(String),

    #[error("invalid bridge priority: {0} (must be a multiple of 4096 up to 61440)")]
    InvalidBridgePriority(u16),

    #[error("invalid port priority: {0} (must be a multiple of 16 up to 240)")]
    InvalidPortPriority(u8),

    #[error("invalid port number: {0} (must be 1-4095)")]
    InvalidPortNumber(u16),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u16),
}
