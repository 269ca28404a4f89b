//! IEEE 802.1Q Multiple Spanning Tree Protocol engine.
//!
//! The engine computes a loop-free active topology for one CIST and up to
//! 64 MSTIs, interoperating with RSTP and legacy STP neighbors. It is a pure
//! protocol core: the host feeds it events and receives every side effect
//! through [`BridgeCallbacks`].
//!
//! - [`Bridge`]: the engine handle, with lifecycle, event, configuration and
//!   query entry points
//! - [`BridgeCallbacks`]: what the host must provide (transmit buffers,
//!   learning and forwarding control, FDB flushes, notifications)
//! - [`Bpdu`]: the STP/RSTP/MSTP wire codec
//! - [`BridgeConfig`]: persistent administrative settings as TOML
//!
//! # Example
//!
//! ```ignore
//! use mstp::{Bridge, BridgeCallbacks, MacAddress};
//!
//! let mut bridge = Bridge::new(2, 0, MacAddress::new([2, 0, 0, 0, 0, 1]), host)?;
//! bridge.start_bridge(now);
//! bridge.on_port_enabled(0, 1000, true, now);
//! bridge.on_bpdu_received(0, &bpdu, now)?;
//! bridge.on_one_second_tick(now + 1);
//! ```
//!
//! # Concurrency
//!
//! A bridge is a plain value. Calls on one bridge must be serialized; the
//! callbacks run synchronously inside them and must not re-enter the bridge.

pub mod bpdu;
mod bridge;
mod callbacks;
mod config;
pub mod digest;
mod error;
mod port;
mod priority_vector;
mod procedures;
mod scheduler;
mod sm;
mod state;
mod timers;
mod tree;
mod types;

#[cfg(test)]
mod testing;

pub use bpdu::{
    bpdu_from_frame, encode_frame, Bpdu, BpduFlags, BpduKind, CistMessage, EncodedRole, MessageTimes,
    MstExtension, MstiMessage,
};
pub use bridge::Bridge;
pub use callbacks::BridgeCallbacks;
pub use config::{BridgeConfig, MstConfig, PortConfig, TimersConfig, TreePriority, VlanAssignment};
pub use digest::{MstConfigId, VlanTable};
pub use error::{MstpError, MstpResult};
pub use mstp_types::{BridgeId, MacAddress, ParseError, PortId, VlanId};
pub use port::path_cost_for_speed;
pub use priority_vector::{PriorityVector, Times, PRIORITY_VECTOR_LEN};
pub use types::{FlushFdbType, PortIndex, PortRole, PortStats, StpVersion, TreeIndex, CIST_INDEX};

/// Protocol defaults and limits.
pub mod defaults {
    /// Bridge priority of every tree until configured.
    pub const BRIDGE_PRIORITY: u16 = 0x8000;

    pub const PORT_PRIORITY: u8 = 0x80;

    pub const HELLO_TIME: u16 = 2;
    pub const MAX_AGE: u16 = 20;
    pub const FORWARD_DELAY: u16 = 15;
    pub const MIGRATE_TIME: u16 = 3;
    pub const TX_HOLD_COUNT: u32 = 6;
    pub const MAX_HOPS: u8 = 20;

    pub const MAX_MSTIS: usize = 64;
    pub const MAX_PORTS: usize = 4095;

    /// Largest administrative path cost.
    pub const MAX_PATH_COST: u32 = 200_000_000;
}
