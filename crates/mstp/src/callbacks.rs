//! Host callback boundary.
//!
//! The engine never touches a network interface or a filtering database.
//! Everything it needs from the outside world goes through this trait,
//! implemented by the host and handed to [`crate::Bridge`] at construction.
//! All methods are invoked synchronously from inside event processing.

use crate::types::{FlushFdbType, PortIndex, PortRole, TreeIndex};

pub trait BridgeCallbacks {
    fn enable_learning(&mut self, port: PortIndex, tree: TreeIndex, timestamp: u32);
    fn disable_learning(&mut self, port: PortIndex, tree: TreeIndex, timestamp: u32);
    fn enable_forwarding(&mut self, port: PortIndex, tree: TreeIndex, timestamp: u32);
    fn disable_forwarding(&mut self, port: PortIndex, tree: TreeIndex, timestamp: u32);

    /// Returns a buffer of exactly `size` octets for a BPDU on `port`, or
    /// `None` when the port has no usable path right now. The BPDU written
    /// there starts at the protocol identifier; framing is the host's job.
    fn transmit_get_buffer(&mut self, port: PortIndex, size: usize, timestamp: u32) -> Option<&mut [u8]>;

    /// The buffer handed out by the last `transmit_get_buffer` is filled.
    fn transmit_release_buffer(&mut self, port: PortIndex);

    fn flush_fdb(&mut self, port: PortIndex, tree: TreeIndex, flush_type: FlushFdbType, timestamp: u32);

    /// A topology change period started on `tree`.
    fn on_topology_change(&mut self, _tree: TreeIndex, _timestamp: u32) {}

    /// A topology change notification arrived on `port`.
    fn on_notified_topology_change(&mut self, _port: PortIndex, _tree: TreeIndex, _timestamp: u32) {}

    fn on_port_role_changed(&mut self, _port: PortIndex, _tree: TreeIndex, _role: PortRole, _timestamp: u32) {}

    /// A configuration setter succeeded.
    fn on_config_changed(&mut self, _timestamp: u32) {}

    /// Advisory trace text. `flush` marks the end of a burst.
    fn debug_log(&mut self, _port: Option<PortIndex>, _tree: Option<TreeIndex>, _text: &str, _flush: bool) {}
}
