//! Integration test infrastructure for the MSTP engine.
//!
//! Provides:
//! - An in-memory bridged network that carries framed BPDUs between bridges
//! - Topology and configuration fixtures
//! - Verification helpers for roles, port states and loop freedom

pub mod fixtures;
mod network;
mod verification;

pub use network::{HarnessCallbacks, Link, Network, NetworkEvent, LINK_SPEED_MBPS};
pub use verification::*;

/// Installs a test-friendly tracing subscriber. `RUST_LOG` overrides
/// `log_level`. Safe to call from every test.
pub fn init_test_logging(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_test_writer())
        .try_init();
}
