//! Static bridge configuration, persisted as TOML.
//!
//! Only administrative settings live here; protocol state is never saved.
//! Every field has a serde default so a partial file is a valid file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use mstp_types::{MacAddress, VlanId};

use crate::defaults;
use crate::digest::CONFIG_NAME_LEN;
use crate::error::{MstpError, MstpResult};
use crate::types::{PortIndex, StpVersion, TreeIndex};

/// Bridge timer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimersConfig {
    #[serde(default = "default_hello_time")]
    pub hello_time: u16,

    #[serde(default = "default_max_age")]
    pub max_age: u16,

    #[serde(default = "default_forward_delay")]
    pub forward_delay: u16,

    #[serde(default = "default_tx_hold_count")]
    pub tx_hold_count: u32,

    #[serde(default = "default_max_hops")]
    pub max_hops: u8,
}

/// Bridge priority of one tree; trees not listed keep the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreePriority {
    pub tree: TreeIndex,
    pub priority: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanAssignment {
    pub vlan: VlanId,
    pub tree: TreeIndex,
}

/// MST Configuration Identifier inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MstConfig {
    /// Region name; the bridge address when absent.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub revision: u16,

    #[serde(default)]
    pub vlans: Vec<VlanAssignment>,
}

/// Administrative settings of one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    pub port: PortIndex,

    #[serde(default)]
    pub admin_edge: bool,

    #[serde(default = "default_true")]
    pub auto_edge: bool,

    /// 0 derives the cost from the link speed.
    #[serde(default)]
    pub external_path_cost: u32,
}

/// Complete bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_address")]
    pub address: MacAddress,

    #[serde(default = "default_port_count")]
    pub port_count: usize,

    #[serde(default)]
    pub msti_count: usize,

    /// Start the protocol right after construction.
    #[serde(default = "default_true")]
    pub stp_enabled: bool,

    #[serde(default = "default_protocol_version")]
    pub protocol_version: StpVersion,

    /// Offer state machine traces to the host's `debug_log` callback.
    #[serde(default = "default_true")]
    pub debug_log: bool,

    #[serde(default)]
    pub timers: TimersConfig,

    #[serde(default)]
    pub bridge_priorities: Vec<TreePriority>,

    #[serde(default)]
    pub mst: MstConfig,

    #[serde(default)]
    pub ports: Vec<PortConfig>,
}

fn default_hello_time() -> u16 {
    defaults::HELLO_TIME
}

fn default_max_age() -> u16 {
    defaults::MAX_AGE
}

fn default_forward_delay() -> u16 {
    defaults::FORWARD_DELAY
}

fn default_tx_hold_count() -> u32 {
    defaults::TX_HOLD_COUNT
}

fn default_max_hops() -> u8 {
    defaults::MAX_HOPS
}

fn default_true() -> bool {
    true
}

fn default_address() -> MacAddress {
    MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01])
}

fn default_port_count() -> usize {
    2
}

fn default_protocol_version() -> StpVersion {
    StpVersion::Mstp
}

impl Default for TimersConfig {
    fn default() -> Self {
        Self {
            hello_time: default_hello_time(),
            max_age: default_max_age(),
            forward_delay: default_forward_delay(),
            tx_hold_count: default_tx_hold_count(),
            max_hops: default_max_hops(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port_count: default_port_count(),
            msti_count: 0,
            stp_enabled: true,
            protocol_version: default_protocol_version(),
            debug_log: true,
            timers: TimersConfig::default(),
            bridge_priorities: Vec::new(),
            mst: MstConfig::default(),
            ports: Vec::new(),
        }
    }
}

pub(crate) fn validate_counts(port_count: usize, msti_count: usize) -> MstpResult<()> {
    if !(1..=defaults::MAX_PORTS).contains(&port_count) {
        return Err(MstpError::invalid_config(
            "port_count",
            format!("must be 1-{}", defaults::MAX_PORTS),
        ));
    }
    if msti_count > defaults::MAX_MSTIS {
        return Err(MstpError::invalid_config(
            "msti_count",
            format!("must be 0-{}", defaults::MAX_MSTIS),
        ));
    }
    Ok(())
}

pub(crate) fn validate_bridge_priority(priority: u16) -> MstpResult<()> {
    if priority % 4096 != 0 || priority > 61440 {
        return Err(MstpError::invalid_config(
            "bridge_priority",
            "must be a multiple of 4096 in 0-61440",
        ));
    }
    Ok(())
}

pub(crate) fn validate_port_priority(priority: u8) -> MstpResult<()> {
    if priority % 16 != 0 || priority > 240 {
        return Err(MstpError::invalid_config(
            "port_priority",
            "must be a multiple of 16 in 0-240",
        ));
    }
    Ok(())
}

/// Checks the 802.1Q relation 2*(forward_delay-1) >= max_age >= 2*(hello_time+1)
/// and the individual ranges.
pub(crate) fn validate_times(hello_time: u16, max_age: u16, forward_delay: u16) -> MstpResult<()> {
    if !(1..=2).contains(&hello_time) {
        return Err(MstpError::invalid_config("hello_time", "must be 1-2"));
    }
    if !(6..=40).contains(&max_age) {
        return Err(MstpError::invalid_config("max_age", "must be 6-40"));
    }
    if !(4..=30).contains(&forward_delay) {
        return Err(MstpError::invalid_config("forward_delay", "must be 4-30"));
    }
    if 2 * (forward_delay - 1) < max_age || max_age < 2 * (hello_time + 1) {
        return Err(MstpError::invalid_config(
            "max_age",
            "must satisfy 2*(forward_delay-1) >= max_age >= 2*(hello_time+1)",
        ));
    }
    Ok(())
}

pub(crate) fn validate_tx_hold_count(count: u32) -> MstpResult<()> {
    if !(1..=10).contains(&count) {
        return Err(MstpError::invalid_config("tx_hold_count", "must be 1-10"));
    }
    Ok(())
}

pub(crate) fn validate_max_hops(hops: u8) -> MstpResult<()> {
    if !(6..=40).contains(&hops) {
        return Err(MstpError::invalid_config("max_hops", "must be 6-40"));
    }
    Ok(())
}

pub(crate) fn validate_path_cost(cost: u32) -> MstpResult<()> {
    if cost > defaults::MAX_PATH_COST {
        return Err(MstpError::invalid_config(
            "path_cost",
            format!("must be 0 (automatic) or 1-{}", defaults::MAX_PATH_COST),
        ));
    }
    Ok(())
}

pub(crate) fn validate_config_name(name: &str) -> MstpResult<()> {
    if name.len() > CONFIG_NAME_LEN {
        return Err(MstpError::invalid_config(
            "mst_config_name",
            format!("must be at most {CONFIG_NAME_LEN} bytes"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_tree(tree: TreeIndex, msti_count: usize) -> MstpResult<()> {
    if tree > msti_count {
        return Err(MstpError::invalid_config(
            "tree",
            format!("must be 0-{msti_count}"),
        ));
    }
    Ok(())
}

impl BridgeConfig {
    /// Load configuration from a file, falling back to defaults if it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> MstpResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content)?;
                config.validate()?;
                info!(path = %path.display(), "loaded bridge configuration");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "configuration file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(MstpError::Io(e)),
        }
    }

    /// Load configuration from a file that must exist.
    pub fn load(path: impl AsRef<Path>) -> MstpResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> MstpResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Range-checks every field against the limits the bridge setters enforce.
    pub fn validate(&self) -> MstpResult<()> {
        validate_counts(self.port_count, self.msti_count)?;
        validate_times(self.timers.hello_time, self.timers.max_age, self.timers.forward_delay)?;
        validate_tx_hold_count(self.timers.tx_hold_count)?;
        validate_max_hops(self.timers.max_hops)?;

        for entry in &self.bridge_priorities {
            validate_tree(entry.tree, self.msti_count)?;
            validate_bridge_priority(entry.priority)?;
        }

        if let Some(name) = &self.mst.name {
            validate_config_name(name)?;
        }
        for entry in &self.mst.vlans {
            validate_tree(entry.tree, self.msti_count)?;
        }

        for port in &self.ports {
            if port.port >= self.port_count {
                return Err(MstpError::invalid_config(
                    "ports",
                    format!("port {} out of range 0-{}", port.port, self.port_count - 1),
                ));
            }
            validate_path_cost(port.external_path_cost)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.port_count, 2);
        assert_eq!(config.protocol_version, StpVersion::Mstp);
        assert_eq!(config.timers.hello_time, 2);
        assert_eq!(config.timers.max_age, 20);
        assert_eq!(config.timers.forward_delay, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_deserialization_uses_defaults() {
        let toml_str = r#"
address = "00:11:22:33:44:55"
port_count = 8
msti_count = 2
protocol_version = "rstp"

[timers]
hello_time = 1

[[ports]]
port = 3
admin_edge = true

[[mst.vlans]]
vlan = 100
tree = 2
"#;
        let config: BridgeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.address.to_string(), "00:11:22:33:44:55");
        assert_eq!(config.port_count, 8);
        assert_eq!(config.protocol_version, StpVersion::Rstp);
        assert_eq!(config.timers.hello_time, 1);
        assert_eq!(config.timers.max_age, 20);
        assert!(config.ports[0].admin_edge);
        assert!(config.ports[0].auto_edge);
        assert_eq!(config.mst.vlans[0].vlan.as_u16(), 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = BridgeConfig::default();
        config.timers.max_age = 40;
        assert!(config.validate().is_err());

        let mut config = BridgeConfig::default();
        config.bridge_priorities.push(TreePriority { tree: 0, priority: 100 });
        assert!(config.validate().is_err());

        let mut config = BridgeConfig::default();
        config.ports.push(PortConfig {
            port: 2,
            admin_edge: false,
            auto_edge: true,
            external_path_cost: 0,
        });
        assert!(config.validate().is_err());

        let mut config = BridgeConfig::default();
        config.mst.vlans.push(VlanAssignment {
            vlan: VlanId::new(10).unwrap(),
            tree: 1,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_times_relation() {
        assert!(validate_times(2, 20, 15).is_ok());
        assert!(validate_times(2, 6, 4).is_ok());
        assert!(validate_times(2, 5, 15).is_err());
        assert!(validate_times(1, 30, 15).is_err());
        assert!(validate_times(3, 20, 15).is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");

        let mut config = BridgeConfig {
            msti_count: 1,
            ..BridgeConfig::default()
        };
        config.mst.name = Some("region-a".to_string());
        config.bridge_priorities.push(TreePriority { tree: 1, priority: 4096 });
        config.save(&path).unwrap();

        let loaded = BridgeConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = BridgeConfig::load_or_default("/nonexistent/bridge.toml").unwrap();
        assert_eq!(config, BridgeConfig::default());
    }
}
