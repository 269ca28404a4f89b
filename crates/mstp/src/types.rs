//! Engine-wide enums, handles and counters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a port within its bridge (0-based).
pub type PortIndex = usize;

/// Index of a spanning tree within its bridge; the MSTID for MSTIs.
pub type TreeIndex = usize;

/// Tree index of the Common and Internal Spanning Tree.
pub const CIST_INDEX: TreeIndex = 0;

/// Protocol the bridge runs (ForceProtocolVersion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StpVersion {
    #[serde(rename = "stp")]
    LegacyStp = 0,
    Rstp = 2,
    Mstp = 3,
}

impl StpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LegacyStp => "STP",
            Self::Rstp => "RSTP",
            Self::Mstp => "MSTP",
        }
    }

    /// Parses a version name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stp" | "legacy" | "0" => Some(Self::LegacyStp),
            "rstp" | "2" => Some(Self::Rstp),
            "mstp" | "3" => Some(Self::Mstp),
            _ => None,
        }
    }
}

impl fmt::Display for StpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A port's role within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PortRole {
    #[default]
    Disabled,
    Root,
    Designated,
    Alternate,
    Backup,
    Master,
}

impl PortRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::Root => "Root",
            Self::Designated => "Designated",
            Self::Alternate => "Alternate",
            Self::Backup => "Backup",
            Self::Master => "Master",
        }
    }
}

impl fmt::Display for PortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the host should remove filtering entries learned on a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlushFdbType {
    /// Remove the entries now.
    Immediate,
    /// Age the entries out using the forward delay as ageing time.
    RapidAgeing,
}

/// Per-port BPDU counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortStats {
    pub bpdus_received: u64,
    pub bpdus_transmitted: u64,
    pub malformed_bpdus: u64,
    pub transmit_dropped: u64,
}
