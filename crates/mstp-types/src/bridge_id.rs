//! 802.1Q bridge identifier.

use crate::{MacAddress, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An 8-octet bridge identifier.
///
/// The first two octets carry the settable priority in their top four bits
/// and a 12-bit system ID extension (the MSTID for MSTI identifiers) in the
/// rest; the last six octets are the bridge address. Field order makes the
/// derived ordering identical to the unsigned comparison of the encoded
/// octets.
///
/// # Examples
///
/// ```
/// use mstp_types::{BridgeId, MacAddress};
///
/// let mac = MacAddress::new([0, 0, 0, 0, 0, 1]);
/// let id = BridgeId::new(0x8000, 0, mac).unwrap();
/// assert_eq!(id.to_string(), "8000.00:00:00:00:00:01");
/// assert!(BridgeId::new(0x8001, 0, mac).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BridgeId {
    priority_and_system_id: u16,
    address: MacAddress,
}

impl BridgeId {
    /// Highest settable bridge priority.
    pub const MAX_PRIORITY: u16 = 0xf000;

    /// Granularity of the settable bridge priority.
    pub const PRIORITY_STEP: u16 = 0x1000;

    /// Creates a bridge identifier, validating the priority and system ID.
    pub fn new(priority: u16, system_id: u16, address: MacAddress) -> Result<Self, ParseError> {
        if priority % Self::PRIORITY_STEP != 0 {
            return Err(ParseError::InvalidBridgePriority(priority));
        }
        if system_id > 0x0fff {
            return Err(ParseError::InvalidBridgeId(format!(
                "system ID extension {system_id} exceeds 4095"
            )));
        }
        Ok(Self::from_raw(priority | system_id, address))
    }

    /// Creates a bridge identifier from its raw first two octets.
    pub const fn from_raw(priority_and_system_id: u16, address: MacAddress) -> Self {
        BridgeId {
            priority_and_system_id,
            address,
        }
    }

    /// Decodes the 8-octet wire form.
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        let raw = u16::from_be_bytes([bytes[0], bytes[1]]);
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&bytes[2..]);
        Self::from_raw(raw, MacAddress::new(mac))
    }

    /// Encodes the 8-octet wire form.
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[..2].copy_from_slice(&self.priority_and_system_id.to_be_bytes());
        bytes[2..].copy_from_slice(self.address.as_bytes());
        bytes
    }

    /// The settable priority (top four bits of the first two octets).
    pub const fn priority(&self) -> u16 {
        self.priority_and_system_id & 0xf000
    }

    /// The 12-bit system ID extension.
    pub const fn system_id(&self) -> u16 {
        self.priority_and_system_id & 0x0fff
    }

    /// Priority and system ID extension as transmitted.
    pub const fn raw_priority(&self) -> u16 {
        self.priority_and_system_id
    }

    pub const fn address(&self) -> MacAddress {
        self.address
    }

    /// Returns a copy with the priority bits replaced.
    pub const fn with_priority(self, priority: u16) -> Self {
        Self::from_raw((priority & 0xf000) | self.system_id(), self.address)
    }

    /// Returns a copy with the address replaced.
    pub const fn with_address(self, address: MacAddress) -> Self {
        Self::from_raw(self.priority_and_system_id, address)
    }
}

impl fmt::Display for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}.{}", self.priority_and_system_id, self.address)
    }
}

impl FromStr for BridgeId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (priority, address) = s
            .split_once('.')
            .ok_or_else(|| ParseError::InvalidBridgeId(s.to_string()))?;
        let raw = u16::from_str_radix(priority, 16)
            .map_err(|_| ParseError::InvalidBridgeId(s.to_string()))?;
        Ok(Self::from_raw(raw, address.parse()?))
    }
}

impl TryFrom<String> for BridgeId {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BridgeId> for String {
    fn from(id: BridgeId) -> String {
        id.to_string()
    }
}
