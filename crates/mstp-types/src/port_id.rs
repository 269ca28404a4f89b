//! 802.1Q port identifier.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2-octet port identifier: priority in the top four bits, port number
/// in the low twelve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(u16);

impl PortId {
    /// Highest settable port priority.
    pub const MAX_PRIORITY: u8 = 0xf0;

    /// Creates a port identifier, validating priority and number.
    pub fn new(priority: u8, number: u16) -> Result<Self, ParseError> {
        if priority % 16 != 0 {
            return Err(ParseError::InvalidPortPriority(priority));
        }
        if number == 0 || number > 0x0fff {
            return Err(ParseError::InvalidPortNumber(number));
        }
        Ok(PortId((u16::from(priority) << 8) | number))
    }

    pub const fn from_raw(raw: u16) -> Self {
        PortId(raw)
    }

    pub const fn raw(&self) -> u16 {
        self.0
    }

    pub const fn priority(&self) -> u8 {
        ((self.0 >> 8) & 0xf0) as u8
    }

    pub const fn number(&self) -> u16 {
        self.0 & 0x0fff
    }

    /// Returns a copy with the priority bits replaced.
    pub const fn with_priority(self, priority: u8) -> Self {
        PortId(((priority as u16 & 0xf0) << 8) | self.number())
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}
