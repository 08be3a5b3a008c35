//! Capability bitmask — which methods a hub device supports.

use serde::{Deserialize, Serialize};

/// Bitmask of methods a hub device supports.
///
/// The bit values mirror the hub's wire protocol and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(u32);

impl Capabilities {
    /// No capabilities at all.
    pub const NONE: Self = Self(0);
    /// Device can be turned on.
    pub const TURN_ON: Self = Self(0x0001);
    /// Device can be turned off.
    pub const TURN_OFF: Self = Self(0x0002);
    /// Device supports a momentary bell pulse.
    pub const BELL: Self = Self(0x0004);
    /// Device supports dimming to a 0–255 level.
    pub const DIM: Self = Self(0x0010);
    /// Device can move up (covers).
    pub const UP: Self = Self(0x0080);
    /// Device can move down (covers).
    pub const DOWN: Self = Self(0x0100);
    /// Device can stop an ongoing movement.
    pub const STOP: Self = Self(0x0200);

    /// Build a mask from a raw bitmask value.
    #[must_use]
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw bitmask value.
    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether all bits of `other` are set in this mask.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bits are set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
