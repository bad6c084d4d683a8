//! LED and macro key identifier tables.
//!
//! An LED logical id packs the LED group into the high 16 bits and the
//! index within the group into the low 16 bits. Macro keys (G-keys) are
//! reported by key events using their own small integer space.

use std::fmt;

use crate::types::CorsairLedLuid;

/// LED group (`CorsairLedGroup`), the high half of an [`LedLuid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LedGroup(pub u16);

impl LedGroup {
    /// `CLG_Keyboard`: regular keys.
    pub const KEYBOARD: Self = Self(0);
    /// `CLG_KeyboardGKeys`: programmable G-keys.
    pub const KEYBOARD_G_KEYS: Self = Self(1);
    /// `CLG_KeyboardEdge`: edge light bar.
    pub const KEYBOARD_EDGE: Self = Self(2);
}

/// LED logical id: `group << 16 | index`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LedLuid(pub CorsairLedLuid);

impl LedLuid {
    /// Pack a group and an index.
    #[must_use]
    pub const fn new(group: LedGroup, index: u16) -> Self {
        Self(((group.0 as u32) << 16) | index as u32)
    }

    /// The group half.
    #[must_use]
    pub const fn group(self) -> LedGroup {
        LedGroup((self.0 >> 16) as u16)
    }

    /// The index half.
    #[must_use]
    pub const fn index(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Raw value handed to the SDK.
    #[must_use]
    pub const fn raw(self) -> CorsairLedLuid {
        self.0
    }
}

impl fmt::Display for LedLuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u32> for LedLuid {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

const fn g_key(index: u16) -> LedLuid {
    LedLuid::new(LedGroup::KEYBOARD_G_KEYS, index)
}

const fn key(index: u16) -> LedLuid {
    LedLuid::new(LedGroup::KEYBOARD, index)
}

/// Named LEDs exposed to hosts.
pub const LED_KEYS: [(&str, LedLuid); 16] = [
    ("G1", g_key(1)),
    ("G2", g_key(2)),
    ("G3", g_key(3)),
    ("G4", g_key(4)),
    ("G5", g_key(5)),
    ("G6", g_key(6)),
    ("G7", g_key(7)),
    ("G8", g_key(8)),
    ("G9", g_key(9)),
    ("G10", g_key(10)),
    ("G11", g_key(11)),
    ("G12", g_key(12)),
    ("Esc", key(1)),
    ("F1", key(3)),
    ("F2", key(4)),
    ("F3", key(5)),
];

/// Macro key ids reported in key events (`CMKI_1` .. `CMKI_12`).
pub const MACRO_KEYS: [(&str, i32); 12] = [
    ("G1", 1),
    ("G2", 2),
    ("G3", 3),
    ("G4", 4),
    ("G5", 5),
    ("G6", 6),
    ("G7", 7),
    ("G8", 8),
    ("G9", 9),
    ("G10", 10),
    ("G11", 11),
    ("G12", 12),
];

/// The twelve G-key names, in order.
pub const G_KEY_NAMES: [&str; 12] = [
    "G1", "G2", "G3", "G4", "G5", "G6", "G7", "G8", "G9", "G10", "G11", "G12",
];

/// Look up an LED by its table name (case-insensitive).
#[must_use]
pub fn led_key(name: &str) -> Option<LedLuid> {
    LED_KEYS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, luid)| *luid)
}

/// Name of the macro key with the given event id.
#[must_use]
pub fn macro_key_name(key_id: i32) -> Option<&'static str> {
    MACRO_KEYS
        .iter()
        .find(|(_, id)| *id == key_id)
        .map(|(name, _)| *name)
}

/// Event id of the macro key with the given name (case-insensitive).
#[must_use]
pub fn macro_key_id(name: &str) -> Option<i32> {
    MACRO_KEYS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, id)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_g_key_encoding() {
        assert_eq!(led_key("G1").map(LedLuid::raw), Some(0x0001_0001));
        assert_eq!(led_key("g10").map(LedLuid::raw), Some(0x0001_000A));
        assert_eq!(led_key("Esc").map(LedLuid::raw), Some(0x0000_0001));
        assert_eq!(led_key("F3").map(LedLuid::raw), Some(0x0000_0005));
        assert_eq!(led_key("Nope"), None);
    }

    #[test]
    fn test_macro_key_lookup() {
        assert_eq!(macro_key_name(5), Some("G5"));
        assert_eq!(macro_key_name(13), None);
        assert_eq!(macro_key_id("G12"), Some(12));
    }

    #[test]
    fn test_every_g_key_has_led_and_macro_id() {
        for name in G_KEY_NAMES {
            assert!(led_key(name).is_some(), "missing LED for {name}");
            assert!(macro_key_id(name).is_some(), "missing macro id for {name}");
        }
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(LedLuid(0x0001_0002).to_string(), "0x00010002");
    }
}
