//! Execution-state flags.
//!
//! [`ExecFlags`] mirrors the bitmask accepted by the platform's
//! "set thread execution state" primitive. Each bit inhibits one kind of
//! idle transition:
//!
//! | Flag | Bit | Effect |
//! |------|-----|--------|
//! | [`SYSTEM_REQUIRED`](ExecFlags::SYSTEM_REQUIRED) | `0x0000_0001` | Resets the system idle timer |
//! | [`DISPLAY_REQUIRED`](ExecFlags::DISPLAY_REQUIRED) | `0x0000_0002` | Resets the display idle timer |
//! | [`USER_PRESENT`](ExecFlags::USER_PRESENT) | `0x0000_0004` | Unsupported, rejected when combined |
//! | [`AWAYMODE_REQUIRED`](ExecFlags::AWAYMODE_REQUIRED) | `0x0000_0040` | Away mode (background work, display may sleep) |
//! | [`CONTINUOUS`](ExecFlags::CONTINUOUS) | `0x8000_0000` | State persists until the next continuous call |
//!
//! # Presets
//!
//! The control protocol only ever requests one of four combinations, all
//! of which include `CONTINUOUS`:
//!
//! ```
//! use nosleep_types::ExecFlags;
//!
//! assert_eq!(ExecFlags::CLEAR, ExecFlags::CONTINUOUS);
//! assert!(ExecFlags::DISPLAY.contains(ExecFlags::SYSTEM_REQUIRED | ExecFlags::DISPLAY_REQUIRED));
//! assert!(ExecFlags::CRITICAL.contains(ExecFlags::AWAYMODE_REQUIRED));
//! assert_eq!(ExecFlags::UNKNOWN.bits(), 0);
//! ```
//!
//! # Wire Format
//!
//! Serializes as the raw `u32`, so a reply body reads `{"flags": 2147483649}`.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Bitmask of execution-state requirements.
    ///
    /// Values returned by the platform may carry bits without a name;
    /// they are preserved through [`from_bits_retain`](Self::from_bits_retain).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExecFlags: u32 {
        /// Forces the system to stay in the working state.
        const SYSTEM_REQUIRED   = 0x0000_0001;
        /// Forces the display to stay on.
        const DISPLAY_REQUIRED  = 0x0000_0002;
        /// Not supported by the platform. Combining it with any other
        /// flag makes the call fail without setting anything.
        const USER_PRESENT      = 0x0000_0004;
        /// Away mode. Must be combined with `CONTINUOUS`.
        const AWAYMODE_REQUIRED = 0x0000_0040;
        /// The requested state stays in effect until changed.
        const CONTINUOUS        = 0x8000_0000;
    }
}

impl ExecFlags {
    /// Sentinel for "previous state not known" (zero).
    pub const UNKNOWN: Self = Self::empty();

    /// Releases every hold.
    pub const CLEAR: Self = Self::CONTINUOUS;

    /// Keeps the system awake; the display may sleep.
    pub const SYSTEM: Self = Self::CONTINUOUS.union(Self::SYSTEM_REQUIRED);

    /// Keeps both the system and the display awake.
    pub const DISPLAY: Self = Self::SYSTEM.union(Self::DISPLAY_REQUIRED);

    /// Keeps the system doing background work while the display may sleep.
    pub const CRITICAL: Self = Self::SYSTEM.union(Self::AWAYMODE_REQUIRED);

    /// Returns `true` if the platform is documented to accept this
    /// combination.
    ///
    /// `USER_PRESENT` on its own is tolerated; mixed with anything else
    /// the platform call fails.
    ///
    /// ```
    /// use nosleep_types::ExecFlags;
    ///
    /// assert!(ExecFlags::DISPLAY.is_supported());
    /// assert!(ExecFlags::USER_PRESENT.is_supported());
    /// assert!(!(ExecFlags::USER_PRESENT | ExecFlags::SYSTEM_REQUIRED).is_supported());
    /// ```
    #[must_use]
    pub fn is_supported(self) -> bool {
        !self.contains(Self::USER_PRESENT) || self == Self::USER_PRESENT
    }

    /// Returns `true` if any system or display hold is requested.
    #[must_use]
    pub fn holds_awake(self) -> bool {
        self.intersects(Self::SYSTEM_REQUIRED | Self::DISPLAY_REQUIRED | Self::AWAYMODE_REQUIRED)
    }

    /// Returns the names of the set flags, most significant first.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::CONTINUOUS) {
            names.push("CONTINUOUS");
        }
        if self.contains(Self::SYSTEM_REQUIRED) {
            names.push("SYSTEM_REQUIRED");
        }
        if self.contains(Self::DISPLAY_REQUIRED) {
            names.push("DISPLAY_REQUIRED");
        }
        if self.contains(Self::USER_PRESENT) {
            names.push("USER_PRESENT");
        }
        if self.contains(Self::AWAYMODE_REQUIRED) {
            names.push("AWAYMODE_REQUIRED");
        }
        names
    }
}

impl std::fmt::Display for ExecFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.names();
        let unnamed = self.bits() & !Self::all().bits();
        match (names.is_empty(), unnamed) {
            (true, 0) => write!(f, "(none)"),
            (false, 0) => write!(f, "{}", names.join(" | ")),
            (true, extra) => write!(f, "{extra:#010x}"),
            (false, extra) => write!(f, "{} | {extra:#010x}", names.join(" | ")),
        }
    }
}

impl Serialize for ExecFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for ExecFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Self::from_bits_retain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_always_carry_continuous() {
        for preset in [
            ExecFlags::CLEAR,
            ExecFlags::SYSTEM,
            ExecFlags::DISPLAY,
            ExecFlags::CRITICAL,
        ] {
            assert!(preset.contains(ExecFlags::CONTINUOUS), "{preset}");
        }
    }

    #[test]
    fn preset_bit_values() {
        assert_eq!(ExecFlags::CLEAR.bits(), 0x8000_0000);
        assert_eq!(ExecFlags::SYSTEM.bits(), 0x8000_0001);
        assert_eq!(ExecFlags::DISPLAY.bits(), 0x8000_0003);
        assert_eq!(ExecFlags::CRITICAL.bits(), 0x8000_0041);
    }

    #[test]
    fn user_present_combinations() {
        assert!(ExecFlags::USER_PRESENT.is_supported());
        assert!(!(ExecFlags::USER_PRESENT | ExecFlags::CONTINUOUS).is_supported());
        assert!(ExecFlags::CLEAR.is_supported());
        assert!(ExecFlags::UNKNOWN.is_supported());
    }

    #[test]
    fn holds_awake() {
        assert!(!ExecFlags::CLEAR.holds_awake());
        assert!(!ExecFlags::UNKNOWN.holds_awake());
        assert!(ExecFlags::SYSTEM.holds_awake());
        assert!(ExecFlags::CRITICAL.holds_awake());
    }

    #[test]
    fn display_formatting() {
        assert_eq!(ExecFlags::UNKNOWN.to_string(), "(none)");
        assert_eq!(ExecFlags::CLEAR.to_string(), "CONTINUOUS");
        assert_eq!(
            ExecFlags::DISPLAY.to_string(),
            "CONTINUOUS | SYSTEM_REQUIRED | DISPLAY_REQUIRED"
        );
        assert_eq!(
            ExecFlags::from_bits_retain(0x8000_0100).to_string(),
            "CONTINUOUS | 0x00000100"
        );
    }

    #[test]
    fn serializes_as_raw_bits() {
        let json = serde_json::to_string(&ExecFlags::SYSTEM).expect("serialize");
        assert_eq!(json, "2147483649");

        let parsed: ExecFlags = serde_json::from_str("2147483715").expect("deserialize");
        assert_eq!(parsed, ExecFlags::CRITICAL | ExecFlags::DISPLAY_REQUIRED);
    }

    #[test]
    fn deserialize_keeps_unnamed_bits() {
        let parsed: ExecFlags = serde_json::from_str("256").expect("deserialize");
        assert_eq!(parsed.bits(), 256);
    }
}
