//! Certificate validity profiles.
//!
//! Named durations for the `spec.expirationSeconds` field of the signing
//! request. An explicit `--expire` override wins over the profile; an
//! override of `0` counts as unset so the profile value still applies.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Validity profiles
// ─────────────────────────────────────────────────────────────────────────────

/// Named certificate validity durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidityProfile {
    /// 1 day.
    Short,
    /// 7 days.
    Default,
    /// 30 days.
    Long,
    /// 365 days.
    Maximum,
}

impl ValidityProfile {
    /// Fixed duration of this profile in seconds.
    pub fn as_secs(self) -> u32 {
        match self {
            Self::Short => 86_400,
            Self::Default => 604_800,
            Self::Long => 2_592_000,
            Self::Maximum => 31_536_000,
        }
    }

    /// Parse a profile name, falling back to [`ValidityProfile::Default`]
    /// for anything unrecognised.
    pub fn from_name(name: &str) -> Self {
        match name {
            "short" => Self::Short,
            "long" => Self::Long,
            "maximum" => Self::Maximum,
            _ => Self::Default,
        }
    }
}

/// Resolve the effective expiration in seconds.
///
/// A present, non-zero `override_secs` always wins; otherwise the profile's
/// fixed duration applies.
pub fn resolve_expiration(profile: ValidityProfile, override_secs: Option<u32>) -> u32 {
    override_secs
        .filter(|s| *s > 0)
        .unwrap_or_else(|| profile.as_secs())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_durations_are_fixed() {
        assert_eq!(ValidityProfile::Short.as_secs(), 86_400);
        assert_eq!(ValidityProfile::Default.as_secs(), 604_800);
        assert_eq!(ValidityProfile::Long.as_secs(), 2_592_000);
        assert_eq!(ValidityProfile::Maximum.as_secs(), 31_536_000);
    }

    #[test]
    fn override_wins_over_any_profile() {
        assert_eq!(resolve_expiration(ValidityProfile::Short, Some(42)), 42);
        assert_eq!(resolve_expiration(ValidityProfile::Maximum, Some(42)), 42);
    }

    #[test]
    fn absent_override_yields_profile_value() {
        assert_eq!(resolve_expiration(ValidityProfile::Long, None), 2_592_000);
    }

    #[test]
    fn zero_override_counts_as_unset() {
        // Matches the original truthiness semantics: 0 falls through.
        assert_eq!(resolve_expiration(ValidityProfile::Short, Some(0)), 86_400);
    }

    #[test]
    fn unrecognised_profile_name_falls_back_to_default() {
        assert_eq!(ValidityProfile::from_name("forever"), ValidityProfile::Default);
        assert_eq!(
            resolve_expiration(ValidityProfile::from_name("forever"), None),
            604_800
        );
    }

    #[test]
    fn known_profile_names_parse() {
        assert_eq!(ValidityProfile::from_name("short"), ValidityProfile::Short);
        assert_eq!(ValidityProfile::from_name("long"), ValidityProfile::Long);
        assert_eq!(ValidityProfile::from_name("maximum"), ValidityProfile::Maximum);
        assert_eq!(ValidityProfile::from_name("default"), ValidityProfile::Default);
    }
}
