//! Tier policy: the static table behind every quota and feature decision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fast model served to free and starter generations.
pub const STANDARD_MODEL: &str = "claude-haiku-4-5";
/// Model served to pro generations and to every analysis call.
pub const ADVANCED_MODEL: &str = "claude-sonnet-4-5";

/// Subscription tier levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Starter,
    Pro,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Free, Tier::Starter, Tier::Pro];

    /// Monthly generation quota for this tier.
    pub const fn quota(&self) -> Quota {
        match self {
            Self::Free => Quota::Limited(10),
            Self::Starter => Quota::Limited(50),
            Self::Pro => Quota::Unlimited,
        }
    }

    /// How many variants the single-prompt flow asks the model for.
    pub const fn variant_count(&self) -> u8 {
        match self {
            Self::Free => 2,
            Self::Starter => 3,
            Self::Pro => 5,
        }
    }

    pub const fn generation_model(&self) -> &'static str {
        match self {
            Self::Free | Self::Starter => STANDARD_MODEL,
            Self::Pro => ADVANCED_MODEL,
        }
    }

    /// Display-facing name of the model behind this tier.
    pub const fn model_label(&self) -> &'static str {
        match self {
            Self::Free | Self::Starter => "Claude Haiku",
            Self::Pro => "Claude Sonnet",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Pro => "pro",
        }
    }

    /// Parses a tier name, falling back to `Free` for anything unrecognised.
    pub fn from_name_or_free(name: &str) -> Self {
        name.parse().unwrap_or(Self::Free)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "starter" => Ok(Self::Starter),
            "pro" => Ok(Self::Pro),
            _ => Err(TierParseError(s.to_string())),
        }
    }
}

/// Error parsing a tier string
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid tier: {0}")]
pub struct TierParseError(pub String);

/// Lookup used by every caller that only has a tier name.
pub fn limit_for(tier: Tier) -> Quota {
    tier.quota()
}

/// A monthly generation quota. On the wire `Unlimited` is the `-1` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Limited(u32),
    Unlimited,
}

impl Quota {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// True while `current` is still under the quota.
    pub fn allows(&self, current: i64) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Limited(limit) => current < i64::from(*limit),
        }
    }

    /// Raw usage percentage. Not clamped: an overrun reads above 100.
    pub fn percentage(&self, current: i64) -> f64 {
        match self {
            Self::Unlimited | Self::Limited(0) => 0.0,
            Self::Limited(limit) => 100.0 * current as f64 / f64::from(*limit),
        }
    }

    pub fn as_sentinel(&self) -> i64 {
        match self {
            Self::Unlimited => -1,
            Self::Limited(limit) => i64::from(*limit),
        }
    }

    pub fn from_sentinel(value: i64) -> Self {
        if value < 0 {
            Self::Unlimited
        } else {
            Self::Limited(u32::try_from(value).unwrap_or(u32::MAX))
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::Limited(limit) => write!(f, "{limit}"),
        }
    }
}

impl Serialize for Quota {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_sentinel())
    }
}

impl<'de> Deserialize<'de> for Quota {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::from_sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_limits() {
        assert_eq!(limit_for(Tier::Free), Quota::Limited(10));
        assert_eq!(limit_for(Tier::Starter), Quota::Limited(50));
        assert_eq!(limit_for(Tier::Pro), Quota::Unlimited);
    }

    #[test]
    fn test_unknown_tier_falls_back_to_free() {
        assert_eq!(Tier::from_name_or_free("enterprise"), Tier::Free);
        assert_eq!(Tier::from_name_or_free(""), Tier::Free);
        assert_eq!(limit_for(Tier::from_name_or_free("gold")), Quota::Limited(10));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("PRO".parse::<Tier>().unwrap(), Tier::Pro);
        assert_eq!(" Starter ".parse::<Tier>().unwrap(), Tier::Starter);
        assert!("platinum".parse::<Tier>().is_err());
    }

    #[test]
    fn test_quota_allows() {
        let free = Tier::Free.quota();
        assert!(free.allows(9));
        assert!(!free.allows(10));
        assert!(!free.allows(11));
        assert!(Quota::Unlimited.allows(1_000_000));
    }

    #[test]
    fn test_percentage_is_not_clamped() {
        assert_eq!(Quota::Limited(10).percentage(5), 50.0);
        assert_eq!(Quota::Limited(10).percentage(12), 120.0);
        assert_eq!(Quota::Unlimited.percentage(500), 0.0);
    }

    #[test]
    fn test_quota_wire_format_uses_sentinel() {
        assert_eq!(serde_json::to_string(&Quota::Unlimited).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&Quota::Limited(50)).unwrap(), "50");
        let parsed: Quota = serde_json::from_str("-1").unwrap();
        assert_eq!(parsed, Quota::Unlimited);
    }

    #[test]
    fn test_variant_counts_and_labels() {
        assert_eq!(Tier::Free.variant_count(), 2);
        assert_eq!(Tier::Starter.variant_count(), 3);
        assert_eq!(Tier::Pro.variant_count(), 5);
        assert_eq!(Tier::Pro.generation_model(), ADVANCED_MODEL);
        assert_ne!(Tier::Free.model_label(), Tier::Pro.model_label());
    }
}
