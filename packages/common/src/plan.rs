#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Subscription tier of a site.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum Tier {
    /// One site, 50 reviews a month, auto-approved.
    #[default]
    #[serde(rename = "FREE", alias = "free")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "FREE"))]
    Free,
    /// Up to five sites, unlimited reviews, manual moderation and analytics.
    #[serde(rename = "PREMIUM", alias = "premium")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PREMIUM"))]
    Premium,
}

impl Tier {
    pub const ALL: &'static [Tier] = &[Self::Free, Self::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Premium => "PREMIUM",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tier name that is not part of the plan table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid tier '{0}'. Valid values: FREE, PREMIUM")]
pub struct InvalidTier(pub String);

/// Case-insensitive, matching the lower-case serde aliases.
impl FromStr for Tier {
    type Err = InvalidTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FREE" => Ok(Self::Free),
            "PREMIUM" => Ok(Self::Premium),
            _ => Err(InvalidTier(s.to_string())),
        }
    }
}

/// Limits and feature gates attached to a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PlanLimits {
    /// How many sites one user may own.
    #[schema(example = 1)]
    pub max_sites_per_user: u32,
    /// Reviews accepted per site per calendar month. `None` means unlimited.
    #[schema(example = 50)]
    pub max_reviews_per_month: Option<u32>,
    /// New reviews start as `PENDING` and wait for the owner.
    pub moderation_required: bool,
    pub analytics_enabled: bool,
    #[serde(default)]
    pub custom_branding: bool,
}

impl PlanLimits {
    pub fn free() -> Self {
        Self {
            max_sites_per_user: 1,
            max_reviews_per_month: Some(50),
            moderation_required: false,
            analytics_enabled: false,
            custom_branding: false,
        }
    }

    pub fn premium() -> Self {
        Self {
            max_sites_per_user: 5,
            max_reviews_per_month: None,
            moderation_required: true,
            analytics_enabled: true,
            custom_branding: true,
        }
    }

    /// Returns true when `count` reviews this month already reach the monthly cap.
    pub fn is_quota_reached(&self, count: u64) -> bool {
        self.max_reviews_per_month
            .is_some_and(|limit| count >= u64::from(limit))
    }
}

/// Tier to limits table.
///
/// Loaded from the `plans` configuration section; the default is the
/// FREE/PREMIUM table the product ships with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanPolicy {
    plans: BTreeMap<Tier, PlanLimits>,
}

impl PlanPolicy {
    pub fn new(plans: impl IntoIterator<Item = (Tier, PlanLimits)>) -> Self {
        Self {
            plans: plans.into_iter().collect(),
        }
    }

    /// Look up the limits for `tier`.
    pub fn limits_for(&self, tier: Tier) -> Result<&PlanLimits, InvalidTier> {
        self.plans
            .get(&tier)
            .ok_or_else(|| InvalidTier(tier.to_string()))
    }

    /// Parse `name` and look up its limits.
    pub fn limits_for_name(&self, name: &str) -> Result<&PlanLimits, InvalidTier> {
        let tier: Tier = name.parse()?;
        self.limits_for(tier)
    }

    /// Tiers present in the table.
    pub fn tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        self.plans.keys().copied()
    }

    /// Fail on the first known tier that has no limits configured.
    pub fn ensure_complete(&self) -> Result<(), InvalidTier> {
        for tier in Tier::ALL {
            self.limits_for(*tier)?;
        }
        Ok(())
    }

    /// Replace the limits of one tier.
    pub fn with_limits(mut self, tier: Tier, limits: PlanLimits) -> Self {
        self.plans.insert(tier, limits);
        self
    }
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self::new([
            (Tier::Free, PlanLimits::free()),
            (Tier::Premium, PlanLimits::premium()),
        ])
    }
}
