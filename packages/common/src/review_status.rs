#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Moderation status of a review.
///
/// A flat set of states: an owner may move a review to any of them directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    /// Waiting for the site owner.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PENDING"))]
    Pending,
    /// Visible in the widget and public API.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "APPROVED"))]
    Approved,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "HIDDEN"))]
    Hidden,
    /// Soft-deleted by the owner; the row is kept.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DELETED"))]
    Deleted,
}

impl ReviewStatus {
    pub const ALL: &'static [ReviewStatus] =
        &[Self::Pending, Self::Approved, Self::Hidden, Self::Deleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Hidden => "HIDDEN",
            Self::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid,
            ReviewStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for ReviewStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "HIDDEN" => Ok(Self::Hidden),
            "DELETED" => Ok(Self::Deleted),
            _ => Err(ParseStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}
