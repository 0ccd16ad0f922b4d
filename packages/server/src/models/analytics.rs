use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{ReviewStatus, Tier};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Totals across all of the owner's sites.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct DashboardStats {
    /// Approved and pending reviews.
    pub total_reviews: u64,
    pub this_month_reviews: u64,
    pub avg_rating: f64,
    pub total_views: u64,
    /// Reviews per 100 widget views.
    pub conversion_rate: f64,
    pub active_sites: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OverviewResponse {
    pub total_reviews: u64,
    pub this_month_reviews: u64,
    pub active_sites: u64,
    pub conversion_rate: f64,
}

impl From<DashboardStats> for OverviewResponse {
    fn from(d: DashboardStats) -> Self {
        Self {
            total_reviews: d.total_reviews,
            this_month_reviews: d.this_month_reviews,
            active_sites: d.active_sites,
            conversion_rate: d.conversion_rate,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SiteInfo {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    pub plan: Tier,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SiteStats {
    /// Reviews in any status except `DELETED`.
    pub total_reviews: u64,
    pub approved_reviews: u64,
    pub pending_reviews: u64,
    pub total_views: u64,
    pub conversion_rate: f64,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct MonthlyPoint {
    /// `YYYY-MM`.
    #[schema(example = "2025-06")]
    pub month: String,
    pub reviews: u64,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct CountryStat {
    pub country: String,
    pub views: u64,
    pub reviews: u64,
}

/// One entry of the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Activity {
    Review {
        id: Uuid,
        date: DateTime<Utc>,
        author: String,
        rating: i32,
        status: ReviewStatus,
        country: Option<String>,
    },
    View {
        id: Uuid,
        date: DateTime<Utc>,
        country: Option<String>,
        referer: Option<String>,
    },
}

impl Activity {
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            Activity::Review { date, .. } | Activity::View { date, .. } => *date,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SiteAnalyticsResponse {
    pub site_info: SiteInfo,
    pub stats: SiteStats,
    /// Approved review count per star rating, keys "1" to "5".
    pub rating_distribution: BTreeMap<String, u64>,
    /// Last six months, oldest first. Months with no activity are omitted.
    pub monthly_trend: Vec<MonthlyPoint>,
    pub top_countries: Vec<CountryStat>,
    pub recent_activity: Vec<Activity>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuickStatsResponse {
    pub total_reviews: u64,
    pub avg_rating: f64,
    pub conversion_rate: f64,
    pub pending_reviews: u64,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ComparisonQuery {
    /// `week` or `month` (default: `month`).
    pub period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct PeriodStats {
    pub reviews: u64,
    pub views: u64,
    pub avg_rating: f64,
    pub conversion_rate: f64,
}

/// Percentage change from the previous period to the current one.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct PeriodChanges {
    pub reviews_change: f64,
    pub views_change: f64,
    pub conversion_change: f64,
    pub rating_change: f64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ComparisonResponse {
    #[schema(example = "month")]
    pub period: String,
    pub current: PeriodStats,
    pub previous: PeriodStats,
    pub changes: PeriodChanges,
}
