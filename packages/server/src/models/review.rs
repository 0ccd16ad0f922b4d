use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{ReviewStatus, Tier};
use review_core::{PublicReviews, ReviewRecord, ReviewSubmission, SubmittedReview};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::shared::{Pagination, validate_email, validate_length};

/// Review posted by a visitor from the widget or the public API.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitReviewRequest {
    /// 2-50 characters.
    #[schema(example = "Maria")]
    pub author_name: String,
    #[schema(example = "m@x.com")]
    pub author_email: Option<String>,
    /// 1 to 5.
    #[schema(example = 5)]
    pub rating: i32,
    /// 10-1000 characters.
    #[schema(example = "Great service overall!")]
    pub comment: String,
}

impl SubmitReviewRequest {
    /// Validate and normalize into the core submission type.
    pub fn into_submission(self) -> Result<ReviewSubmission, AppError> {
        validate_length(&self.author_name, "Author name", 2, 50)?;
        let author_email = self
            .author_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        if let Some(ref email) = author_email {
            validate_email(email)?;
        }
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::Validation(
                "Rating must be between 1 and 5".into(),
            ));
        }
        validate_length(&self.comment, "Comment", 10, 1000)?;

        Ok(ReviewSubmission {
            author_name: self.author_name.trim().to_string(),
            author_email,
            rating: self.rating,
            comment: self.comment.trim().to_string(),
        })
    }
}

/// Echo of an accepted submission.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmittedReviewResponse {
    pub id: Uuid,
    pub author_name: String,
    pub rating: i32,
    pub comment: String,
    /// `APPROVED` on plans without moderation, otherwise `PENDING`.
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

impl From<SubmittedReview> for SubmittedReviewResponse {
    fn from(r: SubmittedReview) -> Self {
        Self {
            id: r.id,
            author_name: r.author_name,
            rating: r.rating,
            comment: r.comment,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicSiteInfo {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicReviewItem {
    pub id: Uuid,
    pub author_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Approved reviews of a site, newest first, at most 50.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicReviewsResponse {
    pub site: PublicSiteInfo,
    pub reviews: Vec<PublicReviewItem>,
    /// Number of reviews in this response.
    pub total: usize,
}

impl From<PublicReviews> for PublicReviewsResponse {
    fn from(p: PublicReviews) -> Self {
        Self {
            site: PublicSiteInfo {
                id: p.site.id,
                name: p.site.name,
            },
            reviews: p
                .reviews
                .into_iter()
                .map(|r| PublicReviewItem {
                    id: r.id,
                    author_name: r.author_name,
                    rating: r.rating,
                    comment: r.comment,
                    created_at: r.created_at,
                })
                .collect(),
            total: p.total,
        }
    }
}

/// Query parameters for the owner's review list.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MyReviewsQuery {
    /// Restrict to one of the owner's sites.
    pub site_id: Option<Uuid>,
    /// One of PENDING, APPROVED, HIDDEN, DELETED.
    pub status: Option<String>,
    /// Page number (default: 1).
    pub page: Option<u64>,
    /// Items per page (default: 20, max: 100).
    pub limit: Option<u64>,
}

/// A review as seen by the site owner, including submitter details.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OwnerReviewResponse {
    pub id: Uuid,
    pub site_id: Uuid,
    pub author_name: String,
    pub author_email: Option<String>,
    pub rating: i32,
    pub comment: String,
    pub status: ReviewStatus,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewRecord> for OwnerReviewResponse {
    fn from(r: ReviewRecord) -> Self {
        Self {
            id: r.id,
            site_id: r.site_id,
            author_name: r.author_name,
            author_email: r.author_email,
            rating: r.rating,
            comment: r.comment,
            status: r.status,
            ip_address: r.ip_address,
            user_agent: r.user_agent,
            country: r.country,
            created_at: r.created_at,
        }
    }
}

impl From<crate::entity::review::Model> for OwnerReviewResponse {
    fn from(r: crate::entity::review::Model) -> Self {
        ReviewRecord::from(r).into()
    }
}

/// Entry of the site filter dropdown.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SiteOption {
    pub id: Uuid,
    pub name: String,
    pub plan: Tier,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MyReviewsResponse {
    pub data: Vec<OwnerReviewResponse>,
    pub pagination: Pagination,
    /// All sites the owner can filter by.
    pub sites: Vec<SiteOption>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(example = "APPROVED")]
    pub status: ReviewStatus,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewStats {
    pub total: u64,
    pub approved: u64,
    pub pending: u64,
    pub hidden: u64,
    /// Mean rating of approved reviews, one decimal place.
    #[schema(example = 4.6)]
    pub average_rating: f64,
    /// Approved review count per star rating, keys "1" to "5".
    pub rating_distribution: BTreeMap<String, u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SiteReviewStatsResponse {
    pub site: PublicSiteInfo,
    pub stats: ReviewStats,
}
