use chrono::{DateTime, Utc};
use common::{ReviewStatus, Tier};
use serde::Serialize;
use uuid::Uuid;

/// What the rules need to know about a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    pub id: Uuid,
    pub owner_id: i32,
    pub name: String,
    pub tier: Tier,
    pub is_active: bool,
}

/// A stored review, including the private submitter fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRecord {
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

/// Insert payload. The repository assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
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

/// Conjunction of optional equality and lower-bound predicates over reviews.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub status: Option<ReviewStatus>,
    pub ip_address: Option<String>,
    pub author_email: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_since: Option<DateTime<Utc>>,
}

impl ReviewFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn for_site(site_id: Uuid) -> Self {
        Self {
            site_id: Some(site_id),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: ReviewStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_submitter(mut self, ip_address: &str, author_email: &str) -> Self {
        self.ip_address = Some(ip_address.to_string());
        self.author_email = Some(author_email.to_string());
        self
    }

    pub fn created_since(mut self, since: DateTime<Utc>) -> Self {
        self.created_since = Some(since);
        self
    }

    /// Evaluate the filter against a record.
    pub fn matches(&self, review: &ReviewRecord) -> bool {
        self.id.is_none_or(|id| review.id == id)
            && self.site_id.is_none_or(|id| review.site_id == id)
            && self.status.is_none_or(|s| review.status == s)
            && self
                .ip_address
                .as_deref()
                .is_none_or(|ip| review.ip_address.as_deref() == Some(ip))
            && self
                .author_email
                .as_deref()
                .is_none_or(|email| review.author_email.as_deref() == Some(email))
            && self.created_since.is_none_or(|since| review.created_at >= since)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Already-validated review content from a visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSubmission {
    pub author_name: String,
    pub author_email: Option<String>,
    pub rating: i32,
    pub comment: String,
}

/// Request metadata of the visitor submitting a review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submitter {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Result of a successful submission. Private submitter fields are not echoed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedReview {
    pub id: Uuid,
    pub author_name: String,
    pub rating: i32,
    pub comment: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewRecord> for SubmittedReview {
    fn from(r: ReviewRecord) -> Self {
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicSite {
    pub id: Uuid,
    pub name: String,
}

/// An approved review as shown to anonymous visitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicReview {
    pub id: Uuid,
    pub author_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewRecord> for PublicReview {
    fn from(r: ReviewRecord) -> Self {
        Self {
            id: r.id,
            author_name: r.author_name,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicReviews {
    pub site: PublicSite,
    pub reviews: Vec<PublicReview>,
    pub total: usize,
}
