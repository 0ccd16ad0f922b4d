use common::InvalidTier;
use thiserror::Error;

/// Failure reported by a storage backend.
///
/// Opaque to the rules in this crate; the server wraps `sea_orm::DbErr` here.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct StorageError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl StorageError {
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Box::new(err))
    }
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Site not found")]
    SiteNotFound,

    #[error("Review not found")]
    ReviewNotFound,

    #[error("You do not own this site")]
    AccessDenied,

    #[error("Moderation is not available on this plan")]
    ModerationNotAvailable,

    #[error("A review from this address was already submitted in the last 24 hours")]
    DuplicateSubmission,

    #[error("Monthly review limit of {limit} reached for this site")]
    QuotaExceeded { limit: u32 },

    #[error(transparent)]
    InvalidTier(#[from] InvalidTier),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
