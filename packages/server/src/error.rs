use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use review_core::ReviewError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`,
    /// `PLAN_RESTRICTED`, `NOT_FOUND`, `EMAIL_TAKEN`, `DUPLICATE_REVIEW`,
    /// `QUOTA_EXCEEDED`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Rating must be between 1 and 5")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied(String),
    /// The site's plan does not include the feature.
    PlanRestricted(String),
    NotFound(String),
    EmailTaken,
    DuplicateReview,
    QuotaExceeded(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".into(),
            ),
            AppError::PermissionDenied(msg) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED", msg),
            AppError::PlanRestricted(msg) => (StatusCode::FORBIDDEN, "PLAN_RESTRICTED", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "Email is already registered".into(),
            ),
            AppError::DuplicateReview => (
                StatusCode::CONFLICT,
                "DUPLICATE_REVIEW",
                "You have already submitted a review in the last 24 hours".into(),
            ),
            AppError::QuotaExceeded(msg) => (StatusCode::TOO_MANY_REQUESTS, "QUOTA_EXCEEDED", msg),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                )
            }
        };
        (status, ErrorBody { code, message })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::SiteNotFound => AppError::NotFound("Site not found".into()),
            ReviewError::ReviewNotFound => AppError::NotFound("Review not found".into()),
            ReviewError::AccessDenied => {
                AppError::PermissionDenied("You do not have access to this review".into())
            }
            ReviewError::ModerationNotAvailable => AppError::PlanRestricted(
                "Review moderation is only available on the PREMIUM plan".into(),
            ),
            ReviewError::DuplicateSubmission => AppError::DuplicateReview,
            ReviewError::QuotaExceeded { limit } => AppError::QuotaExceeded(format!(
                "This site has reached its limit of {limit} reviews this month"
            )),
            ReviewError::InvalidTier(e) => AppError::Internal(e.to_string()),
            ReviewError::Storage(e) => AppError::Internal(e.to_string()),
        }
    }
}
