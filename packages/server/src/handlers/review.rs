use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::ReviewStatus;
use review_core::Submitter;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::analytics::{AnalyticsService, mean_rating};
use crate::entity::{review, site};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::client::ClientInfo;
use crate::extractors::json::AppJson;
use crate::handlers::site::find_owned_site;
use crate::models::review::*;
use crate::models::shared::Pagination;
use crate::state::AppState;

/// Shared by the review API and the widget.
pub(crate) async fn public_reviews(
    state: &AppState,
    site_id: Uuid,
) -> Result<PublicReviewsResponse, AppError> {
    let reviews = state.reviews.public_reviews_for(site_id).await?;
    Ok(reviews.into())
}

/// Shared by the review API and the widget.
pub(crate) async fn submit(
    state: &AppState,
    site_id: Uuid,
    client: ClientInfo,
    payload: SubmitReviewRequest,
) -> Result<SubmittedReviewResponse, AppError> {
    let submission = payload.into_submission()?;
    let submitter = Submitter {
        ip_address: client.ip,
        user_agent: client.user_agent,
    };
    let submitted = state.reviews.submit(site_id, submission, submitter).await?;
    Ok(submitted.into())
}

#[utoipa::path(
    get,
    path = "/site/{site_id}",
    tag = "Reviews",
    operation_id = "getPublicReviews",
    summary = "Approved reviews of a site",
    description = "Public. Returns up to 50 approved reviews, newest first, without submitter details.",
    params(("site_id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Approved reviews", body = PublicReviewsResponse),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_public_reviews(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
) -> Result<Json<PublicReviewsResponse>, AppError> {
    Ok(Json(public_reviews(&state, site_id).await?))
}

#[utoipa::path(
    post,
    path = "/site/{site_id}",
    tag = "Reviews",
    operation_id = "submitReview",
    summary = "Submit a review",
    description = "Public. The review is `PENDING` on plans with moderation and `APPROVED` otherwise. \
        One review per IP and email per site in 24 hours; FREE sites accept a limited number of reviews per calendar month.",
    params(("site_id" = Uuid, Path, description = "Site ID")),
    request_body = SubmitReviewRequest,
    responses(
        (status = 201, description = "Review accepted", body = SubmittedReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Duplicate within 24 hours (DUPLICATE_REVIEW)", body = ErrorBody),
        (status = 429, description = "Monthly quota reached (QUOTA_EXCEEDED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, client, payload))]
pub async fn submit_review(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
    client: ClientInfo,
    AppJson(payload): AppJson<SubmitReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let submitted = submit(&state, site_id, client, payload).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

#[utoipa::path(
    get,
    path = "/my",
    tag = "Reviews",
    operation_id = "listMyReviews",
    summary = "Reviews across the owner's sites",
    description = "Paginated, newest first. Filtering by a site the caller does not own returns 403.",
    params(MyReviewsQuery),
    responses(
        (status = 200, description = "Owner's reviews", body = MyReviewsResponse),
        (status = 400, description = "Unknown `status` (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner of `site_id` (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_my_reviews(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<MyReviewsQuery>,
) -> Result<Json<MyReviewsResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.limit.unwrap_or(20).clamp(1, 100);
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ReviewStatus>)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let sites = site::Entity::find()
        .filter(site::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(site::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let site_ids: Vec<Uuid> = match query.site_id {
        Some(id) if sites.iter().any(|s| s.id == id) => vec![id],
        Some(_) => {
            return Err(AppError::PermissionDenied(
                "You do not have access to this site".into(),
            ));
        }
        None => sites.iter().map(|s| s.id).collect(),
    };

    let mut select = review::Entity::find().filter(review::Column::SiteId.is_in(site_ids));
    if let Some(status) = status {
        select = select.filter(review::Column::Status.eq(status));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let data = select
        .order_by_desc(review::Column::CreatedAt)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(OwnerReviewResponse::from)
        .collect();

    Ok(Json(MyReviewsResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
        sites: sites
            .into_iter()
            .map(|s| SiteOption {
                id: s.id,
                name: s.name,
                plan: s.plan,
            })
            .collect(),
    }))
}

#[utoipa::path(
    put,
    path = "/{id}/status",
    tag = "Reviews",
    operation_id = "updateReviewStatus",
    summary = "Moderate a review",
    description = "Sets any status. Only the site owner may do this, and only on plans with moderation.",
    params(("id" = Uuid, Path, description = "Review ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OwnerReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED) or plan without moderation (PLAN_RESTRICTED)", body = ErrorBody),
        (status = 404, description = "Review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, status = %payload.status))]
pub async fn update_review_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> Result<Json<OwnerReviewResponse>, AppError> {
    let updated = state
        .reviews
        .set_status(id, auth_user.user_id, payload.status)
        .await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Reviews",
    operation_id = "deleteReview",
    summary = "Delete a review",
    description = "Permanently removes a review. Only the site owner may do this.",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.reviews.delete(id, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/site/{site_id}/stats",
    tag = "Reviews",
    operation_id = "getSiteReviewStats",
    summary = "Review counts and ratings of a site",
    params(("site_id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Review statistics", body = SiteReviewStatsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_site_review_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
) -> Result<Json<SiteReviewStatsResponse>, AppError> {
    let site = find_owned_site(&state.db, site_id, auth_user.user_id).await?;

    let by_status: Vec<(ReviewStatus, i64)> = review::Entity::find()
        .select_only()
        .column(review::Column::Status)
        .column_as(review::Column::Id.count(), "count")
        .filter(review::Column::SiteId.eq(site.id))
        .group_by(review::Column::Status)
        .into_tuple()
        .all(&state.db)
        .await?;
    let count_of = |status: ReviewStatus| {
        by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n as u64)
    };

    let rating_distribution = AnalyticsService::new(&state.db, state.reviews.now())
        .rating_distribution(site.id)
        .await?;

    Ok(Json(SiteReviewStatsResponse {
        site: PublicSiteInfo {
            id: site.id,
            name: site.name,
        },
        stats: ReviewStats {
            total: by_status.iter().map(|(_, n)| *n as u64).sum(),
            approved: count_of(ReviewStatus::Approved),
            pending: count_of(ReviewStatus::Pending),
            hidden: count_of(ReviewStatus::Hidden),
            average_rating: mean_rating(&rating_distribution),
            rating_distribution,
        },
    }))
}
