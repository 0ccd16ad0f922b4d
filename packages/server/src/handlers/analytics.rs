use axum::Json;
use axum::extract::{Path, Query, State};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::analytics::{AnalyticsService, Period};
use crate::entity::site;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::analytics::*;
use crate::state::AppState;

/// A site of the caller. Other owners' sites are reported as missing.
async fn find_analytics_site(
    state: &AppState,
    site_id: Uuid,
    user_id: i32,
) -> Result<site::Model, AppError> {
    site::Entity::find_by_id(site_id)
        .filter(site::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Site not found".into()))
}

fn require_analytics(state: &AppState, site: &site::Model) -> Result<(), AppError> {
    let limits = state
        .reviews
        .plans()
        .limits_for(site.plan)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !limits.analytics_enabled {
        return Err(AppError::PlanRestricted(format!(
            "Detailed analytics are not available on the {} plan",
            site.plan
        )));
    }
    Ok(())
}

fn service(state: &AppState) -> AnalyticsService<'_, DatabaseConnection> {
    AnalyticsService::new(&state.db, state.reviews.now())
}

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Analytics",
    operation_id = "getDashboard",
    summary = "Totals across the owner's sites",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_dashboard(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(service(&state).dashboard(auth_user.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/overview",
    tag = "Analytics",
    operation_id = "getOverview",
    summary = "Compact dashboard totals",
    responses(
        (status = 200, description = "Overview", body = OverviewResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_overview(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<OverviewResponse>, AppError> {
    let stats = service(&state).dashboard(auth_user.user_id).await?;
    Ok(Json(stats.into()))
}

#[utoipa::path(
    get,
    path = "/site/{id}",
    tag = "Analytics",
    operation_id = "getSiteAnalytics",
    summary = "Detailed analytics of one site",
    description = "Requires a plan with analytics. Sites of other owners are reported as not found.",
    params(("id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Site analytics", body = SiteAnalyticsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Plan without analytics (PLAN_RESTRICTED)", body = ErrorBody),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_site_analytics(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SiteAnalyticsResponse>, AppError> {
    let site = find_analytics_site(&state, id, auth_user.user_id).await?;
    require_analytics(&state, &site)?;
    Ok(Json(service(&state).site_analytics(site).await?))
}

#[utoipa::path(
    get,
    path = "/site/{id}/comparison",
    tag = "Analytics",
    operation_id = "getSiteComparison",
    summary = "Current period against the previous one",
    params(("id" = Uuid, Path, description = "Site ID"), ComparisonQuery),
    responses(
        (status = 200, description = "Period comparison", body = ComparisonResponse),
        (status = 400, description = "Unknown period (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn get_site_comparison(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ComparisonQuery>,
) -> Result<Json<ComparisonResponse>, AppError> {
    let period: Period = query
        .period
        .as_deref()
        .unwrap_or("month")
        .parse()
        .map_err(AppError::Validation)?;

    let site = find_analytics_site(&state, id, auth_user.user_id).await?;
    Ok(Json(service(&state).comparison(site.id, period).await?))
}

#[utoipa::path(
    get,
    path = "/sites/{id}/quick-stats",
    tag = "Analytics",
    operation_id = "getQuickStats",
    summary = "Headline numbers of one site",
    params(("id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Quick statistics", body = QuickStatsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Plan without analytics (PLAN_RESTRICTED)", body = ErrorBody),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_quick_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuickStatsResponse>, AppError> {
    let site = find_analytics_site(&state, id, auth_user.user_id).await?;
    require_analytics(&state, &site)?;

    let stats = service(&state).site_stats(site.id).await?;
    Ok(Json(QuickStatsResponse {
        total_reviews: stats.total_reviews,
        avg_rating: stats.avg_rating,
        conversion_rate: stats.conversion_rate,
        pending_reviews: stats.pending_reviews,
    }))
}
