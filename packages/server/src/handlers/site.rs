use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::Tier;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{review, site, widget_view};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::site::*;
use crate::models::widget::{default_settings, merge_settings};
use crate::state::AppState;

/// Load a site or 404.
pub(crate) async fn find_site<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<site::Model, AppError> {
    site::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Site not found".into()))
}

/// Load a site the caller owns. Someone else's site is 403, a missing one 404.
pub(crate) async fn find_owned_site<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    user_id: i32,
) -> Result<site::Model, AppError> {
    let site = find_site(db, id).await?;
    if site.user_id != user_id {
        return Err(AppError::PermissionDenied(
            "You do not have access to this site".into(),
        ));
    }
    Ok(site)
}

/// The owner's plan is carried by their sites; owners without sites are on FREE.
async fn owner_plan<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Tier, DbErr> {
    let plan: Option<Tier> = site::Entity::find()
        .select_only()
        .column(site::Column::Plan)
        .filter(site::Column::UserId.eq(user_id))
        .order_by_asc(site::Column::CreatedAt)
        .into_tuple()
        .one(db)
        .await?;
    Ok(plan.unwrap_or_default())
}

async fn review_count<C: ConnectionTrait>(db: &C, site_id: Uuid) -> Result<u64, DbErr> {
    review::Entity::find()
        .filter(review::Column::SiteId.eq(site_id))
        .count(db)
        .await
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Sites",
    operation_id = "createSite",
    summary = "Create a site",
    description = "Creates a site on the owner's current plan. Fails with `PLAN_RESTRICTED` once the plan's site limit is reached.",
    request_body = CreateSiteRequest,
    responses(
        (status = 201, description = "Site created", body = SiteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Site limit reached (PLAN_RESTRICTED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, name = %payload.name))]
pub async fn create_site(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSiteRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_site(&payload)?;

    let plan = owner_plan(&state.db, auth_user.user_id).await?;
    let limits = state
        .reviews
        .plans()
        .limits_for(plan)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let owned = site::Entity::find()
        .filter(site::Column::UserId.eq(auth_user.user_id))
        .count(&state.db)
        .await?;
    if owned >= u64::from(limits.max_sites_per_user) {
        return Err(AppError::PlanRestricted(format!(
            "The {plan} plan allows at most {} site(s)",
            limits.max_sites_per_user
        )));
    }

    let settings = match payload.settings {
        Some(ref overlay) => merge_settings(&default_settings(), overlay),
        None => default_settings(),
    };

    let now = chrono::Utc::now();
    let new_site = site::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(auth_user.user_id),
        name: Set(payload.name.trim().to_string()),
        domain: Set(payload.domain.trim().to_string()),
        plan: Set(plan),
        is_active: Set(true),
        settings: Set(settings),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_site.insert(&state.db).await?;
    tracing::info!(site_id = %model.id, %plan, "Site created");

    Ok((StatusCode::CREATED, Json(SiteResponse::new(model, 0))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Sites",
    operation_id = "listSites",
    summary = "List the owner's sites",
    description = "Returns every site of the caller, newest first, with its review count.",
    responses(
        (status = 200, description = "Owner's sites", body = SiteListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_sites(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SiteListResponse>, AppError> {
    let data = site::Entity::find()
        .select_only()
        .column(site::Column::Id)
        .column(site::Column::Name)
        .column(site::Column::Domain)
        .column(site::Column::Plan)
        .column(site::Column::IsActive)
        .column(site::Column::CreatedAt)
        .column_as(review::Column::Id.count(), "review_count")
        .left_join(review::Entity)
        .filter(site::Column::UserId.eq(auth_user.user_id))
        .group_by(site::Column::Id)
        .order_by_desc(site::Column::CreatedAt)
        .into_model::<SiteListItem>()
        .all(&state.db)
        .await?;

    Ok(Json(SiteListResponse { data }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Sites",
    operation_id = "getSite",
    summary = "Get one of the owner's sites",
    params(("id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Site details", body = SiteResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_site(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SiteResponse>, AppError> {
    let site = find_owned_site(&state.db, id, auth_user.user_id).await?;
    let count = review_count(&state.db, site.id).await?;
    Ok(Json(SiteResponse::new(site, count)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Sites",
    operation_id = "updateSite",
    summary = "Rename a site or change its domain",
    params(("id" = Uuid, Path, description = "Site ID")),
    request_body = UpdateSiteRequest,
    responses(
        (status = 200, description = "Site updated", body = SiteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_site(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateSiteRequest>,
) -> Result<Json<SiteResponse>, AppError> {
    validate_update_site(&payload)?;

    let site = find_owned_site(&state.db, id, auth_user.user_id).await?;
    let count = review_count(&state.db, site.id).await?;

    if payload == UpdateSiteRequest::default() {
        return Ok(Json(SiteResponse::new(site, count)));
    }

    let mut active: site::ActiveModel = site.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(domain) = payload.domain {
        active.domain = Set(domain.trim().to_string());
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(SiteResponse::new(model, count)))
}

#[utoipa::path(
    put,
    path = "/{id}/settings",
    tag = "Sites",
    operation_id = "updateSiteSettings",
    summary = "Update widget settings",
    description = "Top-level keys in `settings` replace the stored ones; other stored keys are kept.",
    params(("id" = Uuid, Path, description = "Site ID")),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = SiteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_settings(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateSettingsRequest>,
) -> Result<Json<SiteResponse>, AppError> {
    validate_update_settings(&payload)?;

    let site = find_owned_site(&state.db, id, auth_user.user_id).await?;
    let count = review_count(&state.db, site.id).await?;

    let merged = merge_settings(&site.settings, &payload.settings);
    let mut active: site::ActiveModel = site.into();
    active.settings = Set(merged);
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(SiteResponse::new(model, count)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Sites",
    operation_id = "deleteSite",
    summary = "Delete a site",
    description = "Deletes the site together with its reviews and widget views.",
    params(("id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 204, description = "Site deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_site(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    let site = find_owned_site(&txn, id, auth_user.user_id).await?;

    let reviews = review::Entity::delete_many()
        .filter(review::Column::SiteId.eq(site.id))
        .exec(&txn)
        .await?;
    let views = widget_view::Entity::delete_many()
        .filter(widget_view::Column::SiteId.eq(site.id))
        .exec(&txn)
        .await?;
    site::Entity::delete_by_id(site.id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        site_id = %id,
        reviews = reviews.rows_affected,
        views = views.rows_affected,
        "Site deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
