use askama::Template;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use review_core::CountryLookup;
use tracing::instrument;
use uuid::Uuid;

use crate::analytics::AnalyticsService;
use crate::error::{AppError, ErrorBody};
use crate::extractors::client::ClientInfo;
use crate::extractors::json::AppJson;
use crate::handlers::review::{public_reviews, submit};
use crate::handlers::site::find_site;
use crate::models::review::{PublicReviewsResponse, SubmitReviewRequest, SubmittedReviewResponse};
use crate::models::shared::round1;
use crate::models::widget::*;
use crate::state::AppState;
use crate::templates::{EmbedIframe, EmbedScript, WidgetNotFound, WidgetPage, WidgetReview};

const FRAME_HEADERS: [(header::HeaderName, &str); 2] = [
    (header::X_FRAME_OPTIONS, "ALLOWALL"),
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
];

fn render<T: Template>(template: &T) -> Result<String, AppError> {
    template
        .render()
        .map_err(|e| AppError::Internal(format!("Template render error: {}", e)))
}

/// Record a widget view. Failures are logged and never reach the visitor.
async fn track_view(state: &AppState, site_id: Uuid, client: ClientInfo) {
    let Some(ip) = client.ip else {
        return;
    };
    let country = state.countries.country_for(&ip);
    let result = AnalyticsService::new(&state.db, state.reviews.now())
        .track_view(site_id, ip, client.user_agent, client.referer, country)
        .await;
    if let Err(e) = result {
        tracing::warn!(site_id = %site_id, error = %e, "Failed to record widget view");
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Widget",
    operation_id = "getWidgetPage",
    summary = "Embeddable reviews page",
    description = "Self-contained HTML page with the site's approved reviews and, if enabled, a submit form. Every render is recorded as a widget view.",
    params(("site_id" = String, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Widget page", content_type = "text/html", body = String),
        (status = 404, description = "Unknown site", content_type = "text/html", body = String),
    ),
)]
#[instrument(skip(state, client))]
pub async fn widget_page(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    client: ClientInfo,
) -> Result<Response, AppError> {
    let site = match site_id.parse::<Uuid>() {
        Ok(id) => match find_site(&state.db, id).await {
            Ok(site) => Some(site),
            Err(AppError::NotFound(_)) => None,
            Err(e) => return Err(e),
        },
        Err(_) => None,
    };
    let Some(site) = site else {
        let body = render(&WidgetNotFound)?;
        return Ok((StatusCode::NOT_FOUND, FRAME_HEADERS, Html(body)).into_response());
    };
    let site_id = site.id;

    let settings = WidgetSettings::from_stored(&site.settings);
    let public = state.reviews.public_reviews_for(site_id).await?;
    let reviews: Vec<WidgetReview> = public
        .reviews
        .into_iter()
        .take(settings.max_reviews)
        .map(WidgetReview::from)
        .collect();
    let average = if reviews.is_empty() {
        0.0
    } else {
        round1(reviews.iter().map(|r| r.rating as f64).sum::<f64>() / reviews.len() as f64)
    };

    track_view(&state, site_id, client).await;

    let body = render(&WidgetPage {
        site_id,
        site_name: &site.name,
        settings: &settings,
        reviews,
        average_rating: format!("{average:.1}"),
    })?;

    Ok((FRAME_HEADERS, Html(body)).into_response())
}

#[utoipa::path(
    get,
    path = "/reviews",
    tag = "Widget",
    operation_id = "getWidgetReviews",
    summary = "Approved reviews for the widget",
    params(("site_id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Approved reviews", body = PublicReviewsResponse),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn widget_reviews(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
) -> Result<Json<PublicReviewsResponse>, AppError> {
    Ok(Json(public_reviews(&state, site_id).await?))
}

#[utoipa::path(
    post,
    path = "/reviews",
    tag = "Widget",
    operation_id = "submitWidgetReview",
    summary = "Submit a review from the widget",
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
pub async fn widget_submit_review(
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
    path = "/settings",
    tag = "Widget",
    operation_id = "getWidgetSettings",
    summary = "Widget appearance settings",
    params(("site_id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Settings with defaults filled in", body = WidgetSettingsResponse),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn widget_settings(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
) -> Result<Json<WidgetSettingsResponse>, AppError> {
    let site = find_site(&state.db, site_id).await?;
    Ok(Json(WidgetSettingsResponse {
        settings: merge_settings(&default_settings(), &site.settings),
        site: WidgetSiteInfo {
            id: site.id,
            name: site.name,
            domain: site.domain,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/embed",
    tag = "Widget",
    operation_id = "getEmbedCode",
    summary = "Snippets for embedding the widget",
    params(("site_id" = Uuid, Path, description = "Site ID"), EmbedQuery),
    responses(
        (status = 200, description = "Embed snippets", body = EmbedResponse),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn widget_embed(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
    Query(query): Query<EmbedQuery>,
) -> Result<Json<EmbedResponse>, AppError> {
    let site = find_site(&state.db, site_id).await?;
    let base_url = state.config.widget.public_base_url.trim_end_matches('/');
    let width = query.width.unwrap_or(400);
    let height = query.height.unwrap_or(500);

    let iframe = render(&EmbedIframe {
        base_url,
        site_id,
        site_name: &site.name,
        width,
        height,
    })?;
    let javascript = render(&EmbedScript {
        base_url,
        site_id,
        site_name: &site.name,
        width,
        height,
    })?;

    Ok(Json(EmbedResponse {
        iframe,
        javascript,
        instructions: EmbedInstructions::default(),
    }))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Widget",
    operation_id = "getWidgetStats",
    summary = "Public rating summary",
    params(("site_id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Rating summary over approved reviews", body = WidgetStatsResponse),
        (status = 404, description = "Site not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn widget_stats(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
) -> Result<Json<WidgetStatsResponse>, AppError> {
    let public = state.reviews.public_reviews_for(site_id).await?;
    let average_rating = if public.reviews.is_empty() {
        0.0
    } else {
        let sum: i64 = public.reviews.iter().map(|r| i64::from(r.rating)).sum();
        round1(sum as f64 / public.reviews.len() as f64)
    };

    Ok(Json(WidgetStatsResponse {
        total_reviews: public.total,
        average_rating,
        last_updated: state.reviews.now(),
    }))
}
