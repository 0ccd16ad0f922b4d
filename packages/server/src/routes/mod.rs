mod v1;

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

/// Versioned JSON API, mounted under `/api`.
pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::routes())
}

/// Public widget pages and snippets, mounted under `/widget/{site_id}`.
pub fn widget_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::widget::widget_page))
        .routes(routes!(
            handlers::widget::widget_reviews,
            handlers::widget::widget_submit_review
        ))
        .routes(routes!(handlers::widget::widget_settings))
        .routes(routes!(handlers::widget::widget_embed))
        .routes(routes!(handlers::widget::widget_stats))
}

pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::health::banner))
        .routes(routes!(handlers::health::health))
}
