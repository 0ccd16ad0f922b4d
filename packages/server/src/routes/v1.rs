use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/sites", site_routes())
        .nest("/reviews", review_routes())
        .nest("/analytics", analytics_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::refresh))
        .routes(routes!(handlers::auth::me))
}

fn site_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::site::list_sites,
            handlers::site::create_site
        ))
        .routes(routes!(
            handlers::site::get_site,
            handlers::site::update_site,
            handlers::site::delete_site
        ))
        .routes(routes!(handlers::site::update_settings))
}

fn review_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::review::list_my_reviews))
        .routes(routes!(
            handlers::review::get_public_reviews,
            handlers::review::submit_review
        ))
        .routes(routes!(handlers::review::get_site_review_stats))
        .routes(routes!(handlers::review::update_review_status))
        .routes(routes!(handlers::review::delete_review))
}

fn analytics_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::analytics::get_dashboard))
        .routes(routes!(handlers::analytics::get_overview))
        .routes(routes!(handlers::analytics::get_site_analytics))
        .routes(routes!(handlers::analytics::get_site_comparison))
        .routes(routes!(handlers::analytics::get_quick_stats))
}
