use std::net::SocketAddr;

use server::config::AppConfig;
use server::database::init_db;
use server::seed::{ensure_indexes, seed_demo_data};
use server::state::AppState;
use tracing::{Level, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;
    config.plans.ensure_complete()?;
    for tier in config.plans.tiers() {
        info!(%tier, "Plan configured");
    }

    let db = init_db(&config.database.url).await?;
    ensure_indexes(&db).await?;
    if config.database.seed_demo {
        seed_demo_data(&db).await?;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = server::build_router(AppState::new(db, config));

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
