pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::AppConfig;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Scraper API",
        version = "0.1.0",
        description = "Streams the progress of a student attendance lookup against the college portal"
    ),
    paths(routes::health_check, routes::scrape::scrape_stream),
    components(schemas(
        routes::HealthResponse,
        error::ErrorResponse,
        events::WireMessage,
        events::ResultPayload,
        events::FaultPayload,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "scrape", description = "Attendance lookup streamed as SSE"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health_check))
        .route("/api/scrape", get(routes::scrape::scrape_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address and serve until the process is stopped
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).context("Invalid portal configuration")?;
    tracing::info!(
        portal = %state.orchestrator.login_url(),
        preset = ?config.browser.preset,
        "Scrape orchestrator ready"
    );

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
