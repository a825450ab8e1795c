//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, an optional
//! static front-end, and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use intake_core::config::{IntakeConfig, ServerConfig};
use intake_core::IntakeError;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// CORS policy from `server.allowed_origins`; an empty list allows any origin.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if config.allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors = cors_layer(server);
    let body_limit = server.max_body_bytes;
    let static_dir = server.static_dir.clone();

    let api_routes = Router::new()
        .route("/start-session", post(handlers::start_session))
        .route("/generate-question", post(handlers::generate_question))
        .route(
            "/summarize-conversation/{session_id}",
            get(handlers::summarize_conversation),
        )
        .route("/get-session/{session_id}", get(handlers::get_session))
        .route("/session/{session_id}", delete(handlers::end_session))
        .route("/process-audio", post(handlers::process_audio));

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_routes);

    if let Some(dir) = static_dir {
        tracing::info!(dir = %dir, "Serving front-end assets");
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on `server.host:server.port` and run until Ctrl-C.
pub async fn start_server(config: &IntakeConfig, state: AppState) -> Result<(), IntakeError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
