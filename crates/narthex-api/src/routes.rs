//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, bearer
//! auth, and the rate limiter. Only /health is public.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use narthex_core::error::NarthexError;

use crate::handlers;
use crate::rate_limit::RateLimiter;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // The directory UI may be served from anywhere; the bearer token is
    // the actual gate.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    let public_routes = Router::new().route("/health", get(handlers::health));

    let limiter = RateLimiter::new(state.config.chat.rate_limit_per_sec);

    let rate_limited_routes = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/intent", post(handlers::intent))
        .route("/resources", get(handlers::resources))
        .route("/kb-query", post(handlers::kb_query))
        .route("/ingest-url", post(handlers::ingest_url))
        .route("/render-doc", post(handlers::render_doc))
        .route("/calendar-events", get(handlers::calendar_events))
        .layer(axum::middleware::from_fn(
            crate::rate_limit::rate_limit_middleware,
        ))
        .layer(axum::Extension(limiter));

    let protected_routes = rate_limited_routes.route_layer(
        axum::middleware::from_fn_with_state(state.clone(), crate::auth::require_auth),
    );

    public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB global limit
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
///
/// Binds to 127.0.0.1 (localhost only) on the port from config.
pub async fn start_server(state: AppState) -> Result<(), NarthexError> {
    let port = state.config.general.port;
    let addr = format!("127.0.0.1:{}", port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| NarthexError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| NarthexError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
