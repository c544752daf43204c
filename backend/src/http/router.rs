//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Shift groups
        .route(
            "/courses/{course}/shifts",
            get(handlers::list_shifts).post(handlers::create_shift),
        )
        .route(
            "/shifts/{id}",
            get(handlers::get_shift).delete(handlers::delete_shift),
        )
        .route("/shifts/{id}/members", get(handlers::list_shift_members))
        // Settings and scheduling
        .route(
            "/courses/{course}/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route(
            "/courses/{course}/plans",
            get(handlers::list_plans).post(handlers::create_plan),
        )
        .route("/plans/{id}", delete(handlers::delete_plan))
        .route("/plans/{id}/launch", post(handlers::launch_plan))
        .route("/courses/{course}/update-shifts", post(handlers::update_shifts))
        // Memberships
        .route(
            "/courses/{course}/users/{user}/membership",
            get(handlers::get_membership),
        )
        .route(
            "/courses/{course}/users/{user}/transfer",
            post(handlers::transfer_user),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
