//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for employees, advances, payrolls and PIX batches
//! - Bearer token authentication middleware
//! - JSON error responses shared by every route

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use safra_shared::JwtService;
use safra_shared::config::PayrollConfig;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Payroll defaults.
    pub payroll: PayrollConfig,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
