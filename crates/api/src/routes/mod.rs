//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod advances;
pub mod employees;
pub mod health;
pub mod payments;
pub mod payrolls;

/// Creates the API router; everything but `/health` requires a bearer token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(employees::routes())
        .merge(advances::routes())
        .merge(payrolls::routes())
        .merge(payments::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// Builds a normalized page request from optional query values.
pub(crate) fn page_request(
    page: Option<u32>,
    per_page: Option<u32>,
) -> safra_shared::types::PageRequest {
    let defaults = safra_shared::types::PageRequest::default();
    safra_shared::types::PageRequest {
        page: page.unwrap_or(defaults.page),
        per_page: per_page.unwrap_or(defaults.per_page),
    }
    .normalized()
}
