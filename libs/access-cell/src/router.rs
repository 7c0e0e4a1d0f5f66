use axum::{middleware, routing::get, Router};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers::*;

/// Mounted under `/admin`.
pub fn access_routes(state: AppState) -> Router {
    Router::new()
        .route("/navigation", get(get_navigation))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
