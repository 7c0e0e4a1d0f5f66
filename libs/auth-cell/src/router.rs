use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/auth`.
pub fn auth_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/citizen/register", post(handlers::register_citizen))
        .route("/citizen/login", post(handlers::login_citizen))
        .route("/staff/login", post(handlers::login_staff))
        .route("/staff/first-login", post(handlers::first_login))
        .route("/validate", post(handlers::validate_token));

    let protected_routes = Router::new()
        .route("/session", get(handlers::current_session))
        .route("/logout", post(handlers::logout))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
