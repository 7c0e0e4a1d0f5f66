use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use access_cell::access_routes;
use auth_cell::auth_routes;
use booking_cell::{booking_admin_routes, booking_routes};
use directory_cell::{catalog_routes, directory_admin_routes};
use profile_cell::profile_routes;
use shared_utils::AppState;

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "portal-api",
    }))
}

pub fn create_router(state: AppState) -> Router {
    let admin = Router::new()
        .merge(access_routes(state.clone()))
        .merge(directory_admin_routes(state.clone()))
        .merge(booking_admin_routes(state.clone()));

    Router::new()
        .route("/", get(|| async { "Service booking portal API is running!" }))
        .route("/health", get(health))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/profile", profile_routes(state.clone()))
        .nest("/catalog", catalog_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/admin", admin)
}
