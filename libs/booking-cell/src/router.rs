use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use access_cell::session_middleware;
use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/bookings`.
pub fn booking_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::create_booking).get(handlers::list_my_bookings))
        .route("/history", get(handlers::list_my_history))
        .route("/dates", get(handlers::list_available_dates))
        .route("/availability", get(handlers::get_slot_availability))
        .route("/{booking_id}", get(handlers::get_booking))
        .route("/{booking_id}/cancel", post(handlers::cancel_booking))
        .route("/{booking_id}/reschedule", patch(handlers::reschedule_booking))
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/admin`.
pub fn booking_admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/stats", get(handlers::admin_dashboard_stats))
        .route("/bookings", get(handlers::admin_list_bookings))
        .route("/bookings/{booking_id}", delete(handlers::admin_delete_booking))
        .route("/bookings/{booking_id}/complete", post(handlers::admin_complete_booking))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
