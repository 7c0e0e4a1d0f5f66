use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers::*;

pub fn profile_routes(state: AppState) -> Router {
    Router::new()
        .route("/me", get(get_my_profile).patch(update_my_contact))
        .route("/me/pins/{institution_id}", post(pin_institution).delete(unpin_institution))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
