use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::services::{navigation_for, AccessGate};

#[axum::debug_handler]
pub async fn get_navigation(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let gate = AccessGate::new(state.store.clone());
    let session = gate.session(&user).await?;

    if !session.role().is_staff() {
        return Err(AppError::Forbidden("Staff access only".to_string()));
    }

    Ok(Json(json!({
        "role": session.role(),
        "role_label": session.role().label(),
        "items": navigation_for(session.role()),
    })))
}
