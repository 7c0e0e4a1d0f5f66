use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::UpdateContactRequest;
use crate::services::ProfileService;

#[axum::debug_handler]
pub async fn get_my_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(state.store.clone());
    let profile = service.require_profile(&user.id).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn update_my_contact(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateContactRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(state.store.clone());
    let profile = service.update_contact(&user.id, request).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn pin_institution(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(institution_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(state.store.clone());
    service.pin(&user.id, &institution_id).await?;

    Ok(Json(json!({ "pinned": true, "institution_id": institution_id })))
}

#[axum::debug_handler]
pub async fn unpin_institution(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(institution_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(state.store.clone());
    service.unpin(&user.id, &institution_id).await?;

    Ok(Json(json!({ "pinned": false, "institution_id": institution_id })))
}
