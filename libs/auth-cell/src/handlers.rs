use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use access_cell::{navigation_for, AccessGate};
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::{bearer_token, SessionToken};
use shared_utils::jwt::validate_token as decode_token;
use shared_utils::AppState;

use crate::models::{
    AuthError, AuthResponse, CitizenLoginRequest, CitizenRegisterRequest, FirstLoginRequest,
    StaffLoginRequest,
};
use crate::services::{end_session, CitizenAuthService, StaffAuthService};

#[axum::debug_handler]
pub async fn register_citizen(
    State(state): State<AppState>,
    Json(request): Json<CitizenRegisterRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = CitizenAuthService::new(&state).register(request).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn login_citizen(
    State(state): State<AppState>,
    Json(request): Json<CitizenLoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = CitizenAuthService::new(&state).login(request).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn login_staff(
    State(state): State<AppState>,
    Json(request): Json<StaffLoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = StaffAuthService::new(&state).login(request).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn first_login(
    State(state): State<AppState>,
    Json(request): Json<FirstLoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = StaffAuthService::new(&state).first_login(request).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn validate_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = bearer_token(&headers)?;
    if state.is_revoked(token).await {
        return Err(AppError::Auth("Session has ended".to_string()));
    }

    let user = decode_token(token, &state.config.jwt_secret).map_err(AppError::Auth)?;
    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
    }))
}

#[axum::debug_handler]
pub async fn current_session(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let session = AccessGate::new(state.store.clone()).session(&user).await?;
    let navigation = navigation_for(session.role());

    Ok(Json(json!({
        "user_id": user.id,
        "profile": session.profile,
        "navigation": navigation,
    })))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<Json<Value>, AppError> {
    end_session(&state, &user, &token).await;
    Ok(Json(json!({ "signed_out": true })))
}
