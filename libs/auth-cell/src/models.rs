use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use access_cell::AccessError;
use directory_cell::DirectoryError;
use profile_cell::{Profile, ProfileError};
use shared_database::{IdentityError, StoreError};
use shared_models::error::AppError;

/// The only message a failed login ever shows.
pub const GENERIC_DENIAL: &str = "Invalid credentials or unauthorized access";

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitizenRegisterRequest {
    #[serde(alias = "bilheteIdentidade")]
    pub national_id: String,
    #[serde(alias = "nomeCompleto")]
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default, alias = "telefone")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitizenLoginRequest {
    #[serde(alias = "bilheteIdentidade")]
    pub national_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstLoginRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// A started session.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub profile: Profile,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{}", GENERIC_DENIAL)]
    InvalidCredentials,

    /// A collaborator exists for this email but has never set a password.
    #[error("First login required for {email}")]
    FirstLoginRequired { email: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No collaborator registered for {0}")]
    CollaboratorNotFound(String),

    #[error("Account for {0} is already set up")]
    AlreadyProvisioned(String),

    #[error("Could not issue session token: {0}")]
    Token(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::FirstLoginRequired { .. } => {
                AppError::Auth(GENERIC_DENIAL.to_string())
            }
            AuthError::Identity(e) if e.is_credential_failure() => {
                AppError::Auth(GENERIC_DENIAL.to_string())
            }
            AuthError::ValidationError(msg) => AppError::ValidationError(msg),
            AuthError::CollaboratorNotFound(_) => AppError::NotFound(err.to_string()),
            AuthError::AlreadyProvisioned(_) => AppError::Conflict(err.to_string()),
            AuthError::Token(msg) => AppError::Internal(msg),
            AuthError::Identity(e) => e.into(),
            AuthError::Profile(e) => e.into(),
            AuthError::Directory(e) => e.into(),
            AuthError::Access(e) => e.into(),
            AuthError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::FirstLoginRequired { email } => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "First login required",
                    "first_login_required": true,
                    "email": email,
                })),
            )
                .into_response(),
            other => AppError::from(other).into_response(),
        }
    }
}
