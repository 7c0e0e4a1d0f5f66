use async_trait::async_trait;
use thiserror::Error;

use shared_models::error::AppError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No account for this identifier")]
    UnknownIdentifier,

    #[error("An account already exists for this identifier")]
    AlreadyExists,

    #[error("Secret rejected: {0}")]
    WeakSecret(String),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl IdentityError {
    /// Rejections caused by what the caller typed, as opposed to provider trouble.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            IdentityError::InvalidCredentials | IdentityError::UnknownIdentifier
        )
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials | IdentityError::UnknownIdentifier => {
                AppError::Auth(err.to_string())
            }
            IdentityError::AlreadyExists => AppError::Conflict(err.to_string()),
            IdentityError::WeakSecret(_) => AppError::ValidationError(err.to_string()),
            IdentityError::Provider(msg) => AppError::ExternalService(msg),
        }
    }
}

/// Credential authority: maps an identifier/secret pair to a stable subject id.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<String, IdentityError>;

    async fn sign_up(&self, identifier: &str, secret: &str) -> Result<String, IdentityError>;

    async fn sign_out(&self, subject_id: &str) -> Result<(), IdentityError>;

    async fn remove_account(&self, subject_id: &str) -> Result<(), IdentityError>;
}
