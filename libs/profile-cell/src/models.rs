use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::Role;

/// Per-subject record carrying the role used by every authorization check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "uid")]
    pub subject_id: String,
    #[serde(default, alias = "bilheteIdentidade")]
    pub national_id: String,
    #[serde(alias = "nomeCompleto")]
    pub full_name: String,
    #[serde(default, alias = "telefone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub pinned_institutions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn is_pinned(&self, institution_id: &str) -> bool {
        self.pinned_institutions.iter().any(|id| id == institution_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCitizenProfile {
    pub national_id: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Contact edit; an empty string clears the field, `None` leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContactRequest {
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Fields mirrored from a collaborator record onto a provisioned staff profile.
#[derive(Debug, Clone)]
pub struct StaffFields {
    pub role: Role,
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Profile not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound => AppError::NotFound(err.to_string()),
            ProfileError::ValidationError(msg) => AppError::ValidationError(msg),
            ProfileError::Store(e) => e.into(),
        }
    }
}
