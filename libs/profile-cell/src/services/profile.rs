use std::sync::{Arc, LazyLock};

use chrono::Utc;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use shared_database::store::{encode, fetch_one};
use shared_database::{Collection, DocumentStore};
use shared_models::Role;

use crate::models::{NewCitizenProfile, Profile, ProfileError, StaffFields, UpdateContactRequest};

const PINNED_FIELD: &str = "pinnedInstitutions";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get_profile(&self, subject_id: &str) -> Result<Option<Profile>, ProfileError> {
        debug!("Loading profile {}", subject_id);
        Ok(fetch_one(self.store.as_ref(), Collection::Users, subject_id).await?)
    }

    pub async fn require_profile(&self, subject_id: &str) -> Result<Profile, ProfileError> {
        self.get_profile(subject_id)
            .await?
            .ok_or(ProfileError::NotFound)
    }

    /// Replaces the profile document of `profile.subject_id`.
    pub async fn write_profile(&self, profile: &Profile) -> Result<(), ProfileError> {
        self.store
            .set(Collection::Users, &profile.subject_id, encode(profile)?)
            .await?;
        info!("Profile {} written with role {}", profile.subject_id, profile.role);
        Ok(())
    }

    pub async fn create_citizen_profile(
        &self,
        subject_id: &str,
        request: NewCitizenProfile,
    ) -> Result<Profile, ProfileError> {
        let national_id = request.national_id.trim().to_string();
        let full_name = request.full_name.trim().to_string();
        if national_id.is_empty() {
            return Err(ProfileError::ValidationError("National id is required".to_string()));
        }
        if full_name.is_empty() {
            return Err(ProfileError::ValidationError("Full name is required".to_string()));
        }

        let profile = Profile {
            subject_id: subject_id.to_string(),
            national_id,
            full_name,
            phone: non_empty(request.phone),
            email: non_empty(request.email),
            role: Role::Citizen,
            pinned_institutions: Vec::new(),
            created_at: Some(Utc::now()),
        };

        self.write_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn pin(&self, subject_id: &str, institution_id: &str) -> Result<(), ProfileError> {
        if institution_id.trim().is_empty() {
            return Err(ProfileError::ValidationError("Institution id is required".to_string()));
        }
        self.store
            .array_union(Collection::Users, subject_id, PINNED_FIELD, institution_id)
            .await?;
        debug!("{} pinned institution {}", subject_id, institution_id);
        Ok(())
    }

    pub async fn unpin(&self, subject_id: &str, institution_id: &str) -> Result<(), ProfileError> {
        self.store
            .array_remove(Collection::Users, subject_id, PINNED_FIELD, institution_id)
            .await?;
        debug!("{} unpinned institution {}", subject_id, institution_id);
        Ok(())
    }

    pub async fn update_contact(
        &self,
        subject_id: &str,
        request: UpdateContactRequest,
    ) -> Result<Profile, ProfileError> {
        let mut patch = Map::new();

        if let Some(phone) = request.phone {
            patch.insert("phone".to_string(), optional_string(phone));
        }
        if let Some(email) = request.email {
            let email = email.trim().to_string();
            if !email.is_empty() && !is_valid_email(&email) {
                return Err(ProfileError::ValidationError("Invalid email address".to_string()));
            }
            patch.insert("email".to_string(), optional_string(email));
        }

        if !patch.is_empty() {
            self.store
                .update(Collection::Users, subject_id, Value::Object(patch))
                .await?;
            info!("Contact details updated for {}", subject_id);
        }

        self.require_profile(subject_id).await
    }

    /// Mirrors collaborator fields onto an existing profile. Returns false when
    /// the collaborator has not been provisioned yet.
    pub async fn apply_staff_fields(
        &self,
        subject_id: &str,
        fields: &StaffFields,
    ) -> Result<bool, ProfileError> {
        if self.get_profile(subject_id).await?.is_none() {
            return Ok(false);
        }

        self.store
            .update(
                Collection::Users,
                subject_id,
                json!({
                    "role": fields.role,
                    "fullName": fields.full_name,
                    "phone": fields.phone,
                }),
            )
            .await?;
        info!("Staff profile {} now has role {}", subject_id, fields.role);
        Ok(true)
    }

    pub async fn delete_profile(&self, subject_id: &str) -> Result<(), ProfileError> {
        self.store.delete(Collection::Users, subject_id).await?;
        info!("Profile {} deleted", subject_id);
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn optional_string(value: String) -> Value {
    let value = value.trim();
    if value.is_empty() {
        Value::Null
    } else {
        Value::String(value.to_string())
    }
}
