use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use profile_cell::services::profile::is_valid_email;
use profile_cell::{ProfileService, StaffFields};
use shared_database::store::{encode, fetch_all, fetch_one};
use shared_database::{Collection, Direction, DocumentStore, IdentityProvider, Query};
use shared_models::Role;

use crate::models::{
    Collaborator, CreateCollaboratorRequest, DirectoryError, UpdateCollaboratorRequest,
};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct CollaboratorService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl CollaboratorService {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    pub async fn list(&self) -> Result<Vec<Collaborator>, DirectoryError> {
        let query = Query::new().order_by("fullName", Direction::Asc);
        Ok(fetch_all(self.store.as_ref(), Collection::Collaborators, &query).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Collaborator>, DirectoryError> {
        Ok(fetch_one(self.store.as_ref(), Collection::Collaborators, id).await?)
    }

    pub async fn require(&self, id: &str) -> Result<Collaborator, DirectoryError> {
        self.get(id)
            .await?
            .ok_or_else(|| DirectoryError::CollaboratorNotFound(id.to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Collaborator>, DirectoryError> {
        let query = Query::new().eq("email", normalize_email(email)).limit(1);
        let mut found: Vec<Collaborator> =
            fetch_all(self.store.as_ref(), Collection::Collaborators, &query).await?;
        Ok(found.pop())
    }

    fn validate(full_name: &str, email: &str, role: Role) -> Result<(), DirectoryError> {
        if full_name.trim().is_empty() {
            return Err(DirectoryError::ValidationError("Full name is required".to_string()));
        }
        if !is_valid_email(email) {
            return Err(DirectoryError::ValidationError("Invalid email address".to_string()));
        }
        if !role.is_staff() {
            return Err(DirectoryError::ValidationError(
                "Collaborators must have a staff role".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn create(&self, request: CreateCollaboratorRequest) -> Result<Collaborator, DirectoryError> {
        let email = normalize_email(&request.email);
        Self::validate(&request.full_name, &email, request.role)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(DirectoryError::DuplicateEmail(email));
        }

        let mut collaborator = Collaborator {
            id: String::new(),
            full_name: request.full_name.trim().to_string(),
            email,
            phone: request.phone.filter(|p| !p.trim().is_empty()),
            role: request.role,
            institution_ids: request.institution_ids,
            service_ids: request.service_ids,
            subject_id: None,
        };

        collaborator.id = self
            .store
            .create(Collection::Collaborators, encode(&collaborator)?)
            .await?;
        info!("Collaborator {} created with role {}", collaborator.id, collaborator.role);
        Ok(collaborator)
    }

    /// Applies the edit and mirrors role, name and phone onto the staff
    /// profile when the collaborator has already signed in once. The email
    /// is frozen from then on.
    pub async fn update(
        &self,
        id: &str,
        request: UpdateCollaboratorRequest,
    ) -> Result<Collaborator, DirectoryError> {
        let existing = self.require(id).await?;

        let email = request
            .email
            .as_deref()
            .map(normalize_email)
            .unwrap_or_else(|| existing.email.clone());
        let full_name = request
            .full_name
            .clone()
            .unwrap_or_else(|| existing.full_name.clone());
        let role = request.role.unwrap_or(existing.role);
        Self::validate(&full_name, &email, role)?;

        if email != existing.email {
            // The sign-in account is keyed by this address.
            if existing.subject_id.is_some() {
                warn!("Refusing email change for provisioned collaborator {}", id);
                return Err(DirectoryError::ValidationError(
                    "Email cannot change after the collaborator's first login".to_string(),
                ));
            }
            if let Some(other) = self.find_by_email(&email).await? {
                if other.id != id {
                    return Err(DirectoryError::DuplicateEmail(email));
                }
            }
        }

        let mut patch = Map::new();
        patch.insert("email".to_string(), json!(email));
        patch.insert("fullName".to_string(), json!(full_name.trim()));
        patch.insert("role".to_string(), json!(role));
        if let Some(phone) = request.phone {
            let phone = phone.trim().to_string();
            patch.insert(
                "phone".to_string(),
                if phone.is_empty() { Value::Null } else { json!(phone) },
            );
        }
        if let Some(institution_ids) = request.institution_ids {
            patch.insert("institutionIds".to_string(), json!(institution_ids));
        }
        if let Some(service_ids) = request.service_ids {
            patch.insert("serviceIds".to_string(), json!(service_ids));
        }

        self.store
            .update(Collection::Collaborators, id, Value::Object(patch))
            .await?;
        let updated = self.require(id).await?;
        info!("Collaborator {} updated", id);

        if let Some(subject_id) = &updated.subject_id {
            let fields = StaffFields {
                role: updated.role,
                full_name: updated.full_name.clone(),
                phone: updated.phone.clone(),
            };
            let applied = ProfileService::new(self.store.clone())
                .apply_staff_fields(subject_id, &fields)
                .await?;
            if !applied {
                warn!("Collaborator {} points at missing profile {}", id, subject_id);
            }
        }

        Ok(updated)
    }

    /// Records the identity subject created at first login.
    pub async fn mark_provisioned(&self, id: &str, subject_id: &str) -> Result<(), DirectoryError> {
        self.store
            .update(Collection::Collaborators, id, json!({ "subjectId": subject_id }))
            .await?;
        Ok(())
    }

    /// Removes the collaborator, its profile and, best effort, its account.
    pub async fn delete(&self, id: &str) -> Result<(), DirectoryError> {
        let collaborator = self.require(id).await?;

        if let Some(subject_id) = &collaborator.subject_id {
            ProfileService::new(self.store.clone())
                .delete_profile(subject_id)
                .await?;

            if let Err(e) = self.identity.remove_account(subject_id).await {
                warn!("Could not remove account {} of collaborator {}: {}", subject_id, id, e);
            }
        }

        self.store.delete(Collection::Collaborators, id).await?;
        info!("Collaborator {} deleted", id);
        Ok(())
    }
}
