use std::sync::Arc;

use futures::future::join_all;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use shared_database::store::{encode, fetch_all, fetch_one};
use shared_database::{Collection, Direction, DocumentStore, Query, StoreError};

use crate::models::{
    CreateInstitutionRequest, DirectoryError, Institution, InstitutionView,
    UpdateInstitutionRequest,
};

pub const SERVICE_IDS_FIELD: &str = "serviceIds";

pub struct InstitutionService {
    store: Arc<dyn DocumentStore>,
}

impl InstitutionService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Institution>, DirectoryError> {
        let query = Query::new().order_by("name", Direction::Asc);
        Ok(fetch_all(self.store.as_ref(), Collection::Institutions, &query).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Institution>, DirectoryError> {
        Ok(fetch_one(self.store.as_ref(), Collection::Institutions, id).await?)
    }

    pub async fn require(&self, id: &str) -> Result<Institution, DirectoryError> {
        self.get(id)
            .await?
            .ok_or_else(|| DirectoryError::InstitutionNotFound(id.to_string()))
    }

    async fn ensure_services_exist(&self, service_ids: &[String]) -> Result<(), DirectoryError> {
        let lookups = service_ids
            .iter()
            .map(|id| self.store.get(Collection::Services, id));
        for (id, found) in service_ids.iter().zip(join_all(lookups).await) {
            if found?.is_none() {
                return Err(DirectoryError::ServiceNotFound(id.clone()));
            }
        }
        Ok(())
    }

    pub async fn create(&self, request: CreateInstitutionRequest) -> Result<Institution, DirectoryError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(DirectoryError::ValidationError("Institution name is required".to_string()));
        }

        let mut service_ids = request.service_ids;
        service_ids.sort();
        service_ids.dedup();
        self.ensure_services_exist(&service_ids).await?;

        let mut institution = Institution {
            id: String::new(),
            name,
            address: request.address,
            coordinates: request.coordinates,
            service_ids,
            available_slots: request.available_slots,
            max_capacity: request.max_capacity,
            operating_hours: request.operating_hours,
            image_url: request.image_url,
        };

        institution.id = self
            .store
            .create(Collection::Institutions, encode(&institution)?)
            .await?;
        info!("Institution {} created: {}", institution.id, institution.name);
        Ok(institution)
    }

    pub async fn update(
        &self,
        id: &str,
        request: UpdateInstitutionRequest,
    ) -> Result<Institution, DirectoryError> {
        self.require(id).await?;

        let mut patch = Map::new();
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DirectoryError::ValidationError("Institution name is required".to_string()));
            }
            patch.insert("name".to_string(), json!(name));
        }
        if let Some(address) = request.address {
            patch.insert("address".to_string(), json!(address));
        }
        if let Some(coordinates) = request.coordinates {
            patch.insert("coordinates".to_string(), json!(coordinates));
        }
        if let Some(mut service_ids) = request.service_ids {
            service_ids.sort();
            service_ids.dedup();
            self.ensure_services_exist(&service_ids).await?;
            patch.insert(SERVICE_IDS_FIELD.to_string(), json!(service_ids));
        }
        if let Some(slots) = request.available_slots {
            patch.insert("availableSlots".to_string(), json!(slots));
        }
        if let Some(max_capacity) = request.max_capacity {
            patch.insert("maxCapacity".to_string(), json!(max_capacity));
        }
        if let Some(hours) = request.operating_hours {
            patch.insert("operatingHours".to_string(), json!(hours));
        }
        if let Some(image_url) = request.image_url {
            patch.insert("imageUrl".to_string(), json!(image_url));
        }

        if !patch.is_empty() {
            self.store
                .update(Collection::Institutions, id, Value::Object(patch))
                .await?;
            info!("Institution {} updated", id);
        }

        self.require(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), DirectoryError> {
        self.require(id).await?;
        self.store.delete(Collection::Institutions, id).await?;
        info!("Institution {} deleted", id);
        Ok(())
    }

    /// Idempotent: linking an already linked service changes nothing.
    pub async fn link_service(&self, institution_id: &str, service_id: &str) -> Result<(), DirectoryError> {
        if self.store.get(Collection::Services, service_id).await?.is_none() {
            return Err(DirectoryError::ServiceNotFound(service_id.to_string()));
        }
        self.store
            .array_union(Collection::Institutions, institution_id, SERVICE_IDS_FIELD, service_id)
            .await
            .map_err(|e| not_found_as_institution(e, institution_id))?;
        debug!("Linked service {} to institution {}", service_id, institution_id);
        Ok(())
    }

    pub async fn unlink_service(&self, institution_id: &str, service_id: &str) -> Result<(), DirectoryError> {
        self.store
            .array_remove(Collection::Institutions, institution_id, SERVICE_IDS_FIELD, service_id)
            .await
            .map_err(|e| not_found_as_institution(e, institution_id))?;
        debug!("Unlinked service {} from institution {}", service_id, institution_id);
        Ok(())
    }

    pub async fn institutions_by_service(&self, service_id: &str) -> Result<Vec<Institution>, DirectoryError> {
        let query = Query::new()
            .array_contains(SERVICE_IDS_FIELD, service_id)
            .order_by("name", Direction::Asc);
        Ok(fetch_all(self.store.as_ref(), Collection::Institutions, &query).await?)
    }

    /// Institutions offering `service_id`, narrowed by a case-insensitive
    /// name/address match, pinned ones first.
    pub async fn search_institutions(
        &self,
        service_id: &str,
        term: Option<&str>,
        pinned: &[String],
    ) -> Result<Vec<InstitutionView>, DirectoryError> {
        let term = term.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty());

        let mut views: Vec<InstitutionView> = self
            .institutions_by_service(service_id)
            .await?
            .into_iter()
            .filter(|institution| match &term {
                Some(term) => {
                    institution.name.to_lowercase().contains(term)
                        || institution.address.to_lowercase().contains(term)
                }
                None => true,
            })
            .map(|institution| {
                let pinned = pinned.contains(&institution.id);
                InstitutionView { institution, pinned }
            })
            .collect();

        // Stable: keeps name order inside each group.
        views.sort_by_key(|view| !view.pinned);
        Ok(views)
    }
}

fn not_found_as_institution(err: StoreError, institution_id: &str) -> DirectoryError {
    match err {
        StoreError::NotFound { .. } => {
            DirectoryError::InstitutionNotFound(institution_id.to_string())
        }
        other => other.into(),
    }
}
