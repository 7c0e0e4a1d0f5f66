use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::info;

use shared_database::store::{encode, fetch_all, fetch_one};
use shared_database::{Collection, Direction, DocumentStore, Query};

use crate::models::{
    CategoryInfo, CreateServiceRequest, DirectoryError, Service, ServiceCategory, ServiceFilter,
    UpdateServiceRequest,
};
use crate::services::institution::InstitutionService;
use crate::services::linkage::LinkageService;

pub fn categories() -> Vec<CategoryInfo> {
    ServiceCategory::ALL.into_iter().map(CategoryInfo::from).collect()
}

pub struct ServiceCatalog {
    store: Arc<dyn DocumentStore>,
    linkage: LinkageService,
}

impl ServiceCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            linkage: LinkageService::new(store.clone()),
            store,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Service>, DirectoryError> {
        Ok(fetch_one(self.store.as_ref(), Collection::Services, id).await?)
    }

    pub async fn require(&self, id: &str) -> Result<Service, DirectoryError> {
        self.get(id)
            .await?
            .ok_or_else(|| DirectoryError::ServiceNotFound(id.to_string()))
    }

    pub async fn services_by_category(&self, category: ServiceCategory) -> Result<Vec<Service>, DirectoryError> {
        let query = Query::new()
            .eq("category", category.as_str())
            .order_by("name", Direction::Asc);
        Ok(fetch_all(self.store.as_ref(), Collection::Services, &query).await?)
    }

    /// Admin listing: optional category, case-insensitive name search and
    /// restriction to the services one institution offers.
    pub async fn list(&self, filter: &ServiceFilter) -> Result<Vec<Service>, DirectoryError> {
        let mut query = Query::new().order_by("name", Direction::Asc);
        if let Some(category) = filter.category {
            query = query.eq("category", category.as_str());
        }
        let mut services: Vec<Service> = fetch_all(self.store.as_ref(), Collection::Services, &query).await?;

        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            services.retain(|service| service.name.to_lowercase().contains(&term));
        }

        if let Some(institution_id) = filter.institution.as_deref().filter(|id| !id.is_empty()) {
            let institution = InstitutionService::new(self.store.clone())
                .require(institution_id)
                .await?;
            services.retain(|service| institution.offers(&service.id));
        }

        Ok(services)
    }

    pub async fn create(&self, request: CreateServiceRequest) -> Result<Service, DirectoryError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(DirectoryError::ValidationError("Service name is required".to_string()));
        }

        let mut service = Service {
            id: String::new(),
            name,
            category: request.category,
            average_duration: request.average_duration,
            max_capacity: request.max_capacity,
            requirements: clean_requirements(request.requirements),
        };

        service.id = self
            .store
            .create(Collection::Services, encode(&service)?)
            .await?;
        info!("Service {} created: {} ({})", service.id, service.name, service.category);

        if !request.institution_ids.is_empty() {
            self.linkage
                .sync_service_institutions(&service.id, &request.institution_ids)
                .await?;
        }

        Ok(service)
    }

    pub async fn update(&self, id: &str, request: UpdateServiceRequest) -> Result<Service, DirectoryError> {
        self.require(id).await?;

        let mut patch = Map::new();
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DirectoryError::ValidationError("Service name is required".to_string()));
            }
            patch.insert("name".to_string(), json!(name));
        }
        if let Some(category) = request.category {
            patch.insert("category".to_string(), json!(category));
        }
        if let Some(duration) = request.average_duration {
            patch.insert("averageDuration".to_string(), json!(duration));
        }
        if let Some(max_capacity) = request.max_capacity {
            patch.insert("maxCapacity".to_string(), json!(max_capacity));
        }
        if let Some(requirements) = request.requirements {
            patch.insert("requirements".to_string(), json!(clean_requirements(requirements)));
        }

        if !patch.is_empty() {
            self.store
                .update(Collection::Services, id, Value::Object(patch))
                .await?;
            info!("Service {} updated", id);
        }

        if let Some(institution_ids) = request.institution_ids {
            self.linkage
                .sync_service_institutions(id, &institution_ids)
                .await?;
        }

        self.require(id).await
    }

    /// Unlinks the service from every institution, then deletes it. A failed
    /// unlink keeps the service.
    pub async fn delete(&self, id: &str) -> Result<(), DirectoryError> {
        self.require(id).await?;
        let unlinked = self.linkage.unlink_everywhere(id).await?;
        self.store.delete(Collection::Services, id).await?;
        info!("Service {} deleted after unlinking {} institutions", id, unlinked);
        Ok(())
    }
}

fn clean_requirements(requirements: Vec<String>) -> Vec<String> {
    requirements
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}
