use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use profile_cell::ProfileError;
use shared_database::{IdentityError, StoreError};
use shared_models::error::AppError;
use shared_models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceCategory {
    #[serde(rename = "documentacao-pessoal")]
    Personal,
    #[serde(rename = "documentacao-habitacional")]
    Housing,
    #[serde(rename = "documentacao-automovel")]
    Vehicle,
    #[serde(rename = "documentacao-comercial")]
    Commercial,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 4] = [
        ServiceCategory::Personal,
        ServiceCategory::Housing,
        ServiceCategory::Vehicle,
        ServiceCategory::Commercial,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceCategory::Personal => "documentacao-pessoal",
            ServiceCategory::Housing => "documentacao-habitacional",
            ServiceCategory::Vehicle => "documentacao-automovel",
            ServiceCategory::Commercial => "documentacao-comercial",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ServiceCategory::Personal => "Documentação Pessoal",
            ServiceCategory::Housing => "Documentação Habitacional",
            ServiceCategory::Vehicle => "Documentação Automóvel",
            ServiceCategory::Commercial => "Documentação Comercial",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ServiceCategory::Personal => "Bilhete de Identidade, Passaporte, Registo Criminal",
            ServiceCategory::Housing => "Registos de propriedade, licenças habitacionais",
            ServiceCategory::Vehicle => "Carta de condução, registo de veículos",
            ServiceCategory::Commercial => "Licenças comerciais, registos empresariais",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| DirectoryError::ValidationError(format!("Unknown category: {}", s)))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub id: ServiceCategory,
    pub label: &'static str,
    pub description: &'static str,
}

impl From<ServiceCategory> for CategoryInfo {
    fn from(category: ServiceCategory) -> Self {
        Self {
            id: category,
            label: category.label(),
            description: category.description(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One bookable time of day. Stored on institutions with a custom schedule,
/// derived per day everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub time: String,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub current_bookings: u32,
    pub max_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub coordinates: Coordinates,
    #[serde(default, alias = "services")]
    pub service_ids: Vec<String>,
    #[serde(default)]
    pub available_slots: Vec<TimeSlot>,
    #[serde(default)]
    pub max_capacity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Institution {
    pub fn offers(&self, service_id: &str) -> bool {
        self.service_ids.iter().any(|id| id == service_id)
    }

    pub fn has_custom_schedule(&self) -> bool {
        !self.available_slots.is_empty()
    }
}

/// Institution as shown to a citizen choosing where to book.
#[derive(Debug, Clone, Serialize)]
pub struct InstitutionView {
    #[serde(flatten)]
    pub institution: Institution,
    pub pinned: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstitutionRequest {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub coordinates: Coordinates,
    #[serde(default, alias = "services")]
    pub service_ids: Vec<String>,
    #[serde(default)]
    pub available_slots: Vec<TimeSlot>,
    #[serde(default)]
    pub max_capacity: u32,
    pub operating_hours: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInstitutionRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
    #[serde(alias = "services")]
    pub service_ids: Option<Vec<String>>,
    pub available_slots: Option<Vec<TimeSlot>>,
    pub max_capacity: Option<u32>,
    pub operating_hours: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub category: ServiceCategory,
    #[serde(default)]
    pub average_duration: u32,
    #[serde(default)]
    pub max_capacity: u32,
    #[serde(default)]
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub name: String,
    pub category: ServiceCategory,
    #[serde(default)]
    pub average_duration: u32,
    #[serde(default)]
    pub max_capacity: u32,
    #[serde(default)]
    pub requirements: Vec<String>,
    /// Institutions to link right after creation.
    #[serde(default)]
    pub institution_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub category: Option<ServiceCategory>,
    pub average_duration: Option<u32>,
    pub max_capacity: Option<u32>,
    pub requirements: Option<Vec<String>>,
    /// Desired linked institutions; synced when present.
    pub institution_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceFilter {
    pub category: Option<ServiceCategory>,
    pub search: Option<String>,
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncInstitutionsRequest {
    pub institution_ids: Vec<String>,
}

/// Outcome of reconciling a service's institution links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkSyncReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    #[serde(default)]
    pub id: String,
    #[serde(alias = "nomeCompleto")]
    pub full_name: String,
    pub email: String,
    #[serde(default, alias = "telefone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub institution_ids: Vec<String>,
    #[serde(default)]
    pub service_ids: Vec<String>,
    /// Identity subject once the collaborator has completed first login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollaboratorRequest {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub institution_ids: Vec<String>,
    #[serde(default)]
    pub service_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollaboratorRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub institution_ids: Option<Vec<String>>,
    pub service_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstitutionSearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Institution not found: {0}")]
    InstitutionNotFound(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Collaborator not found: {0}")]
    CollaboratorNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("A collaborator with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Link sync for service {service_id} partially failed: {applied} applied, failed institutions {failed:?}")]
    PartialSync {
        service_id: String,
        applied: usize,
        failed: Vec<String>,
    },

    #[error("Service {service_id} kept: could not unlink institutions {failed:?}")]
    CleanupFailed {
        service_id: String,
        failed: Vec<String>,
    },

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::InstitutionNotFound(_)
            | DirectoryError::ServiceNotFound(_)
            | DirectoryError::CollaboratorNotFound(_) => AppError::NotFound(err.to_string()),
            DirectoryError::ValidationError(msg) => AppError::ValidationError(msg),
            DirectoryError::DuplicateEmail(_) => AppError::Conflict(err.to_string()),
            DirectoryError::PartialSync { .. } | DirectoryError::CleanupFailed { .. } => {
                AppError::ExternalService(err.to_string())
            }
            DirectoryError::Profile(e) => e.into(),
            DirectoryError::Identity(e) => e.into(),
            DirectoryError::Store(e) => e.into(),
        }
    }
}
