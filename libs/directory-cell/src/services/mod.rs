pub mod catalog;
pub mod collaborator;
pub mod institution;
pub mod linkage;

pub use catalog::{categories, ServiceCatalog};
pub use collaborator::CollaboratorService;
pub use institution::InstitutionService;
pub use linkage::LinkageService;
