use serde::Serialize;

use profile_cell::Profile;
use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::Role;

/// Admin areas, each guarded by a minimum role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminResource {
    Dashboard,
    Bookings,
    Institutions,
    Services,
    Collaborators,
}

impl AdminResource {
    pub const ALL: [AdminResource; 5] = [
        AdminResource::Dashboard,
        AdminResource::Bookings,
        AdminResource::Institutions,
        AdminResource::Services,
        AdminResource::Collaborators,
    ];

    pub fn min_role(self) -> Role {
        match self {
            AdminResource::Dashboard | AdminResource::Bookings => Role::Attendant,
            AdminResource::Institutions => Role::Admin,
            AdminResource::Services => Role::Supervisor,
            AdminResource::Collaborators => Role::Owner,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            AdminResource::Dashboard => "/admin/stats",
            AdminResource::Bookings => "/admin/bookings",
            AdminResource::Institutions => "/admin/institutions",
            AdminResource::Services => "/admin/services",
            AdminResource::Collaborators => "/admin/collaborators",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AdminResource::Dashboard => "Painel",
            AdminResource::Bookings => "Marcações",
            AdminResource::Institutions => "Instituições",
            AdminResource::Services => "Serviços",
            AdminResource::Collaborators => "Colaboradores",
        }
    }
}

/// Authorized caller of one request; rebuilt from the stored profile every time.
#[derive(Debug, Clone)]
pub struct Session {
    pub profile: Profile,
}

impl Session {
    pub fn subject_id(&self) -> &str {
        &self.profile.subject_id
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    pub fn can_access(&self, resource: AdminResource) -> bool {
        self.role().meets_minimum(resource.min_role())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub resource: AdminResource,
    pub label: &'static str,
    pub path: &'static str,
    pub min_role: Role,
}

impl From<AdminResource> for NavItem {
    fn from(resource: AdminResource) -> Self {
        Self {
            resource,
            label: resource.label(),
            path: resource.path(),
            min_role: resource.min_role(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("No profile for this session")]
    ProfileMissing,

    #[error("Profile could not be read")]
    ProfileUnreadable,

    #[error("Requires role {required}, session has {actual}")]
    InsufficientRole { required: Role, actual: Role },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::ProfileMissing => AppError::Auth(err.to_string()),
            AccessError::ProfileUnreadable | AccessError::InsufficientRole { .. } => {
                AppError::Forbidden(err.to_string())
            }
            AccessError::Store(e) => e.into(),
        }
    }
}
