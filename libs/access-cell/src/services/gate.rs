use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use profile_cell::Profile;
use shared_database::store::fetch_one;
use shared_database::{Collection, DocumentStore, StoreError};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::Role;
use shared_utils::AppState;

use crate::models::{AccessError, AdminResource, NavItem, Session};

/// Per-request role check against the stored profile. Nothing is cached.
pub struct AccessGate {
    store: Arc<dyn DocumentStore>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Resolves the caller's profile, failing closed on anything unexpected.
    pub async fn session(&self, user: &User) -> Result<Session, AccessError> {
        let profile: Option<Profile> =
            match fetch_one(self.store.as_ref(), Collection::Users, &user.id).await {
                Ok(profile) => profile,
                Err(StoreError::Serialization(e)) => {
                    warn!("Profile {} is unreadable: {}", user.id, e);
                    return Err(AccessError::ProfileUnreadable);
                }
                Err(e) => return Err(e.into()),
            };

        match profile {
            Some(profile) => Ok(Session { profile }),
            None => {
                warn!("Denied {}: no profile", user.id);
                Err(AccessError::ProfileMissing)
            }
        }
    }

    pub async fn require_role(&self, user: &User, required: Role) -> Result<Session, AccessError> {
        let session = self.session(user).await?;
        let actual = session.role();

        if !actual.meets_minimum(required) {
            warn!("Denied {} with role {}: requires {}", user.id, actual, required);
            return Err(AccessError::InsufficientRole { required, actual });
        }

        debug!("Granted {} with role {} (min {})", user.id, actual, required);
        Ok(session)
    }

    pub async fn authorize(
        &self,
        user: &User,
        resource: AdminResource,
    ) -> Result<Session, AccessError> {
        self.require_role(user, resource.min_role()).await
    }
}

/// Handler entry point: every admin operation calls this before touching data.
pub async fn authorize(
    state: &AppState,
    user: &User,
    resource: AdminResource,
) -> Result<Session, AppError> {
    Ok(AccessGate::new(state.store.clone())
        .authorize(user, resource)
        .await?)
}

/// Layered inside `auth_middleware`: a token whose subject has no readable
/// profile is treated as no session at all. Inserts the resolved `Session`.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("Missing session".to_string()))?;

    let session = AccessGate::new(state.store.clone()).session(&user).await?;
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// Admin areas a role may open, in display order.
pub fn navigation_for(role: Role) -> Vec<NavItem> {
    AdminResource::ALL
        .into_iter()
        .filter(|resource| role.meets_minimum(resource.min_role()))
        .map(NavItem::from)
        .collect()
}
