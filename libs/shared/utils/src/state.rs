use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use shared_config::{AppConfig, StorageBackend};
use shared_database::{
    DocumentStore, IdentityProvider, InMemoryIdentity, InMemoryStore, SupabaseIdentity,
    SupabaseStore,
};
use shared_models::auth::SessionEvent;

use crate::jwt::token_expiry;

const SESSION_EVENT_CAPACITY: usize = 64;

/// Shared handles threaded through every router.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    events: broadcast::Sender<SessionEvent>,
    /// Revoked token to its `exp`; entries leave once the token would have expired anyway.
    revoked_tokens: Arc<RwLock<HashMap<String, i64>>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            config: Arc::new(config),
            store,
            identity,
            events,
            revoked_tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryIdentity::new()),
        )
    }

    pub fn from_config(config: AppConfig) -> Self {
        match config.storage_backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage and identity");
                Self::in_memory(config)
            }
            StorageBackend::Supabase => {
                info!("Using Supabase storage and identity at {}", config.supabase_url);
                let store = Arc::new(SupabaseStore::new(&config));
                let identity = Arc::new(SupabaseIdentity::new(&config));
                Self::new(config, store, identity)
            }
        }
    }

    /// Observe sign-in and sign-out transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) {
        // No receivers is fine.
        if self.events.send(event).is_err() {
            debug!("No session event subscribers");
        }
    }

    pub async fn revoke_token(&self, token: &str) {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked_tokens.write().await;
        let before = revoked.len();
        revoked.retain(|_, exp| *exp >= now);
        if revoked.len() < before {
            debug!("Pruned {} expired revocations", before - revoked.len());
        }

        // Tokens without a readable expiry never validate, so there is nothing to remember.
        match token_expiry(token) {
            Some(exp) if exp >= now => {
                revoked.insert(token.to_string(), exp);
            }
            _ => debug!("Revoked token is already unusable"),
        }
    }

    pub async fn is_revoked(&self, token: &str) -> bool {
        self.revoked_tokens.read().await.contains_key(token)
    }

    pub async fn revoked_count(&self) -> usize {
        self.revoked_tokens.read().await.len()
    }
}
