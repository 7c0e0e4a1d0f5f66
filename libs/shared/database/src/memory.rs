use std::collections::{BTreeMap, HashMap};

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::identity::{IdentityError, IdentityProvider};
use crate::store::{compare_values, Collection, Direction, DocumentStore, Query, StoreError};

type Table = BTreeMap<String, Map<String, Value>>;

/// Process-local `DocumentStore`, used for local runs and tests.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<Collection, Table>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_id(id: &str, doc: &Map<String, Value>) -> Value {
        let mut doc = doc.clone();
        doc.insert("id".to_string(), Value::String(id.to_string()));
        Value::Object(doc)
    }

    fn into_object(data: Value) -> Result<Map<String, Value>, StoreError> {
        match data {
            Value::Object(mut map) => {
                map.remove("id");
                Ok(map)
            }
            other => Err(StoreError::InvalidDocument(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    async fn edit_array<F>(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        edit: F,
    ) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<Value>) + Send,
    {
        let mut tables = self.tables.write().await;
        let doc = tables
            .entry(collection)
            .or_default()
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        let slot = doc
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            edit(items);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&collection)
            .and_then(|table| table.get(id))
            .map(|doc| Self::with_id(id, doc)))
    }

    async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<Value> = table
            .iter()
            .filter(|(_, doc)| query.matches(doc))
            .map(|(id, doc)| Self::with_id(id, doc))
            .collect();

        if let Some((field, direction)) = &query.order_by {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(field), b.get(field));
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<usize, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&collection)
            .map(|table| table.values().filter(|doc| query.matches(doc)).count())
            .unwrap_or(0))
    }

    async fn create(&self, collection: Collection, data: Value) -> Result<String, StoreError> {
        let doc = Self::into_object(data)?;
        let id = Uuid::new_v4().to_string();

        let mut tables = self.tables.write().await;
        tables.entry(collection).or_default().insert(id.clone(), doc);

        debug!("Created {}/{}", collection.as_str(), id);
        Ok(id)
    }

    async fn set(&self, collection: Collection, id: &str, data: Value) -> Result<(), StoreError> {
        let doc = Self::into_object(data)?;
        let mut tables = self.tables.write().await;
        tables
            .entry(collection)
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn update(&self, collection: Collection, id: &str, patch: Value) -> Result<(), StoreError> {
        let patch = Self::into_object(patch)?;
        let mut tables = self.tables.write().await;
        let doc = tables
            .entry(collection)
            .or_default()
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        for (key, value) in patch {
            doc.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(table) = tables.get_mut(&collection) {
            table.remove(id);
        }
        Ok(())
    }

    async fn array_union(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let value = Value::String(value.to_string());
        self.edit_array(collection, id, field, move |items| {
            if !items.contains(&value) {
                items.push(value);
            }
        })
        .await
    }

    async fn array_remove(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let value = Value::String(value.to_string());
        self.edit_array(collection, id, field, move |items| {
            items.retain(|item| item != &value);
        })
        .await
    }
}

struct Account {
    subject_id: String,
    password_hash: String,
}

/// Process-local `IdentityProvider` with argon2-hashed secrets.
pub struct InMemoryIdentity {
    accounts: RwLock<HashMap<String, Account>>,
    hasher: Argon2<'static>,
}

impl Default for InMemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentity {
    pub const MIN_SECRET_LEN: usize = 6;

    pub fn new() -> Self {
        // Light parameters: these accounts live only as long as the process.
        let params = Params::new(4096, 1, 1, None).unwrap_or_default();
        Self {
            accounts: RwLock::new(HashMap::new()),
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    fn key(identifier: &str) -> String {
        identifier.trim().to_lowercase()
    }

    fn hash(&self, secret: &str) -> Result<String, IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| IdentityError::Provider(e.to_string()))
    }

    fn verify(&self, secret: &str, hash: &str) -> Result<bool, IdentityError> {
        let parsed = PasswordHash::new(hash).map_err(|e| IdentityError::Provider(e.to_string()))?;
        match self.hasher.verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(IdentityError::Provider(e.to_string())),
        }
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    #[instrument(skip(self, secret))]
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<String, IdentityError> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(&Self::key(identifier))
            .ok_or(IdentityError::UnknownIdentifier)?;

        if self.verify(secret, &account.password_hash)? {
            Ok(account.subject_id.clone())
        } else {
            Err(IdentityError::InvalidCredentials)
        }
    }

    #[instrument(skip(self, secret))]
    async fn sign_up(&self, identifier: &str, secret: &str) -> Result<String, IdentityError> {
        if secret.chars().count() < Self::MIN_SECRET_LEN {
            return Err(IdentityError::WeakSecret(format!(
                "must be at least {} characters",
                Self::MIN_SECRET_LEN
            )));
        }

        let key = Self::key(identifier);
        let password_hash = self.hash(secret)?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(IdentityError::AlreadyExists);
        }

        let subject_id = Uuid::new_v4().to_string();
        accounts.insert(
            key,
            Account {
                subject_id: subject_id.clone(),
                password_hash,
            },
        );
        Ok(subject_id)
    }

    async fn sign_out(&self, subject_id: &str) -> Result<(), IdentityError> {
        debug!("Signed out {}", subject_id);
        Ok(())
    }

    async fn remove_account(&self, subject_id: &str) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.write().await;
        accounts.retain(|_, account| account.subject_id != subject_id);
        Ok(())
    }
}
