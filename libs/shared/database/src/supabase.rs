use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::identity::{IdentityError, IdentityProvider};
use crate::store::{Collection, Direction, DocumentStore, FilterOp, Query, StoreError};

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            service_role_key: config.supabase_service_role_key.clone(),
        }
    }

    pub fn has_service_role(&self) -> bool {
        !self.service_role_key.is_empty()
    }

    pub fn service_role_key(&self) -> &str {
        &self.service_role_key
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Server-side table access runs with the service role when available.
        let bearer = auth_token.or_else(|| {
            if self.service_role_key.is_empty() {
                None
            } else {
                Some(self.service_role_key.as_str())
            }
        });
        if let Some(token) = bearer {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        Ok(headers)
    }

    /// Sends a request and hands back the raw response, whatever its status.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: &[(&'static str, &str)],
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.get_headers(auth_token)?;
        for (name, value) in extra_headers {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_str(value)?);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        Ok(req.send().await?)
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: &[(&'static str, &str)],
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .send(method, path, auth_token, body, extra_headers)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        // PostgREST answers 204 with an empty body when no representation is asked for.
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, &[])
            .await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn filter_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders a query as PostgREST URL parameters.
pub fn postgrest_params(query: &Query) -> String {
    let mut params: Vec<String> = Vec::new();

    for filter in &query.filters {
        let expr = match filter.op {
            FilterOp::Eq => format!("eq.{}", filter_literal(&filter.value)),
            FilterOp::In => {
                let items = match &filter.value {
                    Value::Array(items) => items.iter().map(filter_literal).collect::<Vec<_>>(),
                    other => vec![filter_literal(other)],
                };
                format!("in.({})", items.join(","))
            }
            FilterOp::ArrayContains => format!("cs.{{{}}}", filter_literal(&filter.value)),
        };
        params.push(format!(
            "{}={}",
            filter.field,
            urlencoding::encode(&expr)
        ));
    }

    if let Some((field, direction)) = &query.order_by {
        let dir = match direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        params.push(format!("order={}.{}", field, dir));
    }

    if let Some(limit) = query.limit {
        params.push(format!("limit={}", limit));
    }

    params.join("&")
}

const ARRAY_EDIT_ATTEMPTS: usize = 5;

/// Postgres array literal, e.g. `{"a","b"}`, for matching a text[] column.
fn array_literal(items: &[Value]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| {
            let text = filter_literal(item);
            format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
        })
        .collect();
    format!("{{{}}}", quoted.join(","))
}

fn backend(err: anyhow::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// `DocumentStore` over Supabase PostgREST. One table per collection, keyed by a text `id`.
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
        }
    }

    fn table_path(collection: Collection) -> String {
        format!("/rest/v1/{}", collection.as_str())
    }

    fn row_path(collection: Collection, id: &str) -> String {
        format!(
            "{}?id=eq.{}",
            Self::table_path(collection),
            urlencoding::encode(id)
        )
    }

    fn object(data: Value) -> Result<Map<String, Value>, StoreError> {
        match data {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::InvalidDocument(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    /// Compare-and-swap edit of an array column. The PATCH only matches while
    /// the column still holds what was read; a lost race re-reads and retries.
    async fn rewrite_array<F>(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        edit: F,
    ) -> Result<(), StoreError>
    where
        F: Fn(&mut Vec<Value>) + Send + Sync,
    {
        for attempt in 1..=ARRAY_EDIT_ATTEMPTS {
            let doc = self
                .get(collection, id)
                .await?
                .ok_or_else(|| StoreError::not_found(collection, id))?;

            let current = match doc.get(field) {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
            let mut items = current.clone();
            edit(&mut items);
            if items == current {
                return Ok(());
            }

            let path = format!(
                "{}&{}={}",
                Self::row_path(collection, id),
                field,
                urlencoding::encode(&format!("eq.{}", array_literal(&current)))
            );
            let rows: Vec<Value> = self
                .client
                .request_with_headers(
                    Method::PATCH,
                    &path,
                    None,
                    Some(json!({ field: items })),
                    &[("prefer", "return=representation")],
                )
                .await
                .map_err(backend)?;

            if !rows.is_empty() {
                return Ok(());
            }
            debug!(
                "Array edit on {}/{}.{} lost a race (attempt {})",
                collection.as_str(),
                id,
                field,
                attempt
            );
        }

        warn!(
            "Giving up on array edit {}/{}.{} after {} attempts",
            collection.as_str(),
            id,
            field,
            ARRAY_EDIT_ATTEMPTS
        );
        Err(StoreError::Contention {
            collection: collection.as_str(),
            id: id.to_string(),
        })
    }
}

#[async_trait]
impl DocumentStore for SupabaseStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &Self::row_path(collection, id), None, None)
            .await
            .map_err(backend)?;

        Ok(rows.into_iter().next())
    }

    async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, StoreError> {
        let params = postgrest_params(query);
        let path = if params.is_empty() {
            Self::table_path(collection)
        } else {
            format!("{}?{}", Self::table_path(collection), params)
        };

        self.client
            .request(Method::GET, &path, None, None)
            .await
            .map_err(backend)
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<usize, StoreError> {
        let params = postgrest_params(query);
        let path = if params.is_empty() {
            format!("{}?select=id", Self::table_path(collection))
        } else {
            format!("{}?select=id&{}", Self::table_path(collection), params)
        };

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None, None)
            .await
            .map_err(backend)?;

        Ok(rows.len())
    }

    async fn create(&self, collection: Collection, data: Value) -> Result<String, StoreError> {
        let mut row = Self::object(data)?;
        let id = Uuid::new_v4().to_string();
        row.insert("id".to_string(), Value::String(id.clone()));

        let _: Value = self
            .client
            .request_with_headers(
                Method::POST,
                &Self::table_path(collection),
                None,
                Some(Value::Object(row)),
                &[("prefer", "return=minimal")],
            )
            .await
            .map_err(backend)?;

        debug!("Created {}/{}", collection.as_str(), id);
        Ok(id)
    }

    async fn set(&self, collection: Collection, id: &str, data: Value) -> Result<(), StoreError> {
        let mut row = Self::object(data)?;
        row.insert("id".to_string(), Value::String(id.to_string()));

        let _: Value = self
            .client
            .request_with_headers(
                Method::POST,
                &Self::table_path(collection),
                None,
                Some(Value::Object(row)),
                &[("prefer", "resolution=merge-duplicates,return=minimal")],
            )
            .await
            .map_err(backend)?;

        Ok(())
    }

    async fn update(&self, collection: Collection, id: &str, patch: Value) -> Result<(), StoreError> {
        let mut patch = Self::object(patch)?;
        patch.remove("id");

        let rows: Vec<Value> = self
            .client
            .request_with_headers(
                Method::PATCH,
                &Self::row_path(collection, id),
                None,
                Some(Value::Object(patch)),
                &[("prefer", "return=representation")],
            )
            .await
            .map_err(backend)?;

        if rows.is_empty() {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let _: Value = self
            .client
            .request(Method::DELETE, &Self::row_path(collection, id), None, None)
            .await
            .map_err(backend)?;

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
        self.rewrite_array(collection, id, field, |items| {
            if !items.contains(&value) {
                items.push(value.clone());
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
        self.rewrite_array(collection, id, field, |items| {
            items.retain(|item| item != &value);
        })
        .await
    }
}

/// `IdentityProvider` over Supabase GoTrue email/password accounts.
pub struct SupabaseIdentity {
    client: SupabaseClient,
}

impl SupabaseIdentity {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
        }
    }

    async fn error_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }

    fn subject_from(body: &Value) -> Option<String> {
        body.get("user")
            .and_then(|user| user.get("id"))
            .or_else(|| body.get("id"))
            .and_then(|id| id.as_str())
            .map(str::to_string)
    }
}

fn provider(err: impl std::fmt::Display) -> IdentityError {
    IdentityError::Provider(err.to_string())
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<String, IdentityError> {
        let response = self
            .client
            .send(
                Method::POST,
                "/auth/v1/token?grant_type=password",
                Some(self.client.anon_key.as_str()),
                Some(json!({ "email": identifier, "password": secret })),
                &[],
            )
            .await
            .map_err(provider)?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let text = Self::error_body(response).await;
            debug!("Sign-in rejected for {}: {}", identifier, text);
            return Err(IdentityError::InvalidCredentials);
        }
        if !status.is_success() {
            let text = Self::error_body(response).await;
            error!("Sign-in failed ({}): {}", status, text);
            return Err(IdentityError::Provider(format!("{}: {}", status, text)));
        }

        let body: Value = response.json().await.map_err(provider)?;
        Self::subject_from(&body)
            .ok_or_else(|| IdentityError::Provider("sign-in response without user id".to_string()))
    }

    async fn sign_up(&self, identifier: &str, secret: &str) -> Result<String, IdentityError> {
        let response = self
            .client
            .send(
                Method::POST,
                "/auth/v1/signup",
                Some(self.client.anon_key.as_str()),
                Some(json!({ "email": identifier, "password": secret })),
                &[],
            )
            .await
            .map_err(provider)?;

        let status = response.status();
        if !status.is_success() {
            let text = Self::error_body(response).await;
            let lowered = text.to_lowercase();
            if lowered.contains("already") {
                return Err(IdentityError::AlreadyExists);
            }
            if lowered.contains("password") {
                return Err(IdentityError::WeakSecret(text));
            }
            error!("Sign-up failed ({}): {}", status, text);
            return Err(IdentityError::Provider(format!("{}: {}", status, text)));
        }

        let body: Value = response.json().await.map_err(provider)?;
        Self::subject_from(&body)
            .ok_or_else(|| IdentityError::Provider("sign-up response without user id".to_string()))
    }

    async fn sign_out(&self, subject_id: &str) -> Result<(), IdentityError> {
        // Portal sessions are tokens we issue; no provider session is retained.
        debug!("Provider sign-out for {} is a no-op", subject_id);
        Ok(())
    }

    async fn remove_account(&self, subject_id: &str) -> Result<(), IdentityError> {
        if !self.client.has_service_role() {
            warn!("Service role key missing, cannot remove account {}", subject_id);
            return Err(IdentityError::Provider(
                "service role key not configured".to_string(),
            ));
        }

        let path = format!("/auth/v1/admin/users/{}", urlencoding::encode(subject_id));
        let response = self
            .client
            .send(
                Method::DELETE,
                &path,
                Some(self.client.service_role_key()),
                None,
                &[],
            )
            .await
            .map_err(provider)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let text = Self::error_body(response).await;
        error!("Account removal failed ({}): {}", status, text);
        Err(IdentityError::Provider(format!("{}: {}", status, text)))
    }
}
