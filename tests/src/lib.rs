//! In-process client for the composed portal router.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use shared_utils::AppState;

/// Response status plus decoded JSON body (`Null` when the body is empty).
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Test client with authentication capabilities
pub struct ApiTestClient {
    app: Router,
    auth_token: Option<String>,
}

impl ApiTestClient {
    pub fn new(state: AppState) -> Self {
        Self {
            app: portal_api::create_router(state),
            auth_token: None,
        }
    }

    /// Same router, different caller.
    pub fn with_token(&self, token: &str) -> Self {
        Self {
            app: self.app.clone(),
            auth_token: Some(token.to_string()),
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.auth_token = token;
    }

    async fn send(&self, method: &str, path: &str, body: Option<Value>) -> ApiResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = &self.auth_token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");

        ApiResponse {
            status,
            body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        }
    }

    pub async fn get(&self, path: &str) -> ApiResponse {
        self.send("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> ApiResponse {
        self.send("POST", path, Some(body)).await
    }

    pub async fn post_empty(&self, path: &str) -> ApiResponse {
        self.send("POST", path, None).await
    }

    pub async fn put(&self, path: &str, body: Value) -> ApiResponse {
        self.send("PUT", path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> ApiResponse {
        self.send("PATCH", path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> ApiResponse {
        self.send("DELETE", path, None).await
    }
}
