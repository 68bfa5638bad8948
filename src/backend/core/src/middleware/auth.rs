//! API key authentication middleware.
//!
//! Every request must present the shared secret in the configured header
//! (`X-API-Key` by default). Health and Prometheus endpoints are public;
//! everything else is rejected with 401 before reaching a handler.

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::future::BoxFuture;
use metrics::counter;
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use thiserror::Error;
use tower::{Layer, Service};
use tracing::debug;

use crate::config::AuthConfig;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing API key")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let code = match &self {
            Self::MissingApiKey => "MISSING_API_KEY",
            Self::InvalidApiKey => "INVALID_API_KEY",
        };

        counter!(
            "pulse_auth_errors_total",
            "error_type" => code.to_string()
        )
        .increment(1);

        let body = serde_json::json!({
            "success": false,
            "error": {
                "code": code,
                "message": "Invalid or missing API Key",
            }
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Authenticator
// ═══════════════════════════════════════════════════════════════════════════════

/// Shared-secret validator behind the tower layer.
pub struct ApiKeyAuth {
    api_key: String,
    header: String,
    public_paths: Vec<String>,
}

impl ApiKeyAuth {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            header: config.header.clone(),
            public_paths: vec!["/health".to_string(), "/metrics".to_string()],
        }
    }

    /// Check if a path bypasses authentication.
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| path == p)
    }

    /// Validate the key presented on a request.
    pub fn check(&self, request: &Request<Body>) -> Result<(), AuthError> {
        let presented = request
            .headers()
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingApiKey)?;

        if presented != self.api_key {
            debug!(path = request.uri().path(), "rejected invalid API key");
            return Err(AuthError::InvalidApiKey);
        }

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layer and Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication layer for Tower.
#[derive(Clone)]
pub struct ApiKeyLayer {
    auth: Arc<ApiKeyAuth>,
}

impl ApiKeyLayer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            auth: Arc::new(ApiKeyAuth::new(config)),
        }
    }
}

impl<S> Layer<S> for ApiKeyLayer {
    type Service = ApiKeyService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKeyService {
            inner,
            auth: self.auth.clone(),
        }
    }
}

/// Authentication service.
#[derive(Clone)]
pub struct ApiKeyService<S> {
    inner: S,
    auth: Arc<ApiKeyAuth>,
}

impl<S> Service<Request<Body>> for ApiKeyService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let auth = self.auth.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if auth.is_public_path(request.uri().path()) {
                return inner.call(request).await;
            }

            match auth.check(&request) {
                Ok(()) => inner.call(request).await,
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> ApiKeyAuth {
        ApiKeyAuth::new(&AuthConfig {
            api_key: "secret-key".to_string(),
            header: "X-API-Key".to_string(),
        })
    }

    fn request_with_key(key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/v1/events");
        if let Some(key) = key {
            builder = builder.header("X-API-Key", key);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_public_paths_bypass_auth() {
        let auth = auth();
        assert!(auth.is_public_path("/health"));
        assert!(auth.is_public_path("/metrics"));
        assert!(!auth.is_public_path("/api/v1/events"));
    }

    #[test]
    fn test_valid_key_accepted() {
        assert!(auth().check(&request_with_key(Some("secret-key"))).is_ok());
    }

    #[test]
    fn test_wrong_key_rejected() {
        assert!(matches!(
            auth().check(&request_with_key(Some("nope"))),
            Err(AuthError::InvalidApiKey)
        ));
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(matches!(
            auth().check(&request_with_key(None)),
            Err(AuthError::MissingApiKey)
        ));
    }
}
