//! HTTP client for communicating with the Pulse API server.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Error envelope returned by the server on failures.
#[derive(Debug, serde::Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Outcome of an ingestion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Created,
    Replayed,
}

/// HTTP client for the Pulse API.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client pointing at the given base URL. The API key is
    /// attached to every request.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-API-Key",
            HeaderValue::from_str(api_key).context("Invalid API key value")?,
        );

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Return the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a GET request and deserialize the response body. Query
    /// parameters are passed as pairs so reqwest handles the encoding.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(api_error(status, resp.text().await.unwrap_or_default()));
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    /// Perform a POST request, reporting whether the server created a new
    /// resource (201) or replayed an existing one (200).
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(T, PostOutcome)> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(api_error(status, resp.text().await.unwrap_or_default()));
        }

        let outcome = if status == StatusCode::CREATED {
            PostOutcome::Created
        } else {
            PostOutcome::Replayed
        };

        let parsed = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))?;

        Ok((parsed, outcome))
    }
}

/// Turn a non-2xx response into a readable error, preferring the server's
/// structured message when the body parses.
fn api_error(status: StatusCode, body: String) -> anyhow::Error {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
        if let Some(error) = envelope.error {
            let code = error.code.unwrap_or_else(|| "UNKNOWN".to_string());
            let message = error.message.unwrap_or_default();
            return anyhow::anyhow!("API error ({}): [{}] {}", status, code, message);
        }
    }
    anyhow::anyhow!("API error ({}): {}", status, body)
}
