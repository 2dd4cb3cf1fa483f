//! RunPod REST client.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{CreateInstanceRequest, CreatedInstance, Instance, Template, Volume};
use crate::config::ProviderConfig;

/// Longest error excerpt shown to users.
const MAX_ERROR_DETAIL: usize = 200;

/// Errors that can occur while talking to RunPod.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request to RunPod failed: {0}")]
    Transport(String),

    #[error("RunPod returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected RunPod response: {0}")]
    Decode(String),

    #[error("Invalid RunPod API key: {0}")]
    InvalidCredential(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Transport(format!("timed out: {err}"));
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Transport(err.to_string())
    }
}

impl ProviderError {
    /// Short human-readable detail suitable for a chat message.
    #[must_use]
    pub fn user_detail(&self) -> String {
        let detail = match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        };
        truncate_chars(&detail, MAX_ERROR_DETAIL)
    }
}

/// Operations the bot needs from the instance provider.
#[async_trait]
pub trait InstanceProvider: Send + Sync {
    /// Lists saved templates. A non-list response yields an empty list.
    async fn list_templates(&self) -> Result<Vec<Template>, ProviderError>;

    /// Lists network volumes. A non-list response yields an empty list.
    async fn list_volumes(&self) -> Result<Vec<Volume>, ProviderError>;

    /// Lists all instances on the account.
    async fn list_instances(&self) -> Result<Vec<Instance>, ProviderError>;

    /// Creates a new instance.
    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> Result<CreatedInstance, ProviderError>;

    /// Stops an instance, keeping its storage.
    async fn stop_instance(&self, instance_id: &str) -> Result<(), ProviderError>;

    /// Terminates an instance permanently.
    async fn terminate_instance(&self, instance_id: &str) -> Result<(), ProviderError>;
}

/// [`InstanceProvider`] backed by the RunPod REST API.
pub struct RunPodClient {
    http: Client,
    api_base: String,
}

impl RunPodClient {
    /// Builds a client with the bearer credential and timeout from `config`.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| ProviderError::InvalidCredential(e.to_string()))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.api_base)
    }

    /// Sends a request and turns non-2xx responses into [`ProviderError::Status`].
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&CreateInstanceRequest>,
    ) -> Result<Response, ProviderError> {
        debug!("RunPod {} {}", method, endpoint);

        let mut request = self.http.request(method.clone(), self.url(endpoint));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        warn!(
            "RunPod {} {} failed: status={}, body={}",
            method,
            endpoint,
            status.as_u16(),
            truncate_chars(&text, 500)
        );

        Err(ProviderError::Status {
            status: status.as_u16(),
            message: extract_error_message(&text),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ProviderError> {
        let response = self.send(Method::GET, endpoint, None).await?;
        Ok(response.json().await?)
    }

    /// Fetches a listing, tolerating a non-list body as "nothing there".
    async fn get_list<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>, ProviderError> {
        let value: Value = self.get_json(endpoint).await?;
        decode_list(endpoint, value)
    }
}

#[async_trait]
impl InstanceProvider for RunPodClient {
    async fn list_templates(&self) -> Result<Vec<Template>, ProviderError> {
        self.get_list("/templates").await
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>, ProviderError> {
        self.get_list("/networkvolumes").await
    }

    async fn list_instances(&self) -> Result<Vec<Instance>, ProviderError> {
        let value: Value = self.get_json("/pods").await?;
        if !value.is_array() {
            return Err(ProviderError::Decode(format!(
                "expected a list of pods, got: {}",
                truncate_chars(&value.to_string(), 100)
            )));
        }
        serde_json::from_value(value).map_err(|e| ProviderError::Decode(e.to_string()))
    }

    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> Result<CreatedInstance, ProviderError> {
        let response = self.send(Method::POST, "/pods", Some(request)).await?;
        let raw: Value = response.json().await?;
        Ok(CreatedInstance::from_response(raw))
    }

    async fn stop_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.send(Method::POST, &format!("/pods/{instance_id}/stop"), None)
            .await
            .map(|_| ())
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.send(Method::DELETE, &format!("/pods/{instance_id}"), None)
            .await
            .map(|_| ())
    }
}

impl std::fmt::Debug for RunPodClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunPodClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

/// Decodes a listing body; anything but a JSON array becomes an empty list.
fn decode_list<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<Vec<T>, ProviderError> {
    if !value.is_array() {
        warn!("RunPod {} returned a non-list body, treating as empty", endpoint);
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Pulls a readable message out of an error body.
///
/// Understands `{"error": "..."}` and `{"error": {"message": "..."}}`;
/// otherwise returns the start of the raw body.
fn extract_error_message(body: &str) -> String {
    let fallback = truncate_chars(body, MAX_ERROR_DETAIL);

    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return fallback;
    };

    match parsed.get("error") {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        Some(Value::Object(inner)) => inner
            .get("message")
            .and_then(Value::as_str)
            .map_or(fallback, str::to_owned),
        _ => fallback,
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
