//! Lambda Cloud API client implementation.
//!
//! This module provides the HTTP client for the Lambda Cloud REST API. Every
//! call is retried with exponential backoff and every failure is normalized
//! into [`ProviderError`].

use async_trait::async_trait;
use reqwest::{header, Client, Method, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::error::{ProviderError, ProviderResult};

use super::api::LambdaApi;
use super::types::{
    ApiResponse, FileSystem, Instance, InstanceType, InstanceTypeEntry, LaunchRecord,
    LaunchRequest, SshKeyRecord,
};

/// Lambda Cloud API base URL.
const LAMBDA_API_URL: &str = "https://cloud.lambda.ai/api/v1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts per logical call.
const MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry.
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Growth factor of the delay between consecutive retries.
const BACKOFF_MULTIPLIER: u32 = 2;

/// Retry schedule for API calls.
///
/// Every failure is retried the same way; there is no retryable/fatal split.
/// The delay before attempt `n` (n >= 2) is `base_delay * multiplier^(n-2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    multiplier: u32,
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least one.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            base_delay,
            multiplier,
        }
    }

    /// A single attempt, no retry.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, 1)
    }

    /// Total attempts per logical call.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait before the given 1-based attempt.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        self.base_delay
            .saturating_mul(self.multiplier.saturating_pow(attempt - 2))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, BASE_DELAY, BACKOFF_MULTIPLIER)
    }
}

/// Lambda Cloud API client.
///
/// Cheap to clone and safe to share between tasks; it holds no state beyond
/// the HTTP transport.
#[derive(Clone)]
pub struct LambdaClient {
    /// HTTP client.
    client: Client,
    /// API key. Never logged.
    api_key: String,
    /// API base URL without trailing slash.
    base_url: String,
    /// Retry schedule.
    retry: RetryPolicy,
}

impl std::fmt::Debug for LambdaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LambdaClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl LambdaClient {
    /// Creates a new Lambda API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: &str) -> ProviderResult<Self> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(api_key: &str, timeout_secs: u64) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: LAMBDA_API_URL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Points the client at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Replaces the retry schedule.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The active retry schedule.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Performs an authenticated request, retrying on any failure.
    ///
    /// Returns the response of the first attempt that came back 2xx.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::RequestFailed`] once every attempt has failed,
    /// carrying the cause of the last one.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> ProviderResult<Response> {
        self.request_with(self.retry, method, path, body).await
    }

    async fn request_with(
        &self,
        policy: RetryPolicy,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> ProviderResult<Response> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut last_error = String::new();

        for attempt in 1..=policy.max_attempts() {
            if attempt > 1 {
                let delay = policy.delay_before(attempt);
                warn!(
                    "{method} {path} failed, retrying in {delay:?} (attempt {attempt} of {}): {last_error}",
                    policy.max_attempts()
                );
                tokio::time::sleep(delay).await;
            }

            match self.send_once(method.clone(), &url, body).await {
                Ok(response) => return Ok(response),
                Err(message) => {
                    debug!("{method} {path} attempt {attempt} failed: {message}");
                    last_error = message;
                }
            }
        }

        Err(ProviderError::request_failed(policy.max_attempts(), last_error))
    }

    /// Sends one request. Non-2xx responses become errors.
    async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, String> {
        trace!("Sending {method} {url}");

        let mut builder = self
            .client
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key));

        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| format!("Request failed: {e}"))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(format!("{status}: {}", text.trim()))
    }

    /// Decodes the `data` field of a response envelope.
    async fn decode<T>(response: Response) -> ProviderResult<T>
    where
        T: DeserializeOwned,
    {
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(format!("Failed to parse response: {e}")))?;
        Ok(envelope.data)
    }

    async fn get<T>(&self, policy: RetryPolicy, path: &str) -> ProviderResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.request_with(policy, Method::GET, path, None).await?;
        Self::decode(response).await
    }

    async fn find_instance(
        &self,
        policy: RetryPolicy,
        instance_id: &str,
    ) -> ProviderResult<Option<Instance>> {
        let instances: Vec<Instance> = self.get(policy, "instances").await?;
        Ok(instances.into_iter().find(|i| i.id == instance_id))
    }

    /// Gets one instance type by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn get_instance_type(&self, name: &str) -> ProviderResult<Option<InstanceType>> {
        let types = self.list_instance_types().await?;
        Ok(types.into_iter().find(|t| t.name == name))
    }
}

#[async_trait]
impl LambdaApi for LambdaClient {
    async fn list_instances(&self) -> ProviderResult<Vec<Instance>> {
        let instances: Vec<Instance> = self.get(self.retry, "instances").await?;
        debug!("Found {} instances", instances.len());
        Ok(instances)
    }

    async fn get_instance(&self, instance_id: &str) -> ProviderResult<Option<Instance>> {
        self.find_instance(self.retry, instance_id).await
    }

    async fn get_instance_once(&self, instance_id: &str) -> ProviderResult<Option<Instance>> {
        self.find_instance(RetryPolicy::no_retry(), instance_id).await
    }

    async fn launch_instance(&self, request: &LaunchRequest) -> ProviderResult<String> {
        debug!(
            "Launching {} in {} with {} SSH key(s)",
            request.instance_type,
            request.region,
            request.ssh_key_names.len()
        );

        let body = serde_json::json!(request);
        let response = self
            .request(Method::POST, "instance-operations/launch", Some(&body))
            .await?;
        let launched: LaunchRecord = Self::decode(response).await?;

        launched
            .instance_ids
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyLaunch)
    }

    async fn terminate_instance(&self, instance_id: &str) -> ProviderResult<()> {
        debug!("Terminating instance {instance_id}");

        let body = serde_json::json!({ "instance_ids": [instance_id] });
        self.request(Method::POST, "instance-operations/terminate", Some(&body))
            .await?;
        Ok(())
    }

    async fn list_ssh_key_names(&self) -> ProviderResult<Vec<String>> {
        let keys: Vec<SshKeyRecord> = self.get(self.retry, "ssh-keys").await?;
        Ok(keys.into_iter().map(|k| k.name).collect())
    }

    async fn list_instance_types(&self) -> ProviderResult<Vec<InstanceType>> {
        // Keeps the provider's catalog order.
        let entries: serde_json::Map<String, serde_json::Value> =
            self.get(self.retry, "instance-types").await?;

        entries
            .into_iter()
            .map(|(name, value)| {
                serde_json::from_value::<InstanceTypeEntry>(value)
                    .map(|entry| entry.into_instance_type(name))
                    .map_err(|e| {
                        ProviderError::invalid_response(format!("Invalid instance type: {e}"))
                    })
            })
            .collect()
    }

    async fn list_file_systems(&self) -> ProviderResult<Vec<FileSystem>> {
        self.get(self.retry, "file-systems").await
    }
}
