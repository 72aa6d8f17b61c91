//! Dataverse Web API HTTP client with pagination and retry handling.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

use crate::auth::TokenCache;
use crate::config::DataverseConfig;
use crate::error::{DataverseError, DataverseResult};

/// `OData` error response from the Web API.
#[derive(Debug, Deserialize)]
pub struct ODataError {
    pub error: ODataErrorBody,
}

/// `OData` error body.
#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    pub code: String,
    pub message: String,
}

/// Response wrapper for paginated Web API responses.
#[derive(Debug, Deserialize)]
pub struct ODataPage<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Dataverse Web API client.
#[derive(Debug)]
pub struct WebApiClient {
    http_client: reqwest::Client,
    token_cache: Arc<TokenCache>,
    api_base: String,
    max_retries: u32,
}

impl WebApiClient {
    /// Creates a new Web API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &DataverseConfig, token_cache: Arc<TokenCache>) -> DataverseResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DataverseError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            token_cache,
            api_base: config.api_base(),
            max_retries: config.max_retries,
        })
    }

    /// Base URL for Web API requests.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Performs a GET request with token injection and retry handling.
    ///
    /// `max_page_size` sets the `odata.maxpagesize` preference for cursor
    /// queries.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        max_page_size: Option<u32>,
    ) -> DataverseResult<T> {
        let mut retries = 0;
        let mut rate_limit_attempts = 0u32;
        let mut delay = Duration::from_secs(1);

        loop {
            let token = self.token_cache.get_token().await?;

            let mut request = self
                .http_client
                .get(url)
                .bearer_auth(&token)
                .header("OData-MaxVersion", "4.0")
                .header("OData-Version", "4.0")
                .header("Accept", "application/json");

            if let Some(size) = max_page_size {
                request = request.header("Prefer", format!("odata.maxpagesize={size}"));
            }

            let response = request.send().await?;
            let status = response.status();

            // Throttling (429): honour Retry-After up to the retry ceiling.
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if rate_limit_attempts >= self.max_retries {
                    return Err(DataverseError::MaxRetriesExceeded {
                        attempts: rate_limit_attempts,
                    });
                }
                let wait = retry_after(&response).unwrap_or(delay);
                warn!(attempt = rate_limit_attempts, ?wait, "throttled, backing off");
                tokio::time::sleep(wait).await;
                rate_limit_attempts += 1;
                continue;
            }

            // Transient errors (502, 503, 504).
            if is_transient(status) && retries < self.max_retries {
                retries += 1;
                warn!(
                    %status,
                    retry = retries,
                    max = self.max_retries,
                    ?delay,
                    "transient error, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                continue;
            }

            if status.is_success() {
                return response.json().await.map_err(DataverseError::from);
            }

            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, body));
        }
    }

    /// Submits a prebuilt multipart `$batch` payload.
    ///
    /// With `continue_on_error`, a failing part must not abort its siblings;
    /// the preference is forwarded to the service. Only the overall call
    /// status is surfaced.
    #[instrument(skip(self, body))]
    pub async fn post_batch(
        &self,
        url: &str,
        boundary: &str,
        body: String,
        continue_on_error: bool,
    ) -> DataverseResult<()> {
        let mut retries = 0;
        let mut rate_limit_attempts = 0u32;
        let mut delay = Duration::from_secs(1);

        loop {
            let token = self.token_cache.get_token().await?;

            let mut request = self
                .http_client
                .post(url)
                .bearer_auth(&token)
                .header("OData-MaxVersion", "4.0")
                .header("OData-Version", "4.0")
                .header("Accept", "application/json")
                .header(
                    "Content-Type",
                    format!("multipart/mixed;boundary={boundary}"),
                )
                .body(body.clone());

            if continue_on_error {
                request = request.header("Prefer", "odata.continue-on-error");
            }

            let response = request.send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if rate_limit_attempts >= self.max_retries {
                    return Err(DataverseError::MaxRetriesExceeded {
                        attempts: rate_limit_attempts,
                    });
                }
                let wait = retry_after(&response).unwrap_or(delay);
                warn!(attempt = rate_limit_attempts, ?wait, "throttled, backing off");
                tokio::time::sleep(wait).await;
                rate_limit_attempts += 1;
                continue;
            }

            if is_transient(status) && retries < self.max_retries {
                retries += 1;
                warn!(
                    %status,
                    retry = retries,
                    max = self.max_retries,
                    ?delay,
                    "transient error, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                continue;
            }

            if status.is_success() {
                return Ok(());
            }

            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, body));
        }
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("Retry-After")?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn is_transient(status: reqwest::StatusCode) -> bool {
    matches!(
        status,
        reqwest::StatusCode::BAD_GATEWAY
            | reqwest::StatusCode::SERVICE_UNAVAILABLE
            | reqwest::StatusCode::GATEWAY_TIMEOUT
    )
}

fn api_error(status: reqwest::StatusCode, body: String) -> DataverseError {
    if let Ok(odata) = serde_json::from_str::<ODataError>(&body) {
        DataverseError::Api {
            code: odata.error.code,
            message: odata.error.message,
        }
    } else {
        DataverseError::Api {
            code: status.to_string(),
            message: body,
        }
    }
}
