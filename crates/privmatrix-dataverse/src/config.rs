//! Configuration for the Dataverse Web API connection.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DataverseError, DataverseResult};

/// Connection settings for one Dataverse organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataverseConfig {
    /// Organization root, e.g. `https://org.crm.dynamics.com`.
    pub resource_url: Url,
    /// Entra tenant hosting the application registration.
    pub tenant_id: String,
    /// `OAuth2` authority.
    pub authority: Url,
    /// Web API version segment.
    pub api_version: String,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Retry ceiling for throttled and transient failures.
    pub max_retries: u32,
}

impl DataverseConfig {
    /// Default Web API version.
    pub const DEFAULT_API_VERSION: &'static str = "v9.2";
    /// Default `OAuth2` authority.
    pub const DEFAULT_AUTHORITY: &'static str = "https://login.microsoftonline.com";
    /// Default HTTP timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Default retry ceiling.
    pub const DEFAULT_MAX_RETRIES: u32 = 5;

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> DataverseConfigBuilder {
        DataverseConfigBuilder::default()
    }

    /// Organization root without a trailing slash.
    #[must_use]
    pub fn resource_root(&self) -> String {
        self.resource_url.as_str().trim_end_matches('/').to_string()
    }

    /// Web API base, e.g. `https://org.crm.dynamics.com/api/data/v9.2`.
    #[must_use]
    pub fn api_base(&self) -> String {
        format!("{}/api/data/{}", self.resource_root(), self.api_version)
    }

    /// `OAuth2` token endpoint for the tenant.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority.as_str().trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// `OAuth2` scope granting Web API access.
    #[must_use]
    pub fn token_scope(&self) -> String {
        format!("{}/.default", self.resource_root())
    }
}

/// Builder for [`DataverseConfig`].
#[derive(Debug, Default)]
pub struct DataverseConfigBuilder {
    resource_url: Option<String>,
    tenant_id: Option<String>,
    authority: Option<String>,
    api_version: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

impl DataverseConfigBuilder {
    /// Sets the organization root URL. Required.
    #[must_use]
    pub fn resource_url(mut self, url: impl Into<String>) -> Self {
        self.resource_url = Some(url.into());
        self
    }

    /// Sets the tenant id. Required.
    #[must_use]
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Overrides the `OAuth2` authority.
    #[must_use]
    pub fn authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    /// Overrides the Web API version segment.
    #[must_use]
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Overrides the HTTP timeout.
    #[must_use]
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Overrides the retry ceiling.
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when a required field is missing or a URL does not
    /// parse.
    pub fn build(self) -> DataverseResult<DataverseConfig> {
        let resource_url = self
            .resource_url
            .ok_or_else(|| DataverseError::Config("resource_url is required".into()))?;
        let resource_url = Url::parse(&resource_url)?;
        let tenant_id = self
            .tenant_id
            .ok_or_else(|| DataverseError::Config("tenant_id is required".into()))?;
        if tenant_id.trim().is_empty() {
            return Err(DataverseError::Config("tenant_id must not be blank".into()));
        }
        let authority = Url::parse(
            self.authority
                .as_deref()
                .unwrap_or(DataverseConfig::DEFAULT_AUTHORITY),
        )?;

        Ok(DataverseConfig {
            resource_url,
            tenant_id,
            authority,
            api_version: self
                .api_version
                .unwrap_or_else(|| DataverseConfig::DEFAULT_API_VERSION.to_string()),
            timeout_secs: self
                .timeout_secs
                .unwrap_or(DataverseConfig::DEFAULT_TIMEOUT_SECS),
            max_retries: self
                .max_retries
                .unwrap_or(DataverseConfig::DEFAULT_MAX_RETRIES),
        })
    }
}

/// Application credentials for the client-credentials flow.
#[derive(Debug, Clone)]
pub struct DataverseCredentials {
    /// Application (client) id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: SecretString,
}
