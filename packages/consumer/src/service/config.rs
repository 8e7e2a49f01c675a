use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::classify::FailurePolicy;

/// Default deadline for every outbound call.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;

/// Consumer configuration.
///
/// Every field can be supplied as a command-line flag or an environment
/// variable. String fields default to empty so that a missing value surfaces
/// through [`ConsumerConfig::validate`] as a configuration error instead of a
/// parse failure.
#[derive(Clone, clap::Args)]
pub struct ConsumerConfig {
    /// Schema name of the incoming hold request records.
    #[arg(long, env = "HOLD_REQUEST_SCHEMA_NAME", default_value = "")]
    pub schema_name: String,
    /// Stream receiving one outcome per processed record.
    #[arg(long, env = "HOLD_REQUEST_RESULT_STREAM_NAME", default_value = "")]
    pub result_stream_name: String,
    /// Schema name of the outcome records.
    #[arg(long, env = "HOLD_REQUEST_RESULT_SCHEMA_NAME", default_value = "")]
    pub result_schema_name: String,
    /// Base URL of the data API (items, patrons, onsite requests, streams).
    #[arg(long, env = "NYPL_DATA_API_BASE_URL", default_value = "")]
    pub nypl_data_api_base_url: String,
    /// Base URL of the offsite storage backend.
    #[arg(long, env = "SCSB_API_BASE_URL", default_value = "")]
    pub scsb_api_base_url: String,
    #[arg(long, env = "SCSB_API_KEY", default_value = "")]
    pub scsb_api_key: String,
    #[arg(long = "oauth-provider-url", env = "NYPL_OAUTH_URL", default_value = "")]
    pub oauth_provider_url: String,
    #[arg(long = "oauth-client-id", env = "NYPL_OAUTH_CLIENT_ID", default_value = "")]
    pub oauth_client_id: String,
    #[arg(long = "oauth-client-secret", env = "NYPL_OAUTH_CLIENT_SECRET", default_value = "")]
    pub oauth_client_secret: String,
    #[arg(long = "oauth-provider-scope", env = "NYPL_OAUTH_SCOPE", default_value = "")]
    pub oauth_provider_scope: String,
    /// Deadline for each outbound call in milliseconds.
    #[arg(long, env = "CALL_TIMEOUT_MS", default_value_t = DEFAULT_CALL_TIMEOUT_MS)]
    pub call_timeout_ms: u64,
    /// Optional JSON file extending the built-in pickup → delivery location table.
    #[arg(long, env = "DELIVERY_LOCATIONS_PATH")]
    pub delivery_locations: Option<PathBuf>,
    /// Statuses that isolate a single record instead of failing the batch.
    #[arg(long, env = "ISOLATE_STATUSES", value_delimiter = ',', default_values_t = [400_u16, 404])]
    pub isolate_statuses: Vec<u16>,
    /// Statuses that invalidate the cached token and retry the batch.
    #[arg(long, env = "REAUTH_STATUSES", value_delimiter = ',', default_values_t = [401_u16])]
    pub reauth_statuses: Vec<u16>,
    /// Statuses that fail the batch without retry.
    #[arg(long, env = "PERMANENT_STATUSES", value_delimiter = ',', default_values_t = [403_u16])]
    pub permanent_statuses: Vec<u16>,
}

/// Invalid consumer configuration. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing {field} configuration parameter")]
    Missing { field: &'static str },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("{field} is not a valid absolute URL: {message}")]
    InvalidUrl {
        field: &'static str,
        message: String,
    },
    #[error("{field} is not a valid header value")]
    InvalidHeader { field: &'static str },
}

impl ConsumerConfig {
    /// Check that every required parameter is present and non-empty.
    ///
    /// Parameters are checked in a fixed order and the first missing one is
    /// reported.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first missing parameter,
    /// [`ConfigError::InvalidUrl`] for a base URL that does not parse,
    /// [`ConfigError::InvalidHeader`] for an API key that cannot be sent as a
    /// header, or [`ConfigError::Zero`] for a zero call timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("schemaName", &self.schema_name),
            ("resultStreamName", &self.result_stream_name),
            ("resultSchemaName", &self.result_schema_name),
            ("nyplDataApiBaseUrl", &self.nypl_data_api_base_url),
            ("scsbApiBaseUrl", &self.scsb_api_base_url),
            ("scsbApiKey", &self.scsb_api_key),
            ("oAuthProviderUrl", &self.oauth_provider_url),
            ("oAuthClientId", &self.oauth_client_id),
            ("oAuthClientSecret", &self.oauth_client_secret),
            ("oAuthProviderScope", &self.oauth_provider_scope),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ConfigError::Missing { field: *field });
        }

        let urls = [
            ("nyplDataApiBaseUrl", &self.nypl_data_api_base_url),
            ("scsbApiBaseUrl", &self.scsb_api_base_url),
            ("oAuthProviderUrl", &self.oauth_provider_url),
        ];
        for (field, value) in urls {
            reqwest::Url::parse(value.trim()).map_err(|e| ConfigError::InvalidUrl {
                field,
                message: e.to_string(),
            })?;
        }
        if http::HeaderValue::from_str(&self.scsb_api_key).is_err() {
            return Err(ConfigError::InvalidHeader {
                field: "scsbApiKey",
            });
        }

        if self.call_timeout_ms == 0 {
            return Err(ConfigError::Zero {
                field: "callTimeoutMs",
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Status-to-disposition policy built from the configured status lists.
    #[must_use]
    pub fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy {
            isolate_statuses: self.isolate_statuses.clone(),
            reauth_statuses: self.reauth_statuses.clone(),
            permanent_statuses: self.permanent_statuses.clone(),
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        let policy = FailurePolicy::default();
        Self {
            schema_name: String::new(),
            result_stream_name: String::new(),
            result_schema_name: String::new(),
            nypl_data_api_base_url: String::new(),
            scsb_api_base_url: String::new(),
            scsb_api_key: String::new(),
            oauth_provider_url: String::new(),
            oauth_client_id: String::new(),
            oauth_client_secret: String::new(),
            oauth_provider_scope: String::new(),
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            delivery_locations: None,
            isolate_statuses: policy.isolate_statuses,
            reauth_statuses: policy.reauth_statuses,
            permanent_statuses: policy.permanent_statuses,
        }
    }
}

impl fmt::Debug for ConsumerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &str) -> &'static str {
            if value.is_empty() {
                ""
            } else {
                "<redacted>"
            }
        }

        f.debug_struct("ConsumerConfig")
            .field("schema_name", &self.schema_name)
            .field("result_stream_name", &self.result_stream_name)
            .field("result_schema_name", &self.result_schema_name)
            .field("nypl_data_api_base_url", &self.nypl_data_api_base_url)
            .field("scsb_api_base_url", &self.scsb_api_base_url)
            .field("scsb_api_key", &redact(&self.scsb_api_key))
            .field("oauth_provider_url", &self.oauth_provider_url)
            .field("oauth_client_id", &self.oauth_client_id)
            .field("oauth_client_secret", &redact(&self.oauth_client_secret))
            .field("oauth_provider_scope", &self.oauth_provider_scope)
            .field("call_timeout_ms", &self.call_timeout_ms)
            .field("delivery_locations", &self.delivery_locations)
            .field("isolate_statuses", &self.isolate_statuses)
            .field("reauth_statuses", &self.reauth_statuses)
            .field("permanent_statuses", &self.permanent_statuses)
            .finish()
    }
}
