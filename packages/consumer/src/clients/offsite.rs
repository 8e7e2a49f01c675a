use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use holdrq_core::{OffsiteRequest, OffsiteResponse};

use crate::error::{ErrorEnvelope, ErrorKind, Stage};
use crate::service::config::ConfigError;
use crate::traits::OffsiteBackend;

use super::transport;

const REQUEST_ITEM_PATH: &str = "requestItem/requestItem";

/// Offsite storage backend client. Authenticates with an `api_key` header.
pub struct ScsbClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl ScsbClient {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout,
        }
    }
}

impl fmt::Debug for ScsbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScsbClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OffsiteBackend for ScsbClient {
    async fn submit(&self, request: &OffsiteRequest) -> Result<OffsiteResponse, ErrorEnvelope> {
        let mut api_key = http::HeaderValue::from_str(&self.api_key).map_err(|_| {
            ErrorEnvelope::new(
                Stage::OffsiteBackend,
                ErrorKind::Configuration(ConfigError::InvalidHeader {
                    field: "scsbApiKey",
                }),
            )
        })?;
        api_key.set_sensitive(true);

        let builder = self
            .client
            .post(transport::join_url(&self.base_url, REQUEST_ITEM_PATH))
            .header("api_key", api_key)
            .json(request);
        let response = transport::send(Stage::OffsiteBackend, builder, self.timeout).await?;
        transport::read_json(Stage::OffsiteBackend, response, self.timeout).await
    }
}
