use std::time::Duration;

use async_trait::async_trait;
use holdrq_core::{Item, OnsiteRequest, Patron};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ErrorEnvelope, ErrorKind, Stage};
use crate::service::config::ConfigError;
use crate::token::AccessToken;
use crate::traits::{ItemLookup, OnsiteBackend, PatronLookup};

use super::transport;

/// Data API responses wrap their payload in `{"data": ...}`.
#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: Option<T>,
}

/// Item, patron and onsite hold request endpoints of the data API.
#[derive(Debug, Clone)]
pub struct DataApiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl DataApiClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Base URL with each segment appended percent-encoded.
    fn url(&self, stage: Stage, segments: &[&str]) -> Result<reqwest::Url, ErrorEnvelope> {
        let invalid = |message: String| {
            ErrorEnvelope::new(
                stage,
                ErrorKind::Configuration(ConfigError::InvalidUrl {
                    field: "nyplDataApiBaseUrl",
                    message,
                }),
            )
        };
        let mut url = reqwest::Url::parse(self.base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        stage: Stage,
        segments: &[&str],
        token: &AccessToken,
    ) -> Result<T, ErrorEnvelope> {
        let url = self.url(stage, segments)?;
        let request = transport::authorized(self.client.get(url.clone()), token)?;
        let response = transport::send(stage, request, self.timeout).await?;
        let envelope: DataEnvelope<T> = transport::read_json(stage, response, self.timeout).await?;
        envelope.data.ok_or_else(|| {
            ErrorEnvelope::new(
                stage,
                ErrorKind::MalformedResponse(format!("response to {} carries no data", url.path())),
            )
        })
    }
}

#[async_trait]
impl ItemLookup for DataApiClient {
    async fn fetch_item(
        &self,
        source: &str,
        item_id: &str,
        token: &AccessToken,
    ) -> Result<Item, ErrorEnvelope> {
        self.get_data(Stage::ItemLookup, &["items", source, item_id], token)
            .await
    }
}

#[async_trait]
impl PatronLookup for DataApiClient {
    async fn fetch_patron(
        &self,
        patron_id: &str,
        token: &AccessToken,
    ) -> Result<Patron, ErrorEnvelope> {
        self.get_data(Stage::PatronLookup, &["patrons", patron_id], token)
            .await
    }
}

#[async_trait]
impl OnsiteBackend for DataApiClient {
    async fn submit(
        &self,
        request: &OnsiteRequest,
        token: &AccessToken,
    ) -> Result<u16, ErrorEnvelope> {
        let url = self.url(Stage::OnsiteBackend, &["on-site-hold-requests"])?;
        let builder = transport::authorized(self.client.post(url).json(request), token)?;
        let response = transport::send(Stage::OnsiteBackend, builder, self.timeout).await?;
        Ok(response.status().as_u16())
    }
}
