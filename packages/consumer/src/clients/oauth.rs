use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ErrorEnvelope, ErrorKind, Stage};
use crate::token::AccessToken;
use crate::traits::TokenProvider;

use super::transport;

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Client-credentials exchange against the OAuth provider.
pub struct OAuthTokenProvider {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    timeout: Duration,
}

impl OAuthTokenProvider {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.into(),
            timeout,
        }
    }
}

impl fmt::Debug for OAuthTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokenProvider")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for OAuthTokenProvider {
    async fn exchange(&self) -> Result<AccessToken, ErrorEnvelope> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];
        let request = self.client.post(&self.token_url).form(&form);
        let response = transport::send(Stage::Token, request, self.timeout).await?;
        let body: TokenResponse = transport::read_json(Stage::Token, response, self.timeout).await?;

        body.access_token
            .filter(|t| !t.trim().is_empty())
            .map(AccessToken::new)
            .ok_or_else(|| {
                ErrorEnvelope::new(
                    Stage::Token,
                    ErrorKind::MalformedResponse(
                        "missing access_token value from OAuth service".into(),
                    ),
                )
            })
    }
}
