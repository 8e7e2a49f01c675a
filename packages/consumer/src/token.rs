//! Process-wide bearer token cache.
//!
//! The token outlives a single batch: it is fetched once, reused by every
//! later invocation in the same process, and dropped only after a downstream
//! service rejected it with 401. Reads are lock-free through `ArcSwapOption`.

use std::fmt;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use tracing::debug;

use crate::error::{ErrorEnvelope, ErrorKind, Stage};
use crate::traits::{TokenProvider, TokenStore};

// ---------------------------------------------------------------------------
// AccessToken
// ---------------------------------------------------------------------------

/// Opaque bearer token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"<redacted>").finish()
    }
}

// ---------------------------------------------------------------------------
// InMemoryTokenStore
// ---------------------------------------------------------------------------

/// [`TokenStore`] backed by an atomic pointer swap.
#[derive(Default)]
pub struct InMemoryTokenStore {
    slot: ArcSwapOption<AccessToken>,
}

impl InMemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn get(&self) -> Option<AccessToken> {
        self.slot.load_full().map(|token| (*token).clone())
    }

    fn set(&self, token: AccessToken) {
        self.slot.store(Some(Arc::new(token)));
    }

    fn invalidate(&self) {
        self.slot.store(None);
    }
}

/// The store shared by every orchestrator in this process.
#[must_use]
pub fn process_token_store() -> Arc<dyn TokenStore> {
    static STORE: OnceLock<Arc<InMemoryTokenStore>> = OnceLock::new();
    STORE.get_or_init(|| Arc::new(InMemoryTokenStore::new())).clone()
}

// ---------------------------------------------------------------------------
// TokenCache
// ---------------------------------------------------------------------------

/// Whether a token came from the cache or the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Reused,
    Fetched,
}

impl TokenSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reused => "reused",
            Self::Fetched => "fetched",
        }
    }
}

/// A token handed out for one batch.
#[derive(Debug, Clone)]
pub struct TokenLease {
    pub token: AccessToken,
    pub source: TokenSource,
}

/// Get-or-fetch front for a [`TokenStore`].
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn TokenStore>,
}

impl TokenCache {
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Return the cached token, or exchange credentials for a new one and cache it.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error. An empty token is reported as a
    /// token-stage [`ErrorKind::MalformedResponse`] and is not cached.
    pub async fn get_or_fetch(
        &self,
        provider: &dyn TokenProvider,
    ) -> Result<TokenLease, ErrorEnvelope> {
        if let Some(token) = self.store.get() {
            debug!(source = TokenSource::Reused.as_str(), "using cached access token");
            return Ok(TokenLease {
                token,
                source: TokenSource::Reused,
            });
        }

        let token = provider.exchange().await?;
        if token.is_empty() {
            return Err(ErrorEnvelope::new(
                Stage::Token,
                ErrorKind::MalformedResponse("token provider returned an empty access token".into()),
            ));
        }
        self.store.set(token.clone());
        debug!(source = TokenSource::Fetched.as_str(), "fetched new access token");
        Ok(TokenLease {
            token,
            source: TokenSource::Fetched,
        })
    }

    /// Drop the cached token so the next batch fetches a fresh one.
    pub fn invalidate(&self) {
        self.store.invalidate();
    }

    #[must_use]
    pub fn cached(&self) -> Option<AccessToken> {
        self.store.get()
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("cached", &self.store.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTokenProvider;

    fn cache() -> TokenCache {
        TokenCache::new(Arc::new(InMemoryTokenStore::new()))
    }

    #[tokio::test]
    async fn fetches_once_then_reuses() {
        let cache = cache();
        let provider = FakeTokenProvider::returning("abc");

        let first = cache.get_or_fetch(&provider).await.unwrap();
        assert_eq!(first.source, TokenSource::Fetched);
        assert_eq!(first.token.as_str(), "abc");

        let second = cache.get_or_fetch(&provider).await.unwrap();
        assert_eq!(second.source, TokenSource::Reused);
        assert_eq!(second.token.as_str(), "abc");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_a_new_exchange() {
        let cache = cache();
        let provider = FakeTokenProvider::returning("abc");
        cache.get_or_fetch(&provider).await.unwrap();

        cache.invalidate();
        assert!(cache.cached().is_none());

        let lease = cache.get_or_fetch(&provider).await.unwrap();
        assert_eq!(lease.source, TokenSource::Fetched);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn empty_token_is_a_token_stage_failure() {
        let cache = cache();
        let provider = FakeTokenProvider::returning("  ");
        let err = cache.get_or_fetch(&provider).await.unwrap_err();
        assert_eq!(err.stage, Stage::Token);
        assert!(matches!(err.kind, ErrorKind::MalformedResponse(_)));
        assert!(cache.cached().is_none());
    }

    #[tokio::test]
    async fn provider_errors_propagate_without_caching() {
        let cache = cache();
        let provider = FakeTokenProvider::failing(ErrorEnvelope::new(
            Stage::Token,
            ErrorKind::Status {
                status: 401,
                body: None,
            },
        ));
        let err = cache.get_or_fetch(&provider).await.unwrap_err();
        assert_eq!(err.http_status(), Some(401));
        assert!(cache.cached().is_none());
    }

    #[test]
    fn debug_hides_token_value() {
        let rendered = format!("{:?}", AccessToken::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn process_store_is_shared() {
        let a = process_token_store();
        let b = process_token_store();
        a.set(AccessToken::new("shared"));
        assert_eq!(b.get().map(|t| t.as_str().to_string()).as_deref(), Some("shared"));
        b.invalidate();
        assert!(a.get().is_none());
    }
}
