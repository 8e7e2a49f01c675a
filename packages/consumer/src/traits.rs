use async_trait::async_trait;
use holdrq_core::messages::StreamPayload;
use holdrq_core::{
    HoldRequestRecord, Item, OffsiteRequest, OffsiteResponse, OnsiteRequest, OutcomeRecord, Patron,
};

use crate::error::ErrorEnvelope;
use crate::token::AccessToken;

/// Exchanges client credentials for a bearer token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn exchange(&self) -> Result<AccessToken, ErrorEnvelope>;
}

/// Storage slot for the process-wide bearer token.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<AccessToken>;

    fn set(&self, token: AccessToken);

    /// Drop the stored token. Only called after a call was rejected with 401.
    fn invalidate(&self);
}

/// Turns a delivered batch into hold request records, in delivery order.
#[async_trait]
pub trait StreamDecoder: Send + Sync {
    async fn decode(
        &self,
        schema: &str,
        payloads: &[StreamPayload],
    ) -> Result<Vec<HoldRequestRecord>, ErrorEnvelope>;
}

/// Item service.
#[async_trait]
pub trait ItemLookup: Send + Sync {
    async fn fetch_item(
        &self,
        source: &str,
        item_id: &str,
        token: &AccessToken,
    ) -> Result<Item, ErrorEnvelope>;
}

/// Patron service.
#[async_trait]
pub trait PatronLookup: Send + Sync {
    async fn fetch_patron(
        &self,
        patron_id: &str,
        token: &AccessToken,
    ) -> Result<Patron, ErrorEnvelope>;
}

/// Offsite consortium storage backend. Authenticates with its own API key.
#[async_trait]
pub trait OffsiteBackend: Send + Sync {
    async fn submit(&self, request: &OffsiteRequest) -> Result<OffsiteResponse, ErrorEnvelope>;
}

/// Onsite fulfillment service. Returns the HTTP status of an accepted request.
#[async_trait]
pub trait OnsiteBackend: Send + Sync {
    async fn submit(
        &self,
        request: &OnsiteRequest,
        token: &AccessToken,
    ) -> Result<u16, ErrorEnvelope>;
}

/// Downstream result stream. One write per terminally processed record.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn write(&self, outcome: &OutcomeRecord, token: &AccessToken)
        -> Result<(), ErrorEnvelope>;
}
