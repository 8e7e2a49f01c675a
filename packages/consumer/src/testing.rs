//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use holdrq_core::{
    Item, OffsiteRequest, OffsiteResponse, OnsiteRequest, OutcomeRecord, Patron,
};
use parking_lot::Mutex;

use crate::error::{ErrorEnvelope, ErrorKind, Stage};
use crate::token::AccessToken;
use crate::traits::{
    ItemLookup, OffsiteBackend, OnsiteBackend, PatronLookup, ResultSink, TokenProvider,
};

fn not_found(stage: Stage) -> ErrorEnvelope {
    ErrorEnvelope::new(
        stage,
        ErrorKind::Status {
            status: 404,
            body: None,
        },
    )
}

// ---------------------------------------------------------------------------
// Token provider
// ---------------------------------------------------------------------------

pub struct FakeTokenProvider {
    result: Result<AccessToken, ErrorEnvelope>,
    calls: AtomicUsize,
}

impl FakeTokenProvider {
    pub fn returning(token: &str) -> Self {
        Self {
            result: Ok(AccessToken::new(token)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(envelope: ErrorEnvelope) -> Self {
        Self {
            result: Err(envelope),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for FakeTokenProvider {
    async fn exchange(&self) -> Result<AccessToken, ErrorEnvelope> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

// ---------------------------------------------------------------------------
// Result sink
// ---------------------------------------------------------------------------

/// Records every accepted outcome; optionally fails every write.
#[derive(Default)]
pub struct RecordingSink {
    outcomes: Mutex<Vec<OutcomeRecord>>,
    failure: Option<ErrorKind>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_with(kind: ErrorKind) -> Self {
        Self {
            outcomes: Mutex::new(Vec::new()),
            failure: Some(kind),
        }
    }

    pub fn outcomes(&self) -> Vec<OutcomeRecord> {
        self.outcomes.lock().clone()
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn write(
        &self,
        outcome: &OutcomeRecord,
        _token: &AccessToken,
    ) -> Result<(), ErrorEnvelope> {
        if let Some(kind) = &self.failure {
            return Err(ErrorEnvelope::new(Stage::ResultSink, kind.clone()));
        }
        self.outcomes.lock().push(outcome.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Item service answering 404 for anything not registered.
#[derive(Default)]
pub struct FakeItemLookup {
    items: HashMap<(String, String), Item>,
    failure: Option<ErrorKind>,
    requests: Mutex<Vec<(String, String)>>,
}

impl FakeItemLookup {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_item(mut self, source: &str, id: &str, item: Item) -> Self {
        self.items.insert((source.to_string(), id.to_string()), item);
        self
    }

    pub fn failing_with(kind: ErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ItemLookup for FakeItemLookup {
    async fn fetch_item(
        &self,
        source: &str,
        item_id: &str,
        _token: &AccessToken,
    ) -> Result<Item, ErrorEnvelope> {
        let key = (source.to_string(), item_id.to_string());
        self.requests.lock().push(key.clone());
        if let Some(kind) = &self.failure {
            return Err(ErrorEnvelope::new(Stage::ItemLookup, kind.clone()));
        }
        self.items
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found(Stage::ItemLookup))
    }
}

/// Patron service answering 404 for anything not registered.
#[derive(Default)]
pub struct FakePatronLookup {
    patrons: HashMap<String, Patron>,
    failure: Option<ErrorKind>,
    requests: Mutex<Vec<String>>,
}

impl FakePatronLookup {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_patron(mut self, id: &str, patron: Patron) -> Self {
        self.patrons.insert(id.to_string(), patron);
        self
    }

    pub fn failing_with(kind: ErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl PatronLookup for FakePatronLookup {
    async fn fetch_patron(
        &self,
        patron_id: &str,
        _token: &AccessToken,
    ) -> Result<Patron, ErrorEnvelope> {
        self.requests.lock().push(patron_id.to_string());
        if let Some(kind) = &self.failure {
            return Err(ErrorEnvelope::new(Stage::PatronLookup, kind.clone()));
        }
        self.patrons
            .get(patron_id)
            .cloned()
            .ok_or_else(|| not_found(Stage::PatronLookup))
    }
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

pub struct FakeOffsiteBackend {
    result: Result<OffsiteResponse, ErrorKind>,
    requests: Mutex<Vec<OffsiteRequest>>,
}

impl FakeOffsiteBackend {
    pub fn responding(response: OffsiteResponse) -> Self {
        Self {
            result: Ok(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting_with_type(request_type: &str) -> Self {
        Self::responding(OffsiteResponse {
            success: true,
            request_type: Some(request_type.to_string()),
            ..OffsiteResponse::default()
        })
    }

    pub fn failing(kind: ErrorKind) -> Self {
        Self {
            result: Err(kind),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<OffsiteRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl OffsiteBackend for FakeOffsiteBackend {
    async fn submit(&self, request: &OffsiteRequest) -> Result<OffsiteResponse, ErrorEnvelope> {
        self.requests.lock().push(request.clone());
        self.result
            .clone()
            .map_err(|kind| ErrorEnvelope::new(Stage::OffsiteBackend, kind))
    }
}

pub struct FakeOnsiteBackend {
    result: Result<u16, ErrorKind>,
    requests: Mutex<Vec<OnsiteRequest>>,
}

impl FakeOnsiteBackend {
    /// Accepts every request with 201.
    pub fn accepting() -> Self {
        Self {
            result: Ok(201),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(kind: ErrorKind) -> Self {
        Self {
            result: Err(kind),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<OnsiteRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl OnsiteBackend for FakeOnsiteBackend {
    async fn submit(
        &self,
        request: &OnsiteRequest,
        _token: &AccessToken,
    ) -> Result<u16, ErrorEnvelope> {
        self.requests.lock().push(request.clone());
        self.result
            .clone()
            .map_err(|kind| ErrorEnvelope::new(Stage::OnsiteBackend, kind))
    }
}
