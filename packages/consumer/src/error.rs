//! Error currency of the pipeline.
//!
//! Every collaborator failure is reported as an [`ErrorEnvelope`]: a closed
//! [`ErrorKind`] plus the [`Stage`] it happened in and the record it concerns.
//! The classifier decides what the envelope means for the batch; nothing else
//! inspects error strings.

use std::fmt;

use holdrq_core::HoldRequestId;

use crate::service::config::ConfigError;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Pipeline step an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Config,
    Token,
    Decode,
    ItemLookup,
    PatronLookup,
    OffsiteBackend,
    OnsiteBackend,
    ResultSink,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Token => "token",
            Self::Decode => "decode",
            Self::ItemLookup => "item-lookup",
            Self::PatronLookup => "patron-lookup",
            Self::OffsiteBackend => "offsite-backend",
            Self::OnsiteBackend => "onsite-backend",
            Self::ResultSink => "result-sink",
        }
    }

    /// Stages that iterate over records and may isolate a single one.
    #[must_use]
    pub fn is_per_record(self) -> bool {
        matches!(
            self,
            Self::ItemLookup | Self::PatronLookup | Self::OffsiteBackend | Self::OnsiteBackend
        )
    }

    /// Error type written to the result stream when a record is isolated here.
    #[must_use]
    pub fn isolation_error_type(self) -> &'static str {
        match self {
            Self::ItemLookup => "missing-item-data",
            Self::PatronLookup => "missing-patron-data",
            Self::OffsiteBackend => "scsb-api-error",
            Self::OnsiteBackend => "on-site-hold-request-service-error",
            Self::Config | Self::Token | Self::Decode | Self::ResultSink => {
                "hold-request-consumer-error"
            }
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Closed taxonomy of failures the pipeline can observe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("unable to decode batch with schema {schema}: {message}")]
    Decode { schema: String, message: String },
    #[error("received status {status} outside of the 2xx range")]
    Status { status: u16, body: Option<String> },
    #[error("request was made, no response received: {0}")]
    NoResponse(String),
    #[error("no response within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("lookup key {field} is missing")]
    MissingKey { field: &'static str },
    #[error("unexpected response: {0}")]
    MalformedResponse(String),
    #[error("unable to write outcome to result stream: {message}")]
    SinkWrite { status: Option<u16>, message: String },
}

impl ErrorKind {
    /// HTTP status carried by this failure, if any.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::SinkWrite { status, .. } => *status,
            Self::Configuration(_)
            | Self::Decode { .. }
            | Self::NoResponse(_)
            | Self::Timeout { .. }
            | Self::MissingKey { .. }
            | Self::MalformedResponse(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorEnvelope
// ---------------------------------------------------------------------------

/// Where an error happened, beyond the stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub hold_request_id: Option<HoldRequestId>,
    pub detail: Option<String>,
}

/// A failure tagged with its stage and record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage}: {kind}")]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub stage: Stage,
    pub context: ErrorContext,
}

impl ErrorEnvelope {
    #[must_use]
    pub fn new(stage: Stage, kind: ErrorKind) -> Self {
        Self {
            kind,
            stage,
            context: ErrorContext::default(),
        }
    }

    #[must_use]
    pub fn with_record(mut self, id: HoldRequestId) -> Self {
        self.context.hold_request_id = Some(id);
        self
    }

    /// Re-tag the envelope with the stage that observed it.
    #[must_use]
    pub fn at_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.context.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        self.kind.http_status()
    }

    /// Message written to the result stream when this failure isolates a record.
    #[must_use]
    pub fn outcome_message(&self) -> String {
        match &self.context.detail {
            Some(detail) => format!("{}; {detail}", self.kind),
            None => self.kind.to_string(),
        }
    }
}
