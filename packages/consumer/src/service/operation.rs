//! Values exchanged between pipeline stages and the top-level result.

use std::fmt;

use holdrq_core::{HoldRequestRecord, OutcomeRecord};

use crate::error::ErrorEnvelope;

// ---------------------------------------------------------------------------
// Per-record stage results
// ---------------------------------------------------------------------------

/// What a per-record stage did with one record.
#[derive(Debug, Clone)]
pub enum StageStep {
    /// Pass the record on to the next stage.
    Continue(HoldRequestRecord),
    /// Keep the record and emit an outcome for it now.
    Completed(HoldRequestRecord, OutcomeRecord),
    /// Drop the record and emit this failure outcome.
    Rejected(OutcomeRecord),
}

/// Result of folding a stage over a batch.
#[derive(Debug, Clone, Default)]
pub struct StageReport {
    /// Records that continue, in input order.
    pub survivors: Vec<HoldRequestRecord>,
    /// Outcomes written to the result sink by this stage, in write order.
    pub emitted: Vec<OutcomeRecord>,
}

impl StageReport {
    /// Append another report, keeping `self` first.
    pub fn merge(&mut self, other: Self) {
        self.survivors.extend(other.survivors);
        self.emitted.extend(other.emitted);
    }
}

// ---------------------------------------------------------------------------
// Pipeline state
// ---------------------------------------------------------------------------

/// Orchestrator states. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    ValidatingConfig,
    FetchingTokenAndDecoding,
    Filtering,
    EnrichingItem,
    EnrichingPatron,
    Dispatching,
    Completed,
    FailedRetryable,
    FailedPermanent,
}

impl PipelineState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidatingConfig => "validating-config",
            Self::FetchingTokenAndDecoding => "fetching-token-and-decoding",
            Self::Filtering => "filtering",
            Self::EnrichingItem => "enriching-item",
            Self::EnrichingPatron => "enriching-patron",
            Self::Dispatching => "dispatching",
            Self::Completed => "completed",
            Self::FailedRetryable => "failed-retryable",
            Self::FailedPermanent => "failed-permanent",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::FailedRetryable | Self::FailedPermanent
        )
    }

    /// Position in the forward order. Terminal states share the last rank.
    fn rank(self) -> u8 {
        match self {
            Self::ValidatingConfig => 0,
            Self::FetchingTokenAndDecoding => 1,
            Self::Filtering => 2,
            Self::EnrichingItem => 3,
            Self::EnrichingPatron => 4,
            Self::Dispatching => 5,
            Self::Completed | Self::FailedRetryable | Self::FailedPermanent => 6,
        }
    }

    /// Whether the machine may move from `self` to `next`.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Top-level result
// ---------------------------------------------------------------------------

/// The batch was aborted. The invoker decides whether to run it again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{envelope}")]
pub struct PipelineFailure {
    pub envelope: ErrorEnvelope,
    pub retryable: bool,
    /// The cached token was dropped because a call was rejected with it.
    pub invalidate_token: bool,
}

impl PipelineFailure {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Terminal state this failure puts the pipeline in.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        if self.retryable {
            PipelineState::FailedRetryable
        } else {
            PipelineState::FailedPermanent
        }
    }
}

/// Which way a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPath {
    /// Every record was already processed.
    NothingToProcess,
    /// Every record was isolated before dispatch.
    AllIsolated,
    Dispatched,
}

/// A successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub message: String,
    pub path: CompletionPath,
    /// Records accepted by a backend.
    pub dispatched: Vec<HoldRequestRecord>,
    /// Outcomes written to the result sink during the run.
    pub outcomes_emitted: Vec<OutcomeRecord>,
}

impl Completion {
    #[must_use]
    pub fn new(path: CompletionPath, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path,
            dispatched: Vec::new(),
            outcomes_emitted: Vec::new(),
        }
    }
}
