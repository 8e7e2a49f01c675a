//! Error classification: maps an [`ErrorEnvelope`] to what the batch should do.

use crate::error::{ErrorEnvelope, ErrorKind, Stage};

use super::operation::PipelineFailure;

/// What a failure means for the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Abort; the invoker should run the whole batch again.
    RetryBatch,
    /// Abort; running the batch again will not help.
    PermanentFailure,
    /// Report this record as failed and continue with the rest.
    IsolateRecord,
}

impl Disposition {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RetryBatch => "retry-batch",
            Self::PermanentFailure => "permanent-failure",
            Self::IsolateRecord => "isolate-record",
        }
    }
}

/// Which HTTP statuses isolate a record, re-authenticate, or fail permanently.
///
/// Any status not listed fails the batch as retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailurePolicy {
    pub isolate_statuses: Vec<u16>,
    pub reauth_statuses: Vec<u16>,
    pub permanent_statuses: Vec<u16>,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            isolate_statuses: vec![400, 404],
            reauth_statuses: vec![401],
            permanent_statuses: vec![403],
        }
    }
}

/// Result of classifying one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub disposition: Disposition,
    /// The cached token was rejected and must be dropped.
    pub invalidate_token: bool,
}

// ---------------------------------------------------------------------------
// ErrorClassifier
// ---------------------------------------------------------------------------

/// Applies a [`FailurePolicy`] to pipeline failures.
#[derive(Debug, Clone, Default)]
pub struct ErrorClassifier {
    policy: FailurePolicy,
}

impl ErrorClassifier {
    #[must_use]
    pub fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }

    /// Classify a failure.
    ///
    /// Result stream failures always retry the batch: once an outcome cannot
    /// be written, per-record correlation is lost. Only per-record stages can
    /// isolate; a would-be isolation anywhere else fails permanently.
    #[must_use]
    pub fn classify(&self, envelope: &ErrorEnvelope) -> Classification {
        let invalidate_token = envelope
            .http_status()
            .is_some_and(|status| self.policy.reauth_statuses.contains(&status));

        let disposition = if envelope.stage == Stage::ResultSink {
            Disposition::RetryBatch
        } else {
            match &envelope.kind {
                ErrorKind::Configuration(_) | ErrorKind::Decode { .. } => {
                    Disposition::PermanentFailure
                }
                ErrorKind::SinkWrite { .. }
                | ErrorKind::NoResponse(_)
                | ErrorKind::Timeout { .. }
                | ErrorKind::MalformedResponse(_) => Disposition::RetryBatch,
                ErrorKind::MissingKey { .. } => Self::isolate_in(envelope.stage),
                ErrorKind::Status { status, .. } => self.for_status(*status, envelope.stage),
            }
        };

        Classification {
            disposition,
            invalidate_token,
        }
    }

    /// Classify a failure that aborts the batch.
    ///
    /// An isolating disposition cannot abort a batch; callers only pass
    /// failures they have already decided not to isolate, and any such
    /// envelope is treated as retryable.
    #[must_use]
    pub fn batch_failure(&self, envelope: ErrorEnvelope) -> PipelineFailure {
        let classification = self.classify(&envelope);
        PipelineFailure {
            retryable: classification.disposition != Disposition::PermanentFailure,
            invalidate_token: classification.invalidate_token,
            envelope,
        }
    }

    fn for_status(&self, status: u16, stage: Stage) -> Disposition {
        if self.policy.reauth_statuses.contains(&status) {
            Disposition::RetryBatch
        } else if self.policy.permanent_statuses.contains(&status) {
            Disposition::PermanentFailure
        } else if self.policy.isolate_statuses.contains(&status) {
            Self::isolate_in(stage)
        } else {
            Disposition::RetryBatch
        }
    }

    fn isolate_in(stage: Stage) -> Disposition {
        if stage.is_per_record() {
            Disposition::IsolateRecord
        } else {
            Disposition::PermanentFailure
        }
    }
}
