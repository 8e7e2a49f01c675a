//! The sequential per-record routine shared by the enrichment and backend stages.
//!
//! A stage is folded over the batch one record at a time. A record-level
//! failure the classifier allows to isolate becomes a failure outcome and the
//! fold continues; anything else aborts the fold. Every outcome is written to
//! the result sink before the next record starts, and a failed write aborts the
//! fold as retryable no matter what caused the outcome.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use holdrq_core::{HoldRequestRecord, OutcomeRecord};
use tracing::{debug, warn};

use crate::error::{ErrorEnvelope, ErrorKind, Stage};
use crate::observability;
use crate::token::AccessToken;
use crate::traits::ResultSink;

use super::classify::{Disposition, ErrorClassifier};
use super::deadline::with_deadline;
use super::operation::{PipelineFailure, StageReport, StageStep};

/// One step of the per-record pipeline.
#[async_trait]
pub trait RecordStage: Send + Sync {
    /// Stage reported on errors and in isolation outcomes.
    fn stage(&self) -> Stage;

    /// Process one record. Makes at most one outbound call.
    async fn apply(
        &self,
        record: HoldRequestRecord,
        token: &AccessToken,
    ) -> Result<StageStep, ErrorEnvelope>;
}

// ---------------------------------------------------------------------------
// StageRunner
// ---------------------------------------------------------------------------

/// Folds a [`RecordStage`] over a batch.
#[derive(Clone)]
pub struct StageRunner {
    sink: Arc<dyn ResultSink>,
    classifier: ErrorClassifier,
    call_timeout: Duration,
}

impl StageRunner {
    #[must_use]
    pub fn new(sink: Arc<dyn ResultSink>, classifier: ErrorClassifier, call_timeout: Duration) -> Self {
        Self {
            sink,
            classifier,
            call_timeout,
        }
    }

    /// Run `stage` over `records` in order.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineFailure`] for the first failure that cannot be
    /// isolated, or for the first outcome the sink fails to accept. Outcomes
    /// written before the failure stay written.
    pub async fn run(
        &self,
        stage: &dyn RecordStage,
        records: Vec<HoldRequestRecord>,
        token: &AccessToken,
    ) -> Result<StageReport, PipelineFailure> {
        let stage_id = stage.stage();
        let mut report = StageReport::default();

        for record in records {
            let id = record.id;
            let job_id = record.job_id.clone();

            let step = match with_deadline(stage_id, self.call_timeout, stage.apply(record, token))
                .await
            {
                Ok(step) => step,
                Err(envelope) => {
                    let envelope = envelope.at_stage(stage_id).with_record(id);
                    let classification = self.classifier.classify(&envelope);
                    if classification.disposition != Disposition::IsolateRecord {
                        warn!(
                            hold_request_id = id,
                            stage = stage_id.as_str(),
                            disposition = classification.disposition.as_str(),
                            error = %envelope,
                            "aborting stage"
                        );
                        return Err(self.classifier.batch_failure(envelope));
                    }
                    warn!(
                        hold_request_id = id,
                        stage = stage_id.as_str(),
                        error = %envelope,
                        "isolating record"
                    );
                    observability::record_isolated(stage_id);
                    StageStep::Rejected(OutcomeRecord::failure(
                        id,
                        job_id,
                        stage_id.isolation_error_type(),
                        envelope.outcome_message(),
                    ))
                }
            };

            match step {
                StageStep::Continue(record) => {
                    debug!(hold_request_id = id, stage = stage_id.as_str(), "record passed stage");
                    report.survivors.push(record);
                }
                StageStep::Completed(record, outcome) => {
                    self.emit(&outcome, token).await?;
                    report.emitted.push(outcome);
                    report.survivors.push(record);
                }
                StageStep::Rejected(outcome) => {
                    self.emit(&outcome, token).await?;
                    report.emitted.push(outcome);
                }
            }
        }

        Ok(report)
    }

    /// Write one outcome to the sink.
    ///
    /// # Errors
    ///
    /// Any sink failure becomes a retryable [`PipelineFailure`] at
    /// [`Stage::ResultSink`].
    pub async fn emit(&self, outcome: &OutcomeRecord, token: &AccessToken) -> Result<(), PipelineFailure> {
        let written = with_deadline(
            Stage::ResultSink,
            self.call_timeout,
            self.sink.write(outcome, token),
        )
        .await;

        match written {
            Ok(()) => {
                observability::record_outcome(outcome.success);
                debug!(
                    hold_request_id = outcome.hold_request_id,
                    success = outcome.success,
                    error_type = outcome.error_type(),
                    "outcome written"
                );
                Ok(())
            }
            Err(envelope) => {
                let envelope = sink_failure(envelope).with_record(outcome.hold_request_id);
                warn!(
                    hold_request_id = outcome.hold_request_id,
                    error = %envelope,
                    "result sink write failed"
                );
                Err(self.classifier.batch_failure(envelope))
            }
        }
    }
}

/// Normalize any sink-side failure into [`ErrorKind::SinkWrite`].
fn sink_failure(envelope: ErrorEnvelope) -> ErrorEnvelope {
    let kind = match envelope.kind {
        kind @ ErrorKind::SinkWrite { .. } => kind,
        other => ErrorKind::SinkWrite {
            status: other.http_status(),
            message: other.to_string(),
        },
    };
    ErrorEnvelope {
        kind,
        stage: Stage::ResultSink,
        context: envelope.context,
    }
}
