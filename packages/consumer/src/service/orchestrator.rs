//! Top-level batch pipeline.
//!
//! ```text
//! validating-config
//!   -> fetching-token-and-decoding   (token and decode run concurrently)
//!   -> filtering                     (empty -> completed)
//!   -> enriching-item -> enriching-patron
//!   -> dispatching
//!   -> completed | failed-retryable | failed-permanent
//! ```

use std::sync::Arc;

use holdrq_core::messages::StreamPayload;
use holdrq_core::DeliveryLocationTable;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{ErrorEnvelope, Stage};
use crate::observability;
use crate::token::TokenCache;
use crate::traits::{
    ItemLookup, OffsiteBackend, OnsiteBackend, PatronLookup, ResultSink, StreamDecoder,
    TokenProvider, TokenStore,
};

use super::backend::{OffsiteStage, OnsiteStage};
use super::classify::ErrorClassifier;
use super::config::ConsumerConfig;
use super::deadline::with_deadline;
use super::dispatch::Dispatcher;
use super::enrich::{ItemStage, PatronStage};
use super::filter::filter_unprocessed;
use super::operation::{Completion, CompletionPath, PipelineFailure, PipelineState};
use super::stage::StageRunner;

/// Everything the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub token_provider: Arc<dyn TokenProvider>,
    pub token_store: Arc<dyn TokenStore>,
    pub decoder: Arc<dyn StreamDecoder>,
    pub items: Arc<dyn ItemLookup>,
    pub patrons: Arc<dyn PatronLookup>,
    pub offsite: Arc<dyn OffsiteBackend>,
    pub onsite: Arc<dyn OnsiteBackend>,
    pub sink: Arc<dyn ResultSink>,
}

/// Forward-only record of the states a run passed through.
#[derive(Debug)]
struct StateTracker {
    current: PipelineState,
    visited: Vec<PipelineState>,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            current: PipelineState::ValidatingConfig,
            visited: vec![PipelineState::ValidatingConfig],
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.current.can_advance_to(next),
            "illegal transition {} -> {next}",
            self.current
        );
        debug!(from = self.current.as_str(), to = next.as_str(), "pipeline state");
        self.current = next;
        self.visited.push(next);
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs one batch through the whole pipeline.
pub struct Orchestrator {
    config: ConsumerConfig,
    locations: Arc<DeliveryLocationTable>,
    classifier: ErrorClassifier,
    tokens: TokenCache,
    collaborators: Collaborators,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        config: ConsumerConfig,
        locations: DeliveryLocationTable,
        collaborators: Collaborators,
    ) -> Self {
        let classifier = ErrorClassifier::new(config.failure_policy());
        let tokens = TokenCache::new(Arc::clone(&collaborators.token_store));
        Self {
            config,
            locations: Arc::new(locations),
            classifier,
            tokens,
            collaborators,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// Process one delivered batch.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineFailure`] when the batch has to be abandoned.
    /// [`PipelineFailure::is_retryable`] tells the invoker whether running
    /// the same batch again can succeed. A rejected token is dropped from the
    /// cache before returning.
    pub async fn process(&self, payloads: &[StreamPayload]) -> Result<Completion, PipelineFailure> {
        let invocation_id = Uuid::new_v4();
        let span = info_span!("batch", %invocation_id, payloads = payloads.len());

        async {
            let mut tracker = StateTracker::new();
            let result = self.run(&mut tracker, payloads).await;

            match &result {
                Ok(completion) => {
                    tracker.advance(PipelineState::Completed);
                    observability::record_batch(PipelineState::Completed.as_str());
                    info!(
                        states = ?tracker.visited,
                        outcomes = completion.outcomes_emitted.len(),
                        dispatched = completion.dispatched.len(),
                        "{}",
                        completion.message
                    );
                }
                Err(failure) => {
                    if failure.invalidate_token {
                        self.tokens.invalidate();
                        warn!("access token rejected; cleared cached token");
                    }
                    let state = failure.state();
                    tracker.advance(state);
                    observability::record_batch(state.as_str());
                    error!(
                        states = ?tracker.visited,
                        stage = failure.envelope.stage.as_str(),
                        hold_request_id = failure.envelope.context.hold_request_id,
                        retryable = failure.retryable,
                        error = %failure.envelope,
                        "batch failed"
                    );
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        tracker: &mut StateTracker,
        payloads: &[StreamPayload],
    ) -> Result<Completion, PipelineFailure> {
        self.config
            .validate()
            .map_err(|e| self.classifier.batch_failure(ErrorEnvelope::new(Stage::Config, e.into())))?;

        tracker.advance(PipelineState::FetchingTokenAndDecoding);
        let call_timeout = self.config.call_timeout();
        let token = async {
            with_deadline(
                Stage::Token,
                call_timeout,
                self.tokens
                    .get_or_fetch(self.collaborators.token_provider.as_ref()),
            )
            .await
            .map_err(|e| e.at_stage(Stage::Token))
        };
        let decode = async {
            self.collaborators
                .decoder
                .decode(&self.config.schema_name, payloads)
                .await
                .map_err(|e| e.at_stage(Stage::Decode))
        };
        let (lease, records) =
            tokio::try_join!(token, decode).map_err(|e| self.classifier.batch_failure(e))?;
        info!(
            token_source = lease.source.as_str(),
            records = records.len(),
            "decoded batch"
        );
        let token = lease.token;

        tracker.advance(PipelineState::Filtering);
        let pending = filter_unprocessed(records);
        if pending.is_empty() {
            return Ok(Completion::new(
                CompletionPath::NothingToProcess,
                "no unprocessed hold request records in batch",
            ));
        }

        let runner = StageRunner::new(
            Arc::clone(&self.collaborators.sink),
            self.classifier.clone(),
            call_timeout,
        );
        let mut outcomes = Vec::new();

        tracker.advance(PipelineState::EnrichingItem);
        let items = ItemStage::new(Arc::clone(&self.collaborators.items));
        let report = runner.run(&items, pending, &token).await?;
        outcomes.extend(report.emitted);

        tracker.advance(PipelineState::EnrichingPatron);
        let patrons = PatronStage::new(Arc::clone(&self.collaborators.patrons));
        let report = runner.run(&patrons, report.survivors, &token).await?;
        outcomes.extend(report.emitted);

        if report.survivors.is_empty() {
            let mut completion = Completion::new(
                CompletionPath::AllIsolated,
                "every unprocessed hold request record failed enrichment",
            );
            completion.outcomes_emitted = outcomes;
            return Ok(completion);
        }

        tracker.advance(PipelineState::Dispatching);
        let dispatcher = Dispatcher::new(
            runner,
            OffsiteStage::new(
                Arc::clone(&self.collaborators.offsite),
                Arc::clone(&self.locations),
            ),
            OnsiteStage::new(Arc::clone(&self.collaborators.onsite)),
        );
        let report = dispatcher.dispatch(report.survivors, &token).await?;
        outcomes.extend(report.emitted);

        let mut completion = Completion::new(
            CompletionPath::Dispatched,
            format!(
                "successfully processed {} hold request record(s)",
                report.survivors.len()
            ),
        );
        completion.dispatched = report.survivors;
        completion.outcomes_emitted = outcomes;
        Ok(completion)
    }
}
