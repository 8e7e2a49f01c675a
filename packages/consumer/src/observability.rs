//! Logging setup and counters.
//!
//! Counters go through the `metrics` facade; without an installed recorder
//! they are no-ops.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::Stage;

/// Outcomes written to the result stream, labelled by `success`.
pub const OUTCOMES_TOTAL: &str = "holdrq_outcomes_total";
/// Records isolated from a batch, labelled by `stage`.
pub const RECORDS_ISOLATED_TOTAL: &str = "holdrq_records_isolated_total";
/// Finished batches, labelled by `disposition`.
pub const BATCHES_TOTAL: &str = "holdrq_batches_total";

pub fn record_outcome(success: bool) {
    metrics::counter!(OUTCOMES_TOTAL, "success" => if success { "true" } else { "false" })
        .increment(1);
}

pub fn record_isolated(stage: Stage) {
    metrics::counter!(RECORDS_ISOLATED_TOTAL, "stage" => stage.as_str()).increment(1);
}

pub fn record_batch(disposition: &'static str) {
    metrics::counter!(BATCHES_TOTAL, "disposition" => disposition).increment(1);
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Install the global subscriber. `RUST_LOG` wins over `default_directive`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(
    format: LogFormat,
    default_directive: &str,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use clap::ValueEnum;

    use super::*;

    #[test]
    fn log_format_parses_from_flag_values() {
        assert_eq!(LogFormat::from_str("json", true), Ok(LogFormat::Json));
        assert_eq!(LogFormat::from_str("PRETTY", true), Ok(LogFormat::Pretty));
        assert!(LogFormat::from_str("xml", true).is_err());
    }

    #[test]
    fn counters_are_noops_without_recorder() {
        record_outcome(true);
        record_isolated(Stage::ItemLookup);
        record_batch("completed");
    }
}
