//! Per-call deadline enforcement.
//!
//! Every outbound call is wrapped so that exceeding the configured budget
//! surfaces as [`ErrorKind::Timeout`] tagged with the calling stage.

use std::future::Future;
use std::time::Duration;

use crate::error::{ErrorEnvelope, ErrorKind, Stage};

/// Run `fut` with a deadline of `budget`.
///
/// # Errors
///
/// Returns the future's own error, or a [`Stage`]-tagged
/// [`ErrorKind::Timeout`] when the deadline elapses first.
pub async fn with_deadline<T, F>(stage: Stage, budget: Duration, fut: F) -> Result<T, ErrorEnvelope>
where
    F: Future<Output = Result<T, ErrorEnvelope>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_elapsed) => Err(ErrorEnvelope::new(
            stage,
            ErrorKind::Timeout {
                timeout_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
            },
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
