//! Outcome notifications written to the hold request result stream.

use serde::{Deserialize, Serialize};

use crate::types::HoldRequestId;

/// One outcome per terminally processed hold request.
///
/// `error` is serialized as an explicit `null` on success; consumers of the
/// result stream rely on the field being present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub hold_request_id: HoldRequestId,
    pub job_id: Option<String>,
    pub success: bool,
    pub error: Option<OutcomeError>,
}

/// Failure detail carried by an unsuccessful outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl OutcomeRecord {
    #[must_use]
    pub fn success(hold_request_id: HoldRequestId, job_id: Option<String>) -> Self {
        Self {
            hold_request_id,
            job_id,
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(
        hold_request_id: HoldRequestId,
        job_id: Option<String>,
        error_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            hold_request_id,
            job_id,
            success: false,
            error: Some(OutcomeError {
                error_type: error_type.into(),
                message: message.into(),
            }),
        }
    }

    /// Error type of a failed outcome, `None` on success.
    #[must_use]
    pub fn error_type(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.error_type.as_str())
    }
}
