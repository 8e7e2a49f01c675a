//! Wire schemas exchanged with the stream, the result log and the backends.
//!
//! All structs use `#[serde(rename_all = "camelCase")]` to match the JSON
//! field names the services expect.

pub mod event;
pub mod offsite;
pub mod onsite;
pub mod result;

pub use event::{StreamEvent, StreamEventRecord, StreamPayload};
pub use offsite::{OffsiteRequest, OffsiteResponse};
pub use onsite::OnsiteRequest;
pub use result::{OutcomeError, OutcomeRecord};
