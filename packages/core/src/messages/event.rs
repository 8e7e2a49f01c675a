//! Envelope of a partitioned-log delivery.
//!
//! The invoker hands the consumer a JSON event of the form
//! `{"Records":[{"kinesis":{"data":"<base64>"}}]}`. Only the payloads are of
//! interest; decoding them into records is the decoder's job.

use serde::{Deserialize, Serialize};

/// One base64-encoded record payload as delivered by the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamPayload(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StreamEventRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEventRecord {
    #[serde(default)]
    pub kinesis: Option<KinesisData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KinesisData {
    #[serde(default)]
    pub data: Option<String>,
}

impl StreamEvent {
    /// Payloads of all records carrying data, in delivery order.
    #[must_use]
    pub fn payloads(&self) -> Vec<StreamPayload> {
        self.records
            .iter()
            .filter_map(|r| r.kinesis.as_ref()?.data.clone())
            .map(StreamPayload)
            .collect()
    }
}
