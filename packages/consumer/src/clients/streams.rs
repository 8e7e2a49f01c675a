use std::time::Duration;

use async_trait::async_trait;
use holdrq_core::OutcomeRecord;
use serde::Serialize;

use crate::error::{ErrorEnvelope, ErrorKind, Stage};
use crate::token::AccessToken;
use crate::traits::ResultSink;

use super::transport;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamWrite<'a> {
    schema_name: &'a str,
    records: [&'a OutcomeRecord; 1],
}

/// Writes outcomes to the result stream through the data API.
#[derive(Debug, Clone)]
pub struct StreamsResultSink {
    client: reqwest::Client,
    base_url: String,
    stream_name: String,
    schema_name: String,
    timeout: Duration,
}

impl StreamsResultSink {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        stream_name: impl Into<String>,
        schema_name: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            stream_name: stream_name.into(),
            schema_name: schema_name.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ResultSink for StreamsResultSink {
    async fn write(
        &self,
        outcome: &OutcomeRecord,
        token: &AccessToken,
    ) -> Result<(), ErrorEnvelope> {
        let url = transport::join_url(&self.base_url, &format!("streams/{}", self.stream_name));
        let body = StreamWrite {
            schema_name: &self.schema_name,
            records: [outcome],
        };
        let request = transport::authorized(self.client.post(url).json(&body), token)?;
        transport::send(Stage::ResultSink, request, self.timeout)
            .await
            .map(|_| ())
            .map_err(|envelope| {
                let message = envelope.kind.to_string();
                ErrorEnvelope::new(
                    Stage::ResultSink,
                    ErrorKind::SinkWrite {
                        status: envelope.http_status(),
                        message,
                    },
                )
                .with_record(outcome.hold_request_id)
            })
    }
}
