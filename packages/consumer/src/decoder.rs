use async_trait::async_trait;
use holdrq_core::messages::StreamPayload;
use holdrq_core::{decode_payload, HoldRequestRecord};

use crate::error::{ErrorEnvelope, ErrorKind, Stage};
use crate::traits::StreamDecoder;

/// Decodes base64-wrapped named `MsgPack` hold request payloads.
///
/// One undecodable payload fails the whole batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackStreamDecoder;

#[async_trait]
impl StreamDecoder for MsgPackStreamDecoder {
    async fn decode(
        &self,
        schema: &str,
        payloads: &[StreamPayload],
    ) -> Result<Vec<HoldRequestRecord>, ErrorEnvelope> {
        payloads
            .iter()
            .enumerate()
            .map(|(index, payload)| {
                decode_payload(payload).map_err(|err| {
                    ErrorEnvelope::new(
                        Stage::Decode,
                        ErrorKind::Decode {
                            schema: schema.to_string(),
                            message: format!("payload {index}: {err}"),
                        },
                    )
                })
            })
            .collect()
    }
}
