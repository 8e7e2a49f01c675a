//! Payload codec for hold request records.
//!
//! Stream payloads are base64-wrapped named `MsgPack` (`rmp_serde::to_vec_named`)
//! maps with the same camelCase field names as the JSON wire format.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::messages::StreamPayload;
use crate::types::HoldRequestRecord;

/// Failure to turn a payload into a record.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload does not match the hold request schema: {0}")]
    Schema(#[from] rmp_serde::decode::Error),
    #[error("record could not be encoded: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

/// Decode one stream payload into a record.
///
/// # Errors
///
/// Returns [`CodecError`] if the payload is not base64 or the bytes do not
/// deserialize into a [`HoldRequestRecord`].
pub fn decode_payload(payload: &StreamPayload) -> Result<HoldRequestRecord, CodecError> {
    let bytes = STANDARD.decode(payload.0.trim())?;
    Ok(rmp_serde::from_slice(&bytes)?)
}

/// Encode a record the way the producer does. Used by fixtures and tooling.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode_payload(record: &HoldRequestRecord) -> Result<StreamPayload, CodecError> {
    let bytes = rmp_serde::to_vec_named(record)?;
    Ok(StreamPayload(STANDARD.encode(bytes)))
}
