//! Shared reqwest plumbing: client construction, URL joining and error mapping.

use std::time::Duration;

use http::header::{HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;

use crate::error::{ErrorEnvelope, ErrorKind, Stage};
use crate::token::AccessToken;

/// Error bodies longer than this are cut before they are attached to an error.
const MAX_ERROR_BODY: usize = 512;

/// Build a client whose every request carries `timeout`.
///
/// # Errors
///
/// Returns the reqwest error if the TLS backend cannot be initialised.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
}

/// Join a base URL and a path with exactly one slash between them.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// `Authorization: Bearer <token>` header value.
///
/// # Errors
///
/// A token with characters not allowed in a header is a token-stage
/// [`ErrorKind::MalformedResponse`].
pub fn bearer(token: &AccessToken) -> Result<HeaderValue, ErrorEnvelope> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str())).map_err(|_| {
        ErrorEnvelope::new(
            Stage::Token,
            ErrorKind::MalformedResponse("access token is not a valid header value".into()),
        )
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Attach the bearer token to a request.
///
/// # Errors
///
/// See [`bearer`].
pub fn authorized(
    request: reqwest::RequestBuilder,
    token: &AccessToken,
) -> Result<reqwest::RequestBuilder, ErrorEnvelope> {
    Ok(request.header(AUTHORIZATION, bearer(token)?))
}

/// Map a transport failure. Timeouts keep their budget; anything else
/// means no response was received.
#[must_use]
pub fn transport_error(stage: Stage, err: &reqwest::Error, timeout: Duration) -> ErrorEnvelope {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else {
        ErrorKind::NoResponse(err.to_string())
    };
    ErrorEnvelope::new(stage, kind)
}

/// Send a request and turn a non-2xx status into [`ErrorKind::Status`].
///
/// # Errors
///
/// Transport failures as per [`transport_error`]; non-2xx responses as
/// [`ErrorKind::Status`] carrying a prefix of the body.
pub async fn send(
    stage: Stage,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<reqwest::Response, ErrorEnvelope> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(stage, &e, timeout))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.ok().filter(|b| !b.is_empty()).map(|mut b| {
        if b.len() > MAX_ERROR_BODY {
            let mut end = MAX_ERROR_BODY;
            while !b.is_char_boundary(end) {
                end -= 1;
            }
            b.truncate(end);
        }
        b
    });
    Err(ErrorEnvelope::new(
        stage,
        ErrorKind::Status {
            status: status.as_u16(),
            body,
        },
    ))
}

/// Read a JSON body.
///
/// # Errors
///
/// A body that does not match `T` is [`ErrorKind::MalformedResponse`]; a
/// failure while reading it is a transport error.
pub async fn read_json<T: DeserializeOwned>(
    stage: Stage,
    response: reqwest::Response,
    timeout: Duration,
) -> Result<T, ErrorEnvelope> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(stage, &e, timeout))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ErrorEnvelope::new(stage, ErrorKind::MalformedResponse(e.to_string())))
}
