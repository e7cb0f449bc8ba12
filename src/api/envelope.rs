//! Decoding of the `{status, data, message}` response envelope.
//!
//! Every response is checked exactly once here; callers receive
//! `Result<T, Error>` and never look at `status` themselves.

use super::transport::HttpResponse;
use crate::error::{Error, Result, FALLBACK_MESSAGE};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: bool,
    data: Option<T>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct MessageOnly {
    #[serde(default)]
    message: Option<String>,
}

fn message_or_fallback(message: &str, fallback: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Turn a non-2xx response into `Error::Http`, taking the message from the
/// body when one is present.
pub fn http_error(response: &HttpResponse) -> Error {
    let message = serde_json::from_str::<MessageOnly>(&response.body)
        .ok()
        .and_then(|m| m.message)
        .map(|m| message_or_fallback(&m, FALLBACK_MESSAGE))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
    Error::Http {
        status: response.status,
        message,
    }
}

fn open<T: DeserializeOwned>(response: &HttpResponse, fallback: &str) -> Result<Option<T>> {
    if !response.is_success() {
        return Err(http_error(response));
    }

    let envelope: Envelope<T> = serde_json::from_str(&response.body)
        .map_err(|e| Error::Decode(e.to_string()))?;

    if !envelope.status {
        return Err(Error::Rejected(message_or_fallback(&envelope.message, fallback)));
    }

    Ok(envelope.data)
}

/// Decode a response whose `data` is required.
pub fn decode<T: DeserializeOwned>(response: &HttpResponse, fallback: &str) -> Result<T> {
    open::<T>(response, fallback)?
        .ok_or_else(|| Error::Decode("response is missing `data`".to_string()))
}

/// Decode a response where only success matters; `data` is ignored.
pub fn decode_ack(response: &HttpResponse, fallback: &str) -> Result<()> {
    open::<serde_json::Value>(response, fallback).map(|_| ())
}
