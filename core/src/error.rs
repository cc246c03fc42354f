//! Error types for the request adapter.
//!
//! # Design
//! Two shapes exist. `ClientError` is what a request client rejects with: the
//! code and params are optional because clients do not always classify their
//! failures. `RequestError` is the normalized shape stored in
//! `RequestState::error` and returned to callers: it always has a code, with
//! `UNKNOWN_CODE` filling the gap.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Code assigned to a client error that carries none.
pub const UNKNOWN_CODE: &str = "UNKNOWN";

/// Code for a verb the client cannot perform.
pub const UNSUPPORTED_CODE: &str = "UNSUPPORTED_METHOD";

/// Code for a successful payload that does not decode into the expected type.
pub const INVALID_RESPONSE_CODE: &str = "INVALID_RESPONSE";

/// Code the bundled `HttpClient` uses for transport failures.
pub const NETWORK_CODE: &str = "NETWORK_ERROR";

/// Rejection produced by a `RequestClient`.
///
/// Deserializes from the `{"message", "code", "params"}` JSON bodies that
/// servers following the request-client convention return on failure.
#[derive(Debug, Clone, PartialEq, Error, Deserialize)]
#[error("{message}")]
pub struct ClientError {
    pub message: String,
    #[serde(default, deserialize_with = "lenient_code")]
    pub code: Option<String>,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
}

/// Accept a code of any JSON type; non-strings keep their JSON text, so `404`
/// becomes `"404"`.
fn lenient_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let code = match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(code) => Some(code),
        other => Some(other.to_string()),
    };
    Ok(code)
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            params: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }
}

/// Normalized error held in request state.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct RequestError {
    pub message: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

impl RequestError {
    /// The error recorded when a verb is dispatched that the client cannot
    /// perform. The message names the verb.
    pub fn unsupported(verb: &str) -> Self {
        Self {
            message: format!("unsupported request method: {verb}"),
            code: UNSUPPORTED_CODE.to_string(),
            params: None,
        }
    }

    pub fn invalid_response(err: &serde_json::Error) -> Self {
        Self {
            message: format!("response could not be decoded: {err}"),
            code: INVALID_RESPONSE_CODE.to_string(),
            params: None,
        }
    }
}

impl From<ClientError> for RequestError {
    fn from(err: ClientError) -> Self {
        let code = err
            .code
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| UNKNOWN_CODE.to_string());
        Self {
            message: err.message,
            code,
            params: err.params,
        }
    }
}

/// Invalid `ClientConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("base URL is empty")]
    EmptyBaseUrl,

    #[error("base URL must start with http:// or https://, got {0:?}")]
    InvalidScheme(String),

    #[error("invalid header {0:?}, expected name:value")]
    InvalidHeader(String),
}
