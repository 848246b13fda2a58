//! Transport abstraction over the chat backend.
//!
//! A `Transport` performs exactly one request per call and classifies every
//! failure into a `TransportError`. There are no retries at this layer; the
//! callers decide what a failure means for the UI.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::Display;
use thiserror::Error;

/// HTTP verbs used by the backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

/// Failure of a single backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request never completed (connection refused, reset, timeout).
    #[error("Network error: {message}")]
    Network { message: String },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The body was not valid structured data, or did not have the expected shape.
    #[error("Decode error: {message}")]
    Decode { message: String },
}

impl TransportError {
    pub const TOO_MANY_REQUESTS: u16 = 429;

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns the HTTP status when the server responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` for an HTTP 429 answer.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(Self::TOO_MANY_REQUESTS)
    }
}

/// A page request the way a browser form sends it.
///
/// The backend answers these with redirects instead of JSON, so the result
/// of a submission is the page the redirect chain landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub method: Method,
    pub endpoint: String,
    /// Sent urlencoded; empty for a plain `GET`.
    pub fields: Vec<(String, String)>,
}

impl FormRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: endpoint.into(),
            fields: Vec::new(),
        }
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }
}

/// Single-attempt request/response channel to the backend.
///
/// `call` returns the decoded JSON body on a 2xx answer; an empty body
/// decodes to `Value::Null`. `submit` returns the path of the page a form
/// submission finally landed on.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError>;

    async fn submit(&self, request: FormRequest) -> Result<String, TransportError>;
}

/// Converts a JSON body into a typed response, classifying shape mismatches
/// as `TransportError::Decode`.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|err| TransportError::decode(err.to_string()))
}

/// Parses a raw response body the way every transport does.
pub fn parse_body(text: &str) -> Result<Value, TransportError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|err| TransportError::decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn rate_limit_is_detected_by_status() {
        let err = TransportError::Http {
            status: 429,
            body: "{\"error\": \"blocked\"}".to_string(),
        };
        assert!(err.is_rate_limited());
        assert!(!TransportError::network("refused").is_rate_limited());
    }

    #[test]
    fn empty_body_parses_to_null() {
        assert_eq!(parse_body("  \n").unwrap(), Value::Null);
    }

    #[test]
    fn html_body_is_a_decode_error() {
        let err = parse_body("<html>login</html>").unwrap_err();
        assert!(matches!(err, TransportError::Decode { .. }));
    }

    #[test]
    fn shape_mismatch_is_a_decode_error() {
        #[derive(Debug, Deserialize)]
        struct Reply {
            #[allow(dead_code)]
            response: String,
        }

        let err = decode::<Reply>(serde_json::json!({"other": 1})).unwrap_err();
        assert!(matches!(err, TransportError::Decode { .. }));
    }

    #[test]
    fn form_request_keeps_field_order() {
        let request = FormRequest::post("/admin/teach")
            .field("question", "horário?")
            .field("answer", "9h às 18h");

        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.fields,
            vec![
                ("question".to_string(), "horário?".to_string()),
                ("answer".to_string(), "9h às 18h".to_string()),
            ]
        );
        assert!(FormRequest::get("/logout").fields.is_empty());
    }

    #[test]
    fn method_displays_as_http_verb() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
    }
}
