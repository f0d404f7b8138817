//! Response values handed back to callers.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::http::error::ClientError;

/// A fully-read backend response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    synthetic: bool,
}

impl ApiResponse {
    pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
            synthetic: false,
        }
    }

    /// Empty 204 standing in for a 401 on an anonymous-tolerant call.
    pub fn anonymous_no_content() -> Self {
        Self {
            status: 204,
            headers: HeaderMap::new(),
            body: Vec::new(),
            synthetic: true,
        }
    }

    /// True for the stand-in produced by an anonymous 401.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Decode the body; an empty body is an error.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        if self.is_empty() {
            return Err(ClientError::Decode(format!(
                "expected a JSON body, got an empty {} response",
                self.status
            )));
        }
        serde_json::from_slice(&self.body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Decode the body, treating an empty body as absent data.
    pub fn json_opt<T: DeserializeOwned>(&self) -> Result<Option<T>, ClientError> {
        if self.is_empty() {
            return Ok(None);
        }
        self.json().map(Some)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Best human-readable message from an error body.
///
/// Prefers a JSON `message` or `error` field, else the raw text (truncated).
pub(crate) fn error_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    match text.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
