//! Maps raw responses and transport failures onto `ResponseEnvelope` / `AppError`.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use serde_json::Value;

use crate::envelope::{ResponseEnvelope, status_text};
use crate::errors::{AppError, ErrorKind};
use crate::messages::UserMessages;

/// Body fields consulted, in order, for a server-provided error message.
const MESSAGE_FIELDS: [&str; 3] = ["detail", "message", "error"];

#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    messages: UserMessages,
}

impl Normalizer {
    pub fn new(messages: UserMessages) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &UserMessages {
        &self.messages
    }

    pub fn response(&self, status: StatusCode, headers: &HeaderMap, body: &[u8]) -> ResponseEnvelope {
        let data = parse_body(status, headers, body);
        let code = status.as_u16();
        if code >= 400 {
            let error = self.status_error(code, data.as_ref());
            return ResponseEnvelope {
                data,
                status: code,
                status_text: status_text(code),
                success: false,
                error: Some(error),
            };
        }
        ResponseEnvelope {
            data,
            status: code,
            status_text: status_text(code),
            success: true,
            error: None,
        }
    }

    pub fn status_error(&self, status: u16, data: Option<&Value>) -> AppError {
        let kind = ErrorKind::from_status(status);
        let message = data
            .and_then(server_message)
            .unwrap_or_else(|| self.messages.for_status(status).to_string());
        let fields = match kind {
            ErrorKind::Validation => data.map(field_errors).unwrap_or_default(),
            _ => BTreeMap::new(),
        };
        AppError::new(kind, message)
            .with_status(status)
            .with_payload(data.cloned())
            .with_field_errors(fields)
    }

    pub fn transport_error(&self, err: &reqwest::Error) -> AppError {
        if err.is_timeout() {
            return AppError::new(ErrorKind::Timeout, self.messages.timeout.clone());
        }
        if err.is_builder() {
            return AppError::new(ErrorKind::Unknown, format!("{}: {}", self.messages.unknown, err));
        }
        AppError::new(ErrorKind::Network, self.messages.network.clone())
    }

    pub fn timeout(&self, _after: Duration) -> AppError {
        AppError::new(ErrorKind::Timeout, self.messages.timeout.clone())
    }

    pub fn session_expired(&self) -> AppError {
        AppError::new(ErrorKind::Unauthorized, self.messages.session_expired.clone()).with_status(401)
    }
}

/// Decodes a response body. Empty bodies are never parsed; malformed JSON yields `None`.
pub fn parse_body(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Option<Value> {
    if matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT) || body.is_empty() {
        return None;
    }
    let declared_empty = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    if declared_empty {
        return None;
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase());
    match content_type {
        Some(ct) if ct.contains("json") => serde_json::from_slice(body).ok(),
        Some(_) => Some(Value::String(String::from_utf8_lossy(body).into_owned())),
        None => serde_json::from_slice(body)
            .ok()
            .or_else(|| Some(Value::String(String::from_utf8_lossy(body).into_owned()))),
    }
}

/// First non-empty `detail` / `message` / `error` in the body.
pub fn server_message(data: &Value) -> Option<String> {
    let object = data.as_object()?;
    MESSAGE_FIELDS
        .iter()
        .filter_map(|field| object.get(*field))
        .find_map(message_text)
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(message_text),
        Value::Object(inner) => inner.get("message").and_then(message_text),
        _ => None,
    }
}

/// Field-level validation messages from bodies shaped `{ "field": ["msg", ...] }`.
pub fn field_errors(data: &Value) -> BTreeMap<String, Vec<String>> {
    let Some(object) = data.as_object() else {
        return BTreeMap::new();
    };
    object
        .iter()
        .filter(|(key, _)| !MESSAGE_FIELDS.contains(&key.as_str()))
        .filter_map(|(key, value)| {
            let messages: Vec<String> = match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            (!messages.is_empty()).then(|| (key.clone(), messages))
        })
        .collect()
}
