use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Closed set of failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Server,
    Unknown,
}

impl ErrorKind {
    /// Maps an HTTP status (>= 400) to its error class.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorKind::Validation,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        }
    }

    /// Transport failures and 5xx are the only kinds worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Server
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::Unauthorized => write!(f, "unauthorized"),
            ErrorKind::Forbidden => write!(f, "forbidden"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Server => write!(f, "server"),
            ErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classified request failure, produced once at the normalization boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppError {
    pub kind: ErrorKind,
    pub user_message: String,
    pub http_status: Option<u16>,
    pub payload: Option<serde_json::Value>,
    /// Per-field messages from validation bodies shaped `{ "field": ["msg"] }`.
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl AppError {
    pub fn new(kind: ErrorKind, user_message: impl Into<String>) -> Self {
        Self {
            kind,
            user_message: user_message.into(),
            http_status: None,
            payload: None,
            field_errors: BTreeMap::new(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_payload(mut self, payload: Option<serde_json::Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_field_errors(mut self, field_errors: BTreeMap<String, Vec<String>>) -> Self {
        self.field_errors = field_errors;
        self
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(f, "{} ({}): {}", self.kind, status, self.user_message),
            None => write!(f, "{}: {}", self.kind, self.user_message),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(String),
    Storage(String),
    Api(AppError),
}

impl Error {
    /// HTTP status of the failed response, when there was one.
    pub fn status(&self) -> Option<u16> {
        self.app_error().and_then(|e| e.http_status)
    }

    /// Parsed body of the failed response, when there was one.
    pub fn data(&self) -> Option<&serde_json::Value> {
        self.app_error().and_then(|e| e.payload.as_ref())
    }

    pub fn app_error(&self) -> Option<&AppError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.app_error().map(|e| e.kind)
    }

    pub(crate) fn is_retriable(&self) -> bool {
        matches!(self, Error::Api(err) if err.is_transient())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Json(err) => write!(f, "json error: {err}"),
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Storage(msg) => write!(f, "storage error: {msg}"),
            Error::Api(err) => write!(f, "request failed: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<AppError> for Error {
    fn from(err: AppError) -> Self {
        Error::Api(err)
    }
}
