use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::{AppError, Error, ErrorKind};

/// Uniform result shape handed to every caller, whatever the transport outcome.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub data: Option<serde_json::Value>,
    pub status: u16,
    pub status_text: String,
    pub success: bool,
    pub error: Option<AppError>,
}

impl ResponseEnvelope {
    /// Envelope for a failure that produced no HTTP response, or whose response was an error.
    pub fn from_error(error: AppError) -> Self {
        let status = error.http_status.unwrap_or(0);
        Self {
            data: error.payload.clone(),
            status,
            status_text: status_text(status),
            success: false,
            error: Some(error),
        }
    }

    /// Folds a request result into an envelope for callers that branch on `success`.
    pub fn from_result(result: Result<Self, Error>) -> Self {
        match result {
            Ok(envelope) => envelope,
            Err(Error::Api(error)) => Self::from_error(error),
            Err(other) => Self::from_error(AppError::new(ErrorKind::Unknown, other.to_string())),
        }
    }

    /// Deserializes `data` into a typed value; an absent body reads as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let value = self.data.clone().unwrap_or(serde_json::Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    pub(crate) fn into_result(self) -> Result<Self, AppError> {
        if self.success {
            return Ok(self);
        }
        match self.error {
            Some(error) => Err(error),
            None => Err(AppError::new(ErrorKind::Unknown, self.status_text).with_status(self.status)),
        }
    }
}

pub(crate) fn status_text(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_api_error_into_failed_envelope() {
        let err = Error::from(
            AppError::new(ErrorKind::Forbidden, "nope")
                .with_status(403)
                .with_payload(Some(serde_json::json!({"detail": "nope"}))),
        );
        let envelope = ResponseEnvelope::from_result(Err(err));
        assert!(!envelope.success);
        assert_eq!(envelope.status, 403);
        assert_eq!(envelope.status_text, "Forbidden");
        assert_eq!(envelope.error.map(|e| e.kind), Some(ErrorKind::Forbidden));
    }

    #[test]
    fn typed_decode_of_data() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Batch {
            id: u32,
            title: String,
        }
        let envelope = ResponseEnvelope {
            data: Some(serde_json::json!({"id": 3, "title": "Algebra"})),
            status: 200,
            status_text: "OK".into(),
            success: true,
            error: None,
        };
        let batch: Batch = envelope.json().unwrap();
        assert_eq!(
            batch,
            Batch {
                id: 3,
                title: "Algebra".into()
            }
        );
        let none: Option<Batch> = ResponseEnvelope { data: None, ..envelope }.json().unwrap();
        assert!(none.is_none());
    }
}
