//! User-facing messages attached to every `AppError`.
//!
//! Defaults are English; deployments override individual keys from the
//! configuration file to ship translated strings.

use serde::Deserialize;

use crate::errors::ErrorKind;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserMessages {
    pub network: String,
    pub timeout: String,
    pub unauthorized: String,
    pub session_expired: String,
    pub forbidden: String,
    pub not_found: String,
    pub bad_request: String,
    pub server_error: String,
    pub unknown: String,
}

impl Default for UserMessages {
    fn default() -> Self {
        Self {
            network: "Unable to reach the server. Check your connection and try again.".into(),
            timeout: "The server took too long to respond. Please try again.".into(),
            unauthorized: "You need to sign in to continue.".into(),
            session_expired: "Your session has expired. Please sign in again.".into(),
            forbidden: "You do not have permission to perform this action.".into(),
            not_found: "The requested resource was not found.".into(),
            bad_request: "The request was invalid. Please check your input.".into(),
            server_error: "Something went wrong on our side. Please try again later.".into(),
            unknown: "An unexpected error occurred.".into(),
        }
    }
}

impl UserMessages {
    /// Generic message for a failure class. Unclassified 4xx responses read as a bad request.
    pub fn for_status(&self, status: u16) -> &str {
        match ErrorKind::from_status(status) {
            ErrorKind::Unknown if (400..500).contains(&status) => &self.bad_request,
            kind => self.for_kind(kind),
        }
    }

    pub fn for_kind(&self, kind: ErrorKind) -> &str {
        match kind {
            ErrorKind::Network => &self.network,
            ErrorKind::Timeout => &self.timeout,
            ErrorKind::Unauthorized => &self.unauthorized,
            ErrorKind::Forbidden => &self.forbidden,
            ErrorKind::NotFound => &self.not_found,
            ErrorKind::Validation => &self.bad_request,
            ErrorKind::Server => &self.server_error,
            ErrorKind::Unknown => &self.unknown,
        }
    }
}
