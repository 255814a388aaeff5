//! Authenticated HTTP client for the live-classes platform REST backend.
//!
//! [`ApiClient`] attaches bearer tokens, refreshes them once on a 401 (one
//! refresh in flight at a time, with a cooldown), retries transient failures
//! with linear backoff, and normalizes every outcome into a
//! [`ResponseEnvelope`] or a typed [`AppError`].

mod client;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod executor;
pub mod interceptor;
pub mod messages;
pub mod normalize;
pub mod request;
pub mod retry;
pub mod storage;
pub mod telemetry;
pub mod token;

pub use client::ApiClient;
pub use config::Config;
pub use envelope::ResponseEnvelope;
pub use errors::{AppError, Error, ErrorKind};
pub use interceptor::Interceptors;
pub use request::{AuthMode, MultipartPart, RequestBody, RequestOptions};
pub use token::{AuthTokenManager, RefreshOutcome, SessionEvent, TokenPair};
