use std::fmt;
use std::time::Duration;

use reqwest::{Method, Url};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::warn;

use crate::errors::Error;

/// Whether a request carries the stored bearer token.
///
/// Login and token-refresh calls are `NoAuth`: they never get an Authorization
/// header and a 401 from them means bad credentials, not an expired session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Bearer,
    NoAuth,
}

/// One multipart field, kept as owned bytes so the form can be rebuilt on resend.
#[derive(Clone, Debug, PartialEq)]
pub struct MultipartPart {
    pub name: String,
    pub data: Vec<u8>,
    pub file_name: Option<String>,
    pub mime: Option<String>,
}

impl MultipartPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: value.into().into_bytes(),
            file_name: None,
            mime: None,
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
            file_name: Some(file_name.into()),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    fn to_part(&self) -> Part {
        let mut part = Part::bytes(self.data.clone());
        if let Some(file_name) = &self.file_name {
            part = part.file_name(file_name.clone());
        }
        match &self.mime {
            Some(mime) => match part.mime_str(mime) {
                Ok(typed) => typed,
                Err(err) => {
                    warn!(field = %self.name, mime = %mime, error = %err, "multipart.invalid_mime");
                    let mut untyped = Part::bytes(self.data.clone());
                    if let Some(file_name) = &self.file_name {
                        untyped = untyped.file_name(file_name.clone());
                    }
                    untyped
                }
            },
            None => part,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<MultipartPart>),
    Binary(Vec<u8>),
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, Error> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }

    /// Multipart and binary payloads get their Content-Type from the transport
    /// (the multipart boundary in particular), never from the caller.
    pub fn transport_sets_content_type(&self) -> bool {
        matches!(self, RequestBody::Multipart(_) | RequestBody::Binary(_))
    }

    pub(crate) fn to_form(parts: &[MultipartPart]) -> Form {
        parts
            .iter()
            .fold(Form::new(), |form, part| form.part(part.name.clone(), part.to_part()))
    }
}

/// Per-call knobs supplied by the caller alongside endpoint and body.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub auth: AuthMode,
}

impl RequestOptions {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn no_auth(mut self) -> Self {
        self.auth = AuthMode::NoAuth;
        self
    }
}

#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub method: Method,
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub timeout: Duration,
    pub auth: AuthMode,
}

impl RequestDescriptor {
    pub fn new(
        method: Method,
        endpoint: impl Into<String>,
        body: RequestBody,
        options: RequestOptions,
        default_timeout: Duration,
    ) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: options.query,
            headers: options.headers,
            body,
            timeout: options.timeout.unwrap_or(default_timeout),
            auth: options.auth,
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")
    }

    /// True when the request goes to the same scheme, host and port as `base`.
    /// Relative endpoints always do; unparsable absolute ones never do.
    pub fn shares_origin_with(&self, base: &str) -> bool {
        if !self.is_absolute() {
            return true;
        }
        match (Url::parse(&self.endpoint), Url::parse(base)) {
            (Ok(target), Ok(base)) => target.origin() == base.origin(),
            _ => false,
        }
    }

    /// Absolute endpoints are used as-is; relative ones are joined onto `base`.
    pub fn url(&self, base: &str) -> String {
        let mut url = if self.is_absolute() {
            self.endpoint.clone()
        } else {
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                self.endpoint.trim_start_matches('/')
            )
        };
        if !self.query.is_empty() {
            let encoded = self
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&encoded);
        }
        url
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)
    }
}
