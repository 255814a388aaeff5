use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::envelope::ResponseEnvelope;
use crate::errors::{AppError, Error};
use crate::interceptor::Interceptors;
use crate::normalize::Normalizer;
use crate::request::{AuthMode, RequestBody, RequestDescriptor};
use crate::token::{AuthTokenManager, RefreshOutcome};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Sends one logical request: auth header, timeout, and the bounded 401
/// refresh-then-resend cycle. Transient-failure retries live a layer above.
#[derive(Clone)]
pub struct RequestExecutor {
    http: Client,
    base_url: String,
    tokens: AuthTokenManager,
    normalizer: Normalizer,
    interceptors: Interceptors,
}

impl RequestExecutor {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        tokens: AuthTokenManager,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens,
            normalizer,
            interceptors: Interceptors::default(),
        }
    }

    pub fn with_interceptors(mut self, interceptors: Interceptors) -> Self {
        self.interceptors = interceptors;
        self
    }

    pub fn tokens(&self) -> &AuthTokenManager {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<ResponseEnvelope, Error> {
        let descriptor = self.interceptors.apply_request(descriptor);
        match self.execute_authenticated(&descriptor).await {
            Ok(envelope) => Ok(self.interceptors.apply_response(envelope)),
            Err(err) => Err(Error::Api(self.interceptors.apply_error(err))),
        }
    }

    async fn execute_authenticated(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<ResponseEnvelope, AppError> {
        let authenticated = self.carries_token(descriptor);
        if authenticated && self.tokens.needs_refresh_before_send().await {
            debug!(request = %descriptor, "request.proactive_refresh");
            self.tokens.refresh().await;
        }

        let envelope = self.send(descriptor).await?;
        if envelope.status != 401 || !authenticated {
            return envelope.into_result();
        }

        warn!(request = %descriptor, status = 401, "request.unauthorized");
        match self.tokens.refresh_outcome().await {
            outcome if outcome.succeeded() => {
                let retried = self.send(descriptor).await?;
                if retried.status == 401 {
                    warn!(request = %descriptor, status = 401, "request.unauthorized_after_refresh");
                }
                retried.into_result()
            }
            RefreshOutcome::SessionExpired => Err(self
                .normalizer
                .session_expired()
                .with_payload(envelope.data)),
            _ => envelope.into_result(),
        }
    }

    /// Bearer requests carry the token only to the API's own origin.
    fn carries_token(&self, descriptor: &RequestDescriptor) -> bool {
        descriptor.auth == AuthMode::Bearer && descriptor.shares_origin_with(&self.base_url)
    }

    async fn send(&self, descriptor: &RequestDescriptor) -> Result<ResponseEnvelope, AppError> {
        let url = descriptor.url(&self.base_url);
        let mut builder = self
            .http
            .request(descriptor.method.clone(), &url)
            .header(ACCEPT, "application/json")
            .header(X_REQUEST_ID, Uuid::new_v4().to_string());

        for (name, value) in &descriptor.headers {
            if descriptor.body.transport_sets_content_type()
                && name.eq_ignore_ascii_case(CONTENT_TYPE.as_str())
            {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        if self.carries_token(descriptor)
            && let Some(token) = self.tokens.access_token().await
        {
            builder = builder.bearer_auth(token);
        }

        builder = match &descriptor.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(RequestBody::to_form(parts)),
            RequestBody::Binary(bytes) => builder.body(bytes.clone()),
        };

        let call = async {
            let resp = builder.send().await?;
            let status = resp.status();
            let headers = resp.headers().clone();
            let body = resp.bytes().await?;
            Ok::<_, reqwest::Error>((status, headers, body))
        };

        // Dropping `call` on expiry cancels the in-flight request.
        match tokio::time::timeout(descriptor.timeout, call).await {
            Ok(Ok((status, headers, body))) => Ok(self.normalizer.response(status, &headers, &body)),
            Ok(Err(err)) => {
                warn!(request = %descriptor, error = %err, "request.transport_error");
                Err(self.normalizer.transport_error(&err))
            }
            Err(_) => {
                warn!(
                    request = %descriptor,
                    timeout_ms = u64::try_from(descriptor.timeout.as_millis()).unwrap_or(u64::MAX),
                    "request.timeout"
                );
                Err(self.normalizer.timeout(descriptor.timeout))
            }
        }
    }
}
