use std::sync::Arc;

use reqwest::{Client, Method};
use serde::Serialize;
use tracing::info;

use crate::{
    ApiClient, Config,
    envelope::ResponseEnvelope,
    errors::Error,
    executor::RequestExecutor,
    interceptor::Interceptors,
    normalize::Normalizer,
    request::{RequestBody, RequestDescriptor, RequestOptions},
    retry::{RetryCoordinator, RetryPlan},
    token::{AuthTokenManager, TokenPair},
};

impl ApiClient {
    /// Create a client with its own token manager, built from `config`.
    /// Tokens persist to `config.token_file` when set.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let http = Client::new();
        let tokens = AuthTokenManager::from_config(config, http.clone())?;
        Self::with_token_manager(config, http, tokens)
    }

    /// Create a client around an existing token manager, e.g. one shared with
    /// other clients or pre-seeded in tests.
    pub fn with_token_manager(
        config: &Config,
        http: Client,
        tokens: AuthTokenManager,
    ) -> Result<Self, Error> {
        let base_url = config.validated_base_url()?;
        let normalizer = Normalizer::new(config.messages.clone());
        Ok(Self {
            executor: RequestExecutor::new(http, base_url, tokens, normalizer),
            retry: Arc::new(RetryCoordinator::new(RetryPlan::from_settings(&config.retry))),
            default_timeout: config.timeout(),
            login_path: config.login_path.clone(),
        })
    }

    pub fn with_interceptors(mut self, interceptors: Interceptors) -> Self {
        self.executor = self.executor.with_interceptors(interceptors);
        self
    }

    pub fn tokens(&self) -> &AuthTokenManager {
        self.executor.tokens()
    }

    pub fn retry_plan(&self) -> RetryPlan {
        self.retry.plan()
    }

    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> Result<ResponseEnvelope, Error> {
        self.request(Method::GET, endpoint, RequestBody::Empty, options)
            .await
    }

    pub async fn post(
        &self,
        endpoint: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope, Error> {
        self.request(Method::POST, endpoint, body, options).await
    }

    pub async fn put(
        &self,
        endpoint: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope, Error> {
        self.request(Method::PUT, endpoint, body, options).await
    }

    pub async fn patch(
        &self,
        endpoint: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope, Error> {
        self.request(Method::PATCH, endpoint, body, options).await
    }

    pub async fn delete(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope, Error> {
        self.request(Method::DELETE, endpoint, RequestBody::Empty, options)
            .await
    }

    /// Sends a request through the retry wrapper. Network failures, timeouts and
    /// 5xx responses are retried; everything else is returned on the first attempt.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope, Error> {
        let descriptor =
            RequestDescriptor::new(method, endpoint, body, options, self.default_timeout);
        let label = descriptor.to_string();
        let (envelope, _outcome) = self
            .retry
            .execute(&label, |_attempt| self.executor.execute(descriptor.clone()))
            .await?;
        Ok(envelope)
    }

    /// Exchanges credentials for a token pair and stores it.
    pub async fn login<C: Serialize + ?Sized>(&self, credentials: &C) -> Result<TokenPair, Error> {
        let body = RequestBody::json(credentials)?;
        let envelope = self
            .post(&self.login_path, body, RequestOptions::default().no_auth())
            .await?;
        let pair: TokenPair = envelope.json()?;
        self.tokens().set_tokens(&pair).await;
        info!("session.login");
        Ok(pair)
    }

    pub async fn logout(&self) {
        self.tokens().logout().await;
    }
}
