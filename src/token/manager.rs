use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use jiff::Timestamp;
use reqwest::{Client, StatusCode};
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::Error;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::telemetry::refresh::RefreshTelemetry;

use super::{RefreshPolicy, RefreshRequest, RefreshResponse, TokenPair, TokenStore, access_token_expiry};

/// How a refresh request was resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The network refresh succeeded and the store holds a new access token.
    Refreshed,
    /// A refresh succeeded within the cooldown window; treated as already handled.
    CoolingDown,
    /// No refresh token is stored, so there is nothing to refresh.
    MissingCredentials,
    /// Network failure, timeout, 5xx or an unusable body. Tokens are kept.
    Transient,
    /// The server rejected the refresh token. Tokens were cleared.
    SessionExpired,
    /// A logout or a new login replaced the session while the refresh was in flight;
    /// its result was dropped.
    Superseded,
}

impl RefreshOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, RefreshOutcome::Refreshed | RefreshOutcome::CoolingDown)
    }
}

/// Session lifecycle notifications for whoever drives the login flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The refresh token was rejected; the user must sign in again.
    Expired { notice: String },
    LoggedOut,
}

/// Inputs required to build an `AuthTokenManager`.
#[derive(Clone, Debug)]
pub struct TokenManagerConfig {
    pub refresh_url: String,
    pub policy: RefreshPolicy,
    pub timeout: Duration,
    pub session_expired_notice: String,
}

type RefreshFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Owns the token store and coordinates refreshes.
///
/// Clones share state: at most one network refresh runs at a time across all of them,
/// and every caller that arrives while it runs receives its outcome.
#[derive(Clone)]
pub struct AuthTokenManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: TokenStore,
    http: Client,
    config: TokenManagerConfig,
    in_flight: Mutex<Option<RefreshFlight>>,
    /// When the last refresh succeeded, and the store generation it produced.
    last_success: RwLock<Option<(Instant, u64)>>,
    pending_notice: Mutex<Option<String>>,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthTokenManager {
    pub fn new(store: TokenStore, http: Client, config: TokenManagerConfig) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(Inner {
                store,
                http,
                config,
                in_flight: Mutex::new(None),
                last_success: RwLock::new(None),
                pending_notice: Mutex::new(None),
                events,
            }),
        }
    }

    /// Builds the manager described by `config`, persisting tokens to
    /// `config.token_file` when set and keeping them in memory otherwise.
    pub fn from_config(config: &Config, http: Client) -> Result<Self, Error> {
        let base = config.validated_base_url()?;
        let backend: Arc<dyn KeyValueStore> = match config.token_file.as_ref() {
            Some(path) => Arc::new(FileStore::new(path)),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::new(
            TokenStore::new(backend),
            http,
            TokenManagerConfig {
                refresh_url: format!("{}{}", base, config.refresh_path),
                policy: RefreshPolicy::from_config(config),
                timeout: config.timeout(),
                session_expired_notice: config.messages.session_expired.clone(),
            },
        ))
    }

    pub fn store(&self) -> &TokenStore {
        &self.inner.store
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.inner.config.policy
    }

    pub async fn access_token(&self) -> Option<String> {
        self.inner.store.access_token().await
    }

    /// True when sending with the stored access token is known to fail:
    /// there is none, or it is a JWT expiring within the policy skew.
    pub async fn needs_refresh_before_send(&self) -> bool {
        match self.inner.store.access_token().await {
            None => true,
            Some(token) => match access_token_expiry(&token) {
                Some(expires_at) => self
                    .inner
                    .config
                    .policy
                    .expires_soon(expires_at, Timestamp::now()),
                None => false,
            },
        }
    }

    pub async fn set_tokens(&self, pair: &TokenPair) {
        self.inner.store.set_token_pair(pair).await;
    }

    pub async fn logout(&self) {
        self.inner.store.clear().await;
        *self.inner.last_success.write().await = None;
        info!("session.logout");
        let _ = self.inner.events.send(SessionEvent::LoggedOut);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Returns the queued "session expired" notice once, clearing it.
    pub async fn take_session_notice(&self) -> Option<String> {
        self.inner.pending_notice.lock().await.take()
    }

    /// Refreshes the access token, reporting whether a usable token is now stored.
    pub async fn refresh(&self) -> bool {
        self.refresh_outcome().await.succeeded()
    }

    pub async fn refresh_outcome(&self) -> RefreshOutcome {
        let flight = {
            let mut slot = self.inner.in_flight.lock().await;
            match slot.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let generation = self.inner.store.generation().await;
                    let last_success = (*self.inner.last_success.read().await)
                        .filter(|(_, produced)| *produced == generation)
                        .map(|(at, _)| at);
                    if self
                        .inner
                        .config
                        .policy
                        .within_cooldown(last_success, Instant::now())
                    {
                        debug!("refresh.cooldown");
                        return RefreshOutcome::CoolingDown;
                    }
                    let inner = Arc::clone(&self.inner);
                    let flight = async move { inner.perform_refresh().await }
                        .boxed()
                        .shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };

        let outcome = flight.clone().await;

        let mut slot = self.inner.in_flight.lock().await;
        if slot
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&flight))
        {
            *slot = None;
        }
        outcome
    }
}

impl Inner {
    async fn perform_refresh(&self) -> RefreshOutcome {
        let Some((refresh, generation)) = self.store.refresh_token_with_generation().await else {
            debug!("refresh.skipped: no refresh token stored");
            return RefreshOutcome::MissingCredentials;
        };

        let telemetry = RefreshTelemetry::new("token.refresh");
        telemetry.emit_start(SystemTime::now());

        let call = async {
            let resp = self
                .http
                .post(&self.config.refresh_url)
                .json(&RefreshRequest { refresh: &refresh })
                .send()
                .await?;
            let status = resp.status();
            let body = resp.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match tokio::time::timeout(self.config.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                let outcome = RefreshOutcome::Transient;
                telemetry.emit_failure(&outcome, &err, SystemTime::now());
                return outcome;
            }
            Err(_) => {
                let outcome = RefreshOutcome::Transient;
                telemetry.emit_failure(&outcome, &"timed out", SystemTime::now());
                return outcome;
            }
        };

        if status.is_success() {
            return match serde_json::from_slice::<RefreshResponse>(&body) {
                Ok(tokens) if !tokens.access.is_empty() => {
                    let rotated = tokens.refresh.as_deref().filter(|r| !r.is_empty());
                    let Some(stored) = self
                        .store
                        .store_refreshed(generation, &tokens.access, rotated)
                        .await
                    else {
                        let outcome = RefreshOutcome::Superseded;
                        telemetry.emit_failure(&outcome, &"session replaced", SystemTime::now());
                        return outcome;
                    };
                    *self.last_success.write().await = Some((Instant::now(), stored));
                    telemetry.emit_success(rotated.is_some(), SystemTime::now());
                    RefreshOutcome::Refreshed
                }
                Ok(_) => {
                    let outcome = RefreshOutcome::Transient;
                    telemetry.emit_failure(&outcome, &"empty access token", SystemTime::now());
                    outcome
                }
                Err(err) => {
                    let outcome = RefreshOutcome::Transient;
                    telemetry.emit_failure(&outcome, &err, SystemTime::now());
                    outcome
                }
            };
        }

        if refresh_token_rejected(status) {
            if !self.store.clear_if_current(generation).await {
                let outcome = RefreshOutcome::Superseded;
                telemetry.emit_failure(&outcome, &status, SystemTime::now());
                return outcome;
            }
            let outcome = RefreshOutcome::SessionExpired;
            telemetry.emit_failure(&outcome, &status, SystemTime::now());
            self.expire_session().await;
            return outcome;
        }

        let outcome = RefreshOutcome::Transient;
        telemetry.emit_failure(&outcome, &status, SystemTime::now());
        outcome
    }

    /// Runs after the tokens were cleared.
    async fn expire_session(&self) {
        *self.last_success.write().await = None;
        let notice = self.config.session_expired_notice.clone();
        *self.pending_notice.lock().await = Some(notice.clone());
        info!("session.expired");
        let _ = self.events.send(SessionEvent::Expired { notice });
    }
}

/// Statuses meaning the refresh token itself is invalid or expired, not a transient fault.
fn refresh_token_rejected(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    )
}
