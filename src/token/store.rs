use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::errors::Error;
use crate::storage::KeyValueStore;

use super::TokenPair;

/// Keys holding the access token, in read priority order. All are written together.
pub const ACCESS_TOKEN_KEYS: [&str; 4] = ["access_token", "accessToken", "authToken", "token"];
/// Keys holding the refresh token, in read priority order. All are written together.
pub const REFRESH_TOKEN_KEYS: [&str; 2] = ["refresh_token", "refreshToken"];

/// Token persistence across the legacy key aliases.
///
/// Storage failures are logged and swallowed: reads yield `None` and writes are
/// dropped, so an unavailable backend degrades to an anonymous session.
///
/// Every write bumps a session generation held under the same lock. Writers that
/// raced a logout or a new login compare it and drop their result.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    generation: Arc<RwLock<u64>>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            generation: Arc::new(RwLock::new(0)),
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        let _guard = self.generation.read().await;
        self.read_first(&ACCESS_TOKEN_KEYS).await
    }

    pub async fn refresh_token(&self) -> Option<String> {
        let _guard = self.generation.read().await;
        self.read_first(&REFRESH_TOKEN_KEYS).await
    }

    /// Both tokens read under one guard, so a concurrent write is seen entirely or not at all.
    pub async fn token_pair(&self) -> Option<TokenPair> {
        let _guard = self.generation.read().await;
        let access = self.read_first(&ACCESS_TOKEN_KEYS).await?;
        let refresh = self.read_first(&REFRESH_TOKEN_KEYS).await?;
        Some(TokenPair { access, refresh })
    }

    pub async fn generation(&self) -> u64 {
        *self.generation.read().await
    }

    /// The refresh token together with the generation it belongs to.
    pub(crate) async fn refresh_token_with_generation(&self) -> Option<(String, u64)> {
        let guard = self.generation.read().await;
        let refresh = self.read_first(&REFRESH_TOKEN_KEYS).await?;
        Some((refresh, *guard))
    }

    pub async fn set_token_pair(&self, pair: &TokenPair) {
        let mut guard = self.generation.write().await;
        *guard += 1;
        self.write(pair_entries(&pair.access, Some(&pair.refresh))).await;
    }

    /// Replaces the access token under every alias, leaving the refresh token untouched.
    pub async fn set_access_token(&self, access: &str) {
        let mut guard = self.generation.write().await;
        *guard += 1;
        self.write(pair_entries(access, None)).await;
    }

    /// Stores a refreshed access token, plus the rotated refresh token when there is one,
    /// only if no other write happened since `expected` was read.
    /// Returns the new generation, or `None` when the result was dropped.
    pub(crate) async fn store_refreshed(
        &self,
        expected: u64,
        access: &str,
        rotated: Option<&str>,
    ) -> Option<u64> {
        let mut guard = self.generation.write().await;
        if *guard != expected {
            return None;
        }
        *guard += 1;
        self.write(pair_entries(access, rotated)).await;
        Some(*guard)
    }

    pub async fn clear(&self) {
        let mut guard = self.generation.write().await;
        *guard += 1;
        self.remove_all().await;
    }

    /// Clears the tokens only if they are still the generation `expected`.
    pub(crate) async fn clear_if_current(&self, expected: u64) -> bool {
        let mut guard = self.generation.write().await;
        if *guard != expected {
            return false;
        }
        *guard += 1;
        self.remove_all().await;
        true
    }

    /// Runs a backend call on the blocking pool; file-backed stores do synchronous I/O.
    async fn on_backend<T, F>(&self, op: F) -> Result<T, Error>
    where
        F: FnOnce(&dyn KeyValueStore) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || op(backend.as_ref()))
            .await
            .map_err(|err| Error::Storage(format!("storage task failed: {err}")))?
    }

    async fn write(&self, entries: Vec<(&'static str, String)>) {
        let result = self
            .on_backend(move |backend| {
                let borrowed: Vec<(&str, &str)> = entries
                    .iter()
                    .map(|(key, value)| (*key, value.as_str()))
                    .collect();
                backend.set_many(&borrowed)
            })
            .await;
        if let Err(err) = result {
            warn!(error = %err, "token_store.write_failed");
        }
    }

    async fn remove_all(&self) {
        let result = self
            .on_backend(|backend| {
                let keys: Vec<&str> = ACCESS_TOKEN_KEYS
                    .iter()
                    .chain(REFRESH_TOKEN_KEYS.iter())
                    .copied()
                    .collect();
                backend.remove_many(&keys)
            })
            .await;
        if let Err(err) = result {
            warn!(error = %err, "token_store.clear_failed");
        }
    }

    async fn read_first(&self, keys: &'static [&'static str]) -> Option<String> {
        let result = self
            .on_backend(move |backend| {
                for key in keys {
                    match backend.get(key) {
                        Ok(Some(value)) if !value.is_empty() => return Ok(Some(value)),
                        Ok(_) => continue,
                        Err(err) => {
                            return Err(Error::Storage(format!("reading '{key}': {err}")));
                        }
                    }
                }
                Ok(None)
            })
            .await;
        match result {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "token_store.read_failed");
                None
            }
        }
    }
}

/// Access token under every access alias, plus the refresh token under every refresh alias.
fn pair_entries(access: &str, refresh: Option<&str>) -> Vec<(&'static str, String)> {
    let mut entries: Vec<(&'static str, String)> = ACCESS_TOKEN_KEYS
        .iter()
        .map(|key| (*key, access.to_string()))
        .collect();
    if let Some(refresh) = refresh {
        entries.extend(REFRESH_TOKEN_KEYS.iter().map(|key| (*key, refresh.to_string())));
    }
    entries
}
