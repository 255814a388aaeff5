use std::sync::{Arc, Mutex};
use std::time::Duration;

use liveclass_api::storage::{KeyValueStore, MemoryStore};
use liveclass_api::token::{RefreshPolicy, TokenManagerConfig, TokenStore};
use liveclass_api::{ApiClient, AuthTokenManager, Config};
use tracing::subscriber::{DefaultGuard, set_default};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Registry, fmt};
use wiremock::MockServer;

pub const REFRESH_PATH: &str = "/auth/token/refresh/";

pub fn test_config(server: &MockServer) -> Config {
    Config::new(server.uri())
        .with_retry(3, Duration::from_millis(10))
        .with_timeout(Duration::from_secs(5))
}

/// Token manager over an inspectable in-memory backend.
pub fn manager(server: &MockServer, cooldown: Duration) -> (AuthTokenManager, Arc<MemoryStore>) {
    let backend = Arc::new(MemoryStore::new());
    let manager = AuthTokenManager::new(
        TokenStore::new(backend.clone()),
        reqwest::Client::new(),
        TokenManagerConfig {
            refresh_url: format!("{}{}", server.uri(), REFRESH_PATH),
            policy: RefreshPolicy::new(cooldown, Duration::from_secs(30)),
            timeout: Duration::from_secs(5),
            session_expired_notice: "Your session has expired. Please sign in again.".into(),
        },
    );
    (manager, backend)
}

pub fn client(server: &MockServer) -> (ApiClient, Arc<MemoryStore>) {
    let (tokens, backend) = manager(server, Duration::from_secs(5));
    let client =
        ApiClient::with_token_manager(&test_config(server), reqwest::Client::new(), tokens)
            .expect("valid config");
    (client, backend)
}

pub fn raw(backend: &MemoryStore, key: &str) -> Option<String> {
    backend.get(key).expect("memory store read")
}

struct VecWriter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl std::io::Write for VecWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.lines.lock().unwrap();
        guard.push(String::from_utf8_lossy(buf).into_owned());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn capture_logs() -> (Arc<Mutex<Vec<String>>>, DefaultGuard) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let writer_lines = lines.clone();
    let subscriber = Registry::default().with(
        fmt::Layer::default()
            .with_writer(move || VecWriter {
                lines: writer_lines.clone(),
            })
            .with_target(false)
            .with_level(true)
            .with_ansi(false),
    );
    let guard = set_default(subscriber);
    (lines, guard)
}
