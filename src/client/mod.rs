use std::sync::Arc;
use std::time::Duration;

use crate::executor::RequestExecutor;
use crate::retry::RetryCoordinator;

mod impls;

/// Authenticated client for the platform's REST backend.
///
/// Cheap to clone; clones share the token manager, so refreshes are coordinated
/// across all of them.
#[derive(Clone)]
pub struct ApiClient {
    executor: RequestExecutor,
    retry: Arc<RetryCoordinator>,
    default_timeout: Duration,
    login_path: String,
}
