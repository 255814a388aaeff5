mod claims;
mod manager;
mod pair;
mod policy;
mod store;

pub use claims::access_token_expiry;
pub use manager::{AuthTokenManager, RefreshOutcome, SessionEvent, TokenManagerConfig};
pub use pair::TokenPair;
pub(crate) use pair::{RefreshRequest, RefreshResponse};
pub use policy::RefreshPolicy;
pub use store::{ACCESS_TOKEN_KEYS, REFRESH_TOKEN_KEYS, TokenStore};
