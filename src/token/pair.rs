use serde::{Deserialize, Serialize};

/// Access/refresh credentials issued on login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(alias = "access_token", alias = "accessToken")]
    pub access: String,
    #[serde(alias = "refresh_token", alias = "refreshToken")]
    pub refresh: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Body of a successful refresh; `refresh` is present only when the server rotates it.
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    #[serde(alias = "access_token", alias = "accessToken")]
    pub access: String,
    #[serde(default, alias = "refresh_token", alias = "refreshToken")]
    pub refresh: Option<String>,
}
