use jiff::Timestamp;
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;

#[derive(Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

/// Reads the `exp` claim of a JWT access token without verifying its signature.
///
/// Only the server can verify the token; the client uses the claim purely to
/// avoid sending a token it already knows is stale. Opaque tokens yield `None`.
pub fn access_token_expiry(token: &str) -> Option<Timestamp> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data =
        jsonwebtoken::decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()?;
    Timestamp::from_second(data.claims.exp?).ok()
}
