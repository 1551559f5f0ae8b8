//! Request authentication from an `Authorization: Bearer <token>` header.

use chrono::{DateTime, Utc};

use crate::error::CoreError;

use super::{SessionClaims, TokenConfig, TokenError, validate_token};

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, TokenError> {
    let header = header.ok_or_else(|| TokenError::InvalidFormat("missing bearer token".to_string()))?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| TokenError::InvalidFormat("expected 'Bearer <token>'".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(TokenError::InvalidFormat(format!(
            "unsupported authorization scheme '{scheme}'"
        )));
    }
    Ok(token.trim())
}

/// Validate the `Authorization` header and return the caller's claims.
///
/// Every failure becomes [`CoreError::Authentication`].
pub fn authenticate(
    config: &TokenConfig,
    authorization: Option<&str>,
    now: DateTime<Utc>,
) -> Result<SessionClaims, CoreError> {
    let token = bearer_token(authorization)?;
    Ok(validate_token(config, token, now)?)
}

impl From<TokenError> for CoreError {
    fn from(err: TokenError) -> Self {
        CoreError::authentication(err.to_string())
    }
}
