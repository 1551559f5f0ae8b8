//! Session token generation and validation.
//!
//! Tokens are HMAC-SHA256 based, scoped to a user and an expiry time.
//! Format: `wp_st_<user_id>_<expires_unix>_<hmac_hex>`

pub mod guard;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Token prefix used to identify wedplan session tokens.
const TOKEN_PREFIX: &str = "wp_st_";

/// Environment variable holding the hex-encoded secret.
pub const TOKEN_SECRET_ENV: &str = "WEDPLAN_TOKEN_SECRET";

/// Default lifetime of an issued token.
pub const DEFAULT_TTL_HOURS: i64 = 24 * 7;

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    #[error("invalid user ID in token: {0}")]
    InvalidUserId(String),

    #[error("invalid expiry in token: {0}")]
    InvalidExpiry(String),

    #[error("token HMAC verification failed")]
    HmacMismatch,

    #[error("token expired")]
    Expired,

    #[error("missing token secret")]
    MissingSecret,
}

/// Configuration for token generation and validation.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// The HMAC secret key bytes.
    pub secret: Vec<u8>,
}

impl TokenConfig {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Decode a hex secret, as written by `wedplan init`.
    pub fn from_hex(secret_hex: &str) -> Result<Self, TokenError> {
        let secret = hex::decode(secret_hex.trim())
            .map_err(|e| TokenError::InvalidFormat(format!("token secret is not valid hex: {e}")))?;
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        Ok(Self::new(secret))
    }

    /// Read the secret from `WEDPLAN_TOKEN_SECRET`.
    pub fn from_env() -> Result<Self, TokenError> {
        let secret_hex = std::env::var(TOKEN_SECRET_ENV).map_err(|_| TokenError::MissingSecret)?;
        Self::from_hex(&secret_hex)
    }
}

/// Claims extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: Uuid,
    /// Unix seconds after which the token is rejected.
    pub expires_at: i64,
}

/// Generate a token for `user_id` that expires at `expires_at`.
///
/// The HMAC-SHA256 is computed over `<user_id>:<expires_unix>`.
pub fn generate_token(
    config: &TokenConfig,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<String, TokenError> {
    let expires = expires_at.timestamp();
    let mac = compute_hmac(&config.secret, signing_message(user_id, expires).as_bytes())?;
    Ok(format!("{TOKEN_PREFIX}{user_id}_{expires}_{}", hex::encode(mac)))
}

/// Generate a token valid for `ttl` from `now`.
pub fn issue_token(
    config: &TokenConfig,
    user_id: Uuid,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<String, TokenError> {
    generate_token(config, user_id, now + ttl)
}

/// Validate a token at time `now` and extract its claims.
///
/// The HMAC is checked before the expiry, so a forged token never
/// reports `Expired`.
pub fn validate_token(
    config: &TokenConfig,
    token: &str,
    now: DateTime<Utc>,
) -> Result<SessionClaims, TokenError> {
    let rest = token
        .strip_prefix(TOKEN_PREFIX)
        .ok_or_else(|| TokenError::InvalidFormat(format!("token must start with '{TOKEN_PREFIX}'")))?;

    // <user_id>_<expires>_<hmac_hex>; a UUID is 36 chars.
    if rest.len() < 36 || !rest.is_char_boundary(36) {
        return Err(TokenError::InvalidFormat(
            "token too short to contain a valid UUID".to_string(),
        ));
    }
    let (user_id_str, after_user) = rest.split_at(36);
    let user_id =
        Uuid::parse_str(user_id_str).map_err(|e| TokenError::InvalidUserId(e.to_string()))?;

    let after_underscore = after_user
        .strip_prefix('_')
        .ok_or_else(|| TokenError::InvalidFormat("expected underscore after user_id".to_string()))?;
    let (expires_str, hmac_hex) = after_underscore.split_once('_').ok_or_else(|| {
        TokenError::InvalidFormat("expected underscore between expiry and hmac".to_string())
    })?;
    let expires_at: i64 = expires_str
        .parse()
        .map_err(|e: std::num::ParseIntError| TokenError::InvalidExpiry(e.to_string()))?;

    let provided_mac = hex::decode(hmac_hex)
        .map_err(|e| TokenError::InvalidFormat(format!("invalid hex in hmac: {e}")))?;
    verify_hmac(
        &config.secret,
        signing_message(user_id, expires_at).as_bytes(),
        &provided_mac,
    )?;

    if now.timestamp() >= expires_at {
        return Err(TokenError::Expired);
    }

    Ok(SessionClaims {
        user_id,
        expires_at,
    })
}

fn signing_message(user_id: Uuid, expires_at: i64) -> String {
    format!("{user_id}:{expires_at}")
}

fn new_mac(key: &[u8]) -> Result<HmacSha256, TokenError> {
    if key.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    HmacSha256::new_from_slice(key).map_err(|_| TokenError::MissingSecret)
}

fn compute_hmac(key: &[u8], message: &[u8]) -> Result<Vec<u8>, TokenError> {
    let mut mac = new_mac(key)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time comparison through `verify_slice`.
fn verify_hmac(key: &[u8], message: &[u8], expected_mac: &[u8]) -> Result<(), TokenError> {
    let mut mac = new_mac(key)?;
    mac.update(message);
    mac.verify_slice(expected_mac)
        .map_err(|_| TokenError::HmacMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_config() -> TokenConfig {
        TokenConfig::new(b"test-secret-key-for-wedplan".to_vec())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn user() -> Uuid {
        Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap()
    }

    #[test]
    fn token_has_expected_shape() {
        let token = issue_token(&test_config(), user(), now(), Duration::hours(1)).unwrap();
        let rest = token.strip_prefix("wp_st_").unwrap();
        assert!(rest.starts_with(&user().to_string()));

        let (expires, hmac_hex) = rest[37..].split_once('_').unwrap();
        assert_eq!(expires, (now() + Duration::hours(1)).timestamp().to_string());
        assert_eq!(hmac_hex.len(), 64, "HMAC-SHA256 hex should be 64 chars");
    }

    #[test]
    fn issued_token_validates_before_expiry() {
        let config = test_config();
        let token = issue_token(&config, user(), now(), Duration::hours(1)).unwrap();
        let claims = validate_token(&config, &token, now() + Duration::minutes(59)).unwrap();
        assert_eq!(claims.user_id, user());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = test_config();
        let token = issue_token(&config, user(), now(), Duration::hours(1)).unwrap();
        let err = validate_token(&config, &token, now() + Duration::hours(1)).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn extending_expiry_breaks_hmac() {
        let config = test_config();
        let token = issue_token(&config, user(), now(), Duration::hours(1)).unwrap();
        let old = (now() + Duration::hours(1)).timestamp().to_string();
        let new = (now() + Duration::days(365)).timestamp().to_string();
        let tampered = token.replacen(&format!("_{old}_"), &format!("_{new}_"), 1);
        assert_ne!(tampered, token);

        let err = validate_token(&config, &tampered, now()).unwrap_err();
        assert!(matches!(err, TokenError::HmacMismatch));
    }

    #[test]
    fn swapped_user_is_rejected() {
        let config = test_config();
        let token = issue_token(&config, user(), now(), Duration::hours(1)).unwrap();
        let other = Uuid::parse_str("660e8400-e29b-41d4-a716-446655440000").unwrap();
        let tampered = token.replace(&user().to_string(), &other.to_string());
        assert!(validate_token(&config, &tampered, now()).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&test_config(), user(), now(), Duration::hours(1)).unwrap();
        let wrong = TokenConfig::new(b"another-secret".to_vec());
        let err = validate_token(&wrong, &token, now()).unwrap_err();
        assert!(matches!(err, TokenError::HmacMismatch));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let config = test_config();
        for bad in ["", "st_x", "wp_st_short", "wp_st_é"] {
            let err = validate_token(&config, bad, now()).unwrap_err();
            assert!(matches!(err, TokenError::InvalidFormat(_)), "{bad:?}: {err}");
        }

        let err = validate_token(&config, &format!("wp_st_{}_soon_abcd", user()), now()).unwrap_err();
        assert!(matches!(err, TokenError::InvalidExpiry(_)));

        let err = validate_token(&config, &format!("wp_st_{}_1_zz!", user()), now()).unwrap_err();
        assert!(matches!(err, TokenError::InvalidFormat(_)));
    }

    #[test]
    fn empty_secret_cannot_sign() {
        let config = TokenConfig::new(Vec::new());
        let err = issue_token(&config, user(), now(), Duration::hours(1)).unwrap_err();
        assert!(matches!(err, TokenError::MissingSecret));
    }

    #[test]
    fn from_hex_decodes_and_rejects_garbage() {
        let config = TokenConfig::from_hex("00ff10").unwrap();
        assert_eq!(config.secret, vec![0x00, 0xff, 0x10]);
        assert!(matches!(
            TokenConfig::from_hex("not hex"),
            Err(TokenError::InvalidFormat(_))
        ));
        assert!(matches!(TokenConfig::from_hex(""), Err(TokenError::MissingSecret)));
    }
}
