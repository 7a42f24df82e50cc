//! Access-token minting.
//!
//! # Purpose
//! Produce the EdDSA-signed bearer token a verified entity exchanges its
//! proof for. The claim set is deliberately small: the origins the
//! caller asked for, the audience this deployment serves, and the
//! issue/expiry instants.
//!
//! # Key invariants
//! - Tokens are always signed with the process-wide Ed25519 key and
//!   carry its `kid` in the header so relying parties can select the
//!   matching JWK.
//! - `exp` is always `iat` plus the configured lifetime; there is no
//!   per-request lifetime override.
use crate::auth::keystore::{KeystoreError, SigningKeyMaterial};
use jsonwebtoken::{Algorithm, Header};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Errors raised while minting a token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Key(#[from] KeystoreError),
}

/// Claim set of an issued access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Origins the bearer is authorized for.
    pub origins: Vec<String>,
    /// Relying party this token is scoped to.
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs().min(i64::MAX as u64) as i64)
        .unwrap_or(0)
}

/// Sign a bearer token for the given origins.
///
/// # Errors
/// - `TokenError::Key` if the signing key cannot be encoded.
/// - `TokenError::Jwt` if signing itself fails.
pub fn mint_access_token(
    key: &SigningKeyMaterial,
    origins: Vec<String>,
    audience: &str,
    lifetime: Duration,
) -> Result<String, TokenError> {
    let iat = now_epoch_seconds();
    let claims = AccessTokenClaims {
        origins,
        aud: audience.to_string(),
        iat,
        exp: iat.saturating_add(lifetime.as_secs().min(i64::MAX as u64) as i64),
    };

    let mut header = Header::new(Algorithm::EdDSA);
    header.kid = Some(key.kid().to_string());
    let token = jsonwebtoken::encode(&header, &claims, &key.encoding_key()?)?;
    Ok(token)
}
