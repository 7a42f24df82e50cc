//! Service signing-key lifecycle.
//!
//! # Purpose
//! Load the process-wide Ed25519 signing key from the keystore file, or
//! generate and persist a fresh one on first start, and project its
//! public half as JWK, JWKS, and PEM for relying parties.
//!
//! # Architectural role
//! This module is the single source of truth for the key that signs
//! every issued access token. It runs once at startup; after that the
//! key material is shared read-only across all transactions.
//!
//! # Key invariants
//! - The key is always Ed25519; tokens are always EdDSA.
//! - The private key is a raw 32-byte seed stored base64url in the
//!   keystore file; the public key is derived from the seed and checked
//!   against the stored value on load, so corrupted keystores fail
//!   startup instead of minting unverifiable tokens.
//! - A malformed keystore file is an error, never a silent regenerate:
//!   regenerating would invalidate every outstanding token.
//!
//! # Security boundary
//! Private key material never leaves this module except as an opaque
//! `jsonwebtoken::EncodingKey`. The JWK/JWKS/PEM projections carry only
//! the public component.
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{SigningKey as Ed25519SigningKey, VerifyingKey};
use jsonwebtoken::EncodingKey;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::Path;

const ED25519_KEY_LEN: usize = 32;

/// Errors raised by keystore loading, generation, or key projection.
#[derive(Debug, thiserror::Error)]
pub enum KeystoreError {
    #[error("keystore io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed keystore: {0}")]
    Malformed(String),
    #[error("key error: {0}")]
    Key(String),
}

/// The process-wide signing key.
///
/// # Overview
/// Holds the Ed25519 seed, the derived public key, and a random `kid`
/// that relying parties use to select the right JWK. Constructed once at
/// startup via [`load_or_generate`] and shared behind an `Arc`
/// afterwards; nothing mutates it during request handling.
///
/// # Security
/// - The seed is private; accessors expose only the public key, the
///   `kid`, and an opaque encoding key for signing.
#[derive(Debug, Clone)]
pub struct SigningKeyMaterial {
    kid: String,
    seed: [u8; ED25519_KEY_LEN],
    public: [u8; ED25519_KEY_LEN],
}

/// Public JWK projection of the signing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicJwk {
    pub kty: String,
    pub crv: String,
    pub kid: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub use_field: String,
    pub x: String,
}

/// Public JWKS projection, a single-entry key set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicJwks {
    pub keys: Vec<PublicJwk>,
}

/// Serialized keystore file: a private JWKS with `OKP`/`Ed25519` keys.
#[derive(Debug, Serialize, Deserialize)]
struct StoredKeystore {
    keys: Vec<StoredKey>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredKey {
    kty: String,
    crv: String,
    kid: String,
    alg: String,
    #[serde(rename = "use")]
    use_field: String,
    d: String,
    x: String,
}

impl SigningKeyMaterial {
    /// Generate a fresh Ed25519 key with a random `kid`.
    pub fn generate() -> Self {
        // The seed is raw entropy; the public key is derived so the pair
        // can never disagree. The `kid` is not a secret.
        let mut seed = [0u8; ED25519_KEY_LEN];
        rand::thread_rng().fill_bytes(&mut seed);
        let mut kid_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut kid_bytes);
        Self::from_seed(hex::encode(kid_bytes), seed)
    }

    fn from_seed(kid: String, seed: [u8; ED25519_KEY_LEN]) -> Self {
        let public = Ed25519SigningKey::from_bytes(&seed).verifying_key().to_bytes();
        Self { kid, seed, public }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn public_key_bytes(&self) -> &[u8; ED25519_KEY_LEN] {
        &self.public
    }

    /// Build the `jsonwebtoken` encoding key for EdDSA signing.
    ///
    /// # Errors
    /// - `KeystoreError::Key` if PKCS8 encoding of the seed fails.
    pub fn encoding_key(&self) -> Result<EncodingKey, KeystoreError> {
        // jsonwebtoken expects PKCS8 DER for EdDSA keys; the keystore
        // stores the compact raw seed instead.
        let signing_key = Ed25519SigningKey::from_bytes(&self.seed);
        let der = signing_key
            .to_pkcs8_der()
            .map_err(|err| KeystoreError::Key(format!("encode Ed25519 key: {err}")))?;
        Ok(EncodingKey::from_ed_der(der.as_bytes()))
    }

    /// Public JWK for `/.well-known/jwk.json` and JWKS assembly.
    pub fn public_jwk(&self) -> PublicJwk {
        PublicJwk {
            kty: "OKP".to_string(),
            crv: "Ed25519".to_string(),
            kid: self.kid.clone(),
            alg: "EdDSA".to_string(),
            use_field: "sig".to_string(),
            x: URL_SAFE_NO_PAD.encode(self.public),
        }
    }

    /// Public JWKS for `/.well-known/jwks.json`.
    pub fn public_jwks(&self) -> PublicJwks {
        PublicJwks {
            keys: vec![self.public_jwk()],
        }
    }

    /// SPKI PEM of the public key for `/.well-known/public.pem`.
    ///
    /// # Errors
    /// - `KeystoreError::Key` if the stored public bytes are not a valid
    ///   Ed25519 point or PEM encoding fails.
    pub fn public_pem(&self) -> Result<String, KeystoreError> {
        let verifying_key = VerifyingKey::from_bytes(&self.public)
            .map_err(|err| KeystoreError::Key(format!("invalid public key: {err}")))?;
        verifying_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|err| KeystoreError::Key(format!("encode public pem: {err}")))
    }

    fn to_stored(&self) -> StoredKeystore {
        StoredKeystore {
            keys: vec![StoredKey {
                kty: "OKP".to_string(),
                crv: "Ed25519".to_string(),
                kid: self.kid.clone(),
                alg: "EdDSA".to_string(),
                use_field: "sig".to_string(),
                d: URL_SAFE_NO_PAD.encode(self.seed),
                x: URL_SAFE_NO_PAD.encode(self.public),
            }],
        }
    }
}

/// Load the signing key from `path`, or generate and persist one.
///
/// # Overview
/// Mirrors the keystore lifecycle relying parties depend on: an existing
/// file is parsed as a private JWKS and validated; a missing file causes
/// a fresh key to be generated and written back so restarts keep the
/// same key.
///
/// # Errors
/// - `KeystoreError::Io` for filesystem failures.
/// - `KeystoreError::Malformed` when the file is not a usable private
///   JWKS (wrong JSON shape, empty key list, wrong key type, bad
///   base64, wrong seed length).
/// - `KeystoreError::Key` when the stored public key does not match the
///   stored seed.
pub fn load_or_generate(path: &Path) -> Result<SigningKeyMaterial, KeystoreError> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        return parse_stored(&contents);
    }

    let material = SigningKeyMaterial::generate();
    let serialized = serde_json::to_string_pretty(&material.to_stored())
        .map_err(|err| KeystoreError::Key(format!("serialize keystore: {err}")))?;
    std::fs::write(path, serialized)?;
    tracing::info!(kid = material.kid(), path = %path.display(), "generated new signing key");
    Ok(material)
}

fn parse_stored(contents: &str) -> Result<SigningKeyMaterial, KeystoreError> {
    // Step 1: The file must be a JWKS with at least one key; the first
    // key is the active signing key.
    let stored: StoredKeystore = serde_json::from_str(contents)
        .map_err(|err| KeystoreError::Malformed(err.to_string()))?;
    let key = stored
        .keys
        .into_iter()
        .next()
        .ok_or_else(|| KeystoreError::Malformed("keystore holds no keys".to_string()))?;

    // Step 2: Only OKP/Ed25519 keys can sign EdDSA tokens.
    if key.kty != "OKP" || key.crv != "Ed25519" {
        return Err(KeystoreError::Malformed(format!(
            "unsupported key type {}/{}",
            key.kty, key.crv
        )));
    }

    // Step 3: Decode the seed and confirm the stored public key matches
    // the derived one, so storage corruption is caught at startup.
    let seed_bytes = URL_SAFE_NO_PAD
        .decode(key.d.as_bytes())
        .map_err(|err| KeystoreError::Malformed(format!("seed base64: {err}")))?;
    let seed: [u8; ED25519_KEY_LEN] = seed_bytes
        .try_into()
        .map_err(|_| KeystoreError::Malformed("seed is not 32 bytes".to_string()))?;
    let material = SigningKeyMaterial::from_seed(key.kid, seed);
    let stored_public = URL_SAFE_NO_PAD
        .decode(key.x.as_bytes())
        .map_err(|err| KeystoreError::Malformed(format!("public key base64: {err}")))?;
    if stored_public != material.public {
        return Err(KeystoreError::Key(
            "stored public key does not match private seed".to_string(),
        ));
    }
    Ok(material)
}
