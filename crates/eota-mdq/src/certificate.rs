//! X.509 certificate parsing and fingerprinting.
//!
//! # Purpose
//! Turn the certificate blobs embedded in federation metadata (and the
//! peer certificates supplied by the transport) into a single value type
//! whose fingerprint supports byte-exact equality comparison.
//!
//! # Key invariants
//! - A `Certificate` always holds DER that parsed as a well-formed X.509
//!   certificate; construction fails otherwise.
//! - The fingerprint is the SHA-1 digest of the DER encoding, matching
//!   what federation tooling publishes and what TLS stacks report.
//! - Fingerprint equality is byte-exact; no case folding or truncation.
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};
use std::fmt;

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

/// SHA-1 digest of a certificate's DER encoding.
///
/// # Overview
/// Used as the sole equality key when matching a presented peer
/// certificate against federation-published credentials. The digest is
/// stable for the life of a certificate and safe to log.
///
/// # Security
/// - Comparison is byte-exact over the full 20-byte digest.
/// - SHA-1 is used for identification, not integrity: the registry is
///   trusted, and the match only succeeds against credentials it
///   published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 20]);

impl Fingerprint {
    /// Compute the fingerprint of a DER-encoded certificate.
    pub fn of_der(der: &[u8]) -> Self {
        Self(Sha1::digest(der).into())
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Errors raised while constructing a [`Certificate`].
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("missing PEM certificate armor")]
    MissingArmor,
    #[error("invalid base64 in certificate body: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid X.509 DER: {0}")]
    Der(String),
}

/// A parsed X.509 certificate with a precomputed fingerprint.
///
/// # Overview
/// Wraps the validated DER bytes together with their SHA-1 fingerprint.
/// The certificate contents beyond the encoding are deliberately not
/// exposed: the exchange protocol compares fingerprints, nothing else.
///
/// # Errors
/// All constructors reject input whose DER does not parse as a complete
/// X.509 certificate, so downstream code never handles half-valid blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    fingerprint: Fingerprint,
}

impl Certificate {
    /// Build a certificate from raw DER bytes.
    ///
    /// # Errors
    /// - `CertificateError::Der` if the bytes are not exactly one
    ///   well-formed X.509 certificate.
    pub fn from_der(der: Vec<u8>) -> Result<Self, CertificateError> {
        // Step 1: Insist the DER parses as a complete certificate.
        // Trailing bytes mean the blob is not a single certificate and
        // would make the fingerprint ambiguous.
        let (rest, _cert) = x509_parser::parse_x509_certificate(&der)
            .map_err(|err| CertificateError::Der(err.to_string()))?;
        if !rest.is_empty() {
            return Err(CertificateError::Der(format!(
                "{} trailing bytes after certificate",
                rest.len()
            )));
        }
        // Step 2: Fingerprint the exact DER bytes, not a re-encoding.
        let fingerprint = Fingerprint::of_der(&der);
        Ok(Self { der, fingerprint })
    }

    /// Build a certificate from a base64 body, tolerating embedded
    /// whitespace the way XML text content and header transport mangle it.
    pub fn from_base64(body: &str) -> Result<Self, CertificateError> {
        let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
        let der = STANDARD.decode(compact.as_bytes())?;
        Self::from_der(der)
    }

    /// Build a certificate from PEM armor.
    ///
    /// # Overview
    /// Parsing is lenient about whitespace inside the armor because
    /// reverse proxies forward client certificates in headers with the
    /// newlines collapsed to spaces.
    ///
    /// # Errors
    /// - `CertificateError::MissingArmor` when the BEGIN/END markers are
    ///   absent or out of order.
    /// - Base64/DER errors from the armored body.
    pub fn from_pem(pem: &str) -> Result<Self, CertificateError> {
        let start = pem.find(PEM_BEGIN).ok_or(CertificateError::MissingArmor)?;
        let body_start = start + PEM_BEGIN.len();
        let end = pem[body_start..]
            .find(PEM_END)
            .ok_or(CertificateError::MissingArmor)?;
        Self::from_base64(&pem[body_start..body_start + end])
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}
