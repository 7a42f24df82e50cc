//! Proof-of-possession verification.
//!
//! # Purpose
//! Decide whether a requester actually controls a credential the
//! federation has published for the claimed entity. The proof method is
//! named by the client in the transaction body; the evidence arrives out
//! of band (the TLS-terminating proxy forwards the peer certificate).
//!
//! # Key invariants
//! - A well-formed proof that fails verification is a clean `Ok(false)`,
//!   not an error. Errors are reserved for methods this deployment
//!   cannot evaluate at all.
//! - `httpsign` is always refused with a distinct error so operators can
//!   tell "not yet supported" apart from "bad proof" in the logs.
//! - `test` short-circuits verification and is only honored when the
//!   deployment explicitly opted in; production configs never set that
//!   flag.
//!
//! # Security
//! - Verification compares SHA-1 fingerprints of the presented leaf
//!   certificate against every federation-published credential for the
//!   entity, regardless of the metadata `use` attribute.
use eota_mdq::{Certificate, EntityMetadata};

/// Errors for proofs that cannot be evaluated.
///
/// A failed-but-evaluable proof is not an error; see [`verify_proof`].
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("unsupported proof method: {0}")]
    Unsupported(String),
    #[error("proof method {0} is not implemented")]
    NotImplemented(&'static str),
}

/// Proof methods a client may name in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofMethod {
    /// Possession of the TLS client certificate used on this connection.
    Mtls,
    /// HTTP message signatures. Recognized but not yet implemented.
    HttpSign,
    /// Unconditional accept for integration testing only.
    Test,
}

impl ProofMethod {
    /// Parse the method name from the transaction body.
    ///
    /// # Errors
    /// - `ProofError::Unsupported` for any name outside the known set.
    pub fn parse(name: &str) -> Result<Self, ProofError> {
        match name {
            "mtls" => Ok(Self::Mtls),
            "httpsign" => Ok(Self::HttpSign),
            "test" => Ok(Self::Test),
            other => Err(ProofError::Unsupported(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mtls => "mtls",
            Self::HttpSign => "httpsign",
            Self::Test => "test",
        }
    }
}

/// Evidence extracted from the transport for proof evaluation.
#[derive(Debug, Clone)]
pub enum ProofMaterial {
    /// Leaf certificate the TLS proxy saw on the client connection.
    PeerCertificate(Certificate),
    /// Signed-request evidence; carried for `httpsign` once implemented.
    SignedRequest,
    /// No transport evidence accompanied the request.
    Absent,
}

/// Deployment-level verification policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifierConfig {
    /// Honor the `test` proof method. Never set in production.
    pub insecure_test_mode: bool,
}

/// Evaluate a proof against the entity's federation-published credentials.
///
/// # Overview
/// - `mtls`: the peer certificate's SHA-1 fingerprint must match one of
///   the entity's published certificates. A missing peer certificate is
///   a failed proof, not an error.
/// - `httpsign`: always `ProofError::NotImplemented`.
/// - `test`: succeeds unconditionally, but only when
///   [`VerifierConfig::insecure_test_mode`] is set; otherwise it is
///   treated as unsupported.
///
/// # Returns
/// `Ok(true)` when possession is proven, `Ok(false)` when the proof was
/// evaluated and failed.
///
/// # Errors
/// - `ProofError::NotImplemented` for `httpsign`.
/// - `ProofError::Unsupported` for `test` without the insecure flag.
pub fn verify_proof(
    method: ProofMethod,
    material: &ProofMaterial,
    metadata: &EntityMetadata,
    config: &VerifierConfig,
) -> Result<bool, ProofError> {
    match method {
        ProofMethod::Mtls => match material {
            ProofMaterial::PeerCertificate(cert) => {
                Ok(metadata.matches_fingerprint(cert.fingerprint()))
            }
            _ => Ok(false),
        },
        ProofMethod::HttpSign => Err(ProofError::NotImplemented("httpsign")),
        ProofMethod::Test => {
            if config.insecure_test_mode {
                tracing::warn!(
                    entity_id = %metadata.entity_id,
                    "accepting test proof in insecure test mode"
                );
                Ok(true)
            } else {
                Err(ProofError::Unsupported("test".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eota_mdq::{CredentialUsage, KeyDescriptor};

    fn certificate() -> Certificate {
        let rcgen::CertifiedKey { cert, signing_key: _ } =
            rcgen::generate_simple_self_signed(vec!["proof.example".to_string()])
                .expect("generate certificate");
        Certificate::from_der(cert.der().to_vec()).expect("parse certificate")
    }

    fn metadata_with(cert: &Certificate) -> EntityMetadata {
        EntityMetadata {
            entity_id: "https://idp.example".to_string(),
            credentials: vec![KeyDescriptor {
                usage: Some(CredentialUsage::Signing),
                certificate: cert.clone(),
            }],
        }
    }

    #[test]
    fn parses_known_methods() {
        assert_eq!(ProofMethod::parse("mtls").expect("mtls"), ProofMethod::Mtls);
        assert_eq!(
            ProofMethod::parse("httpsign").expect("httpsign"),
            ProofMethod::HttpSign
        );
        assert_eq!(ProofMethod::parse("test").expect("test"), ProofMethod::Test);
        assert!(matches!(
            ProofMethod::parse("dpop"),
            Err(ProofError::Unsupported(_))
        ));
    }

    #[test]
    fn mtls_accepts_published_certificate() {
        let cert = certificate();
        let metadata = metadata_with(&cert);
        let verified = verify_proof(
            ProofMethod::Mtls,
            &ProofMaterial::PeerCertificate(cert),
            &metadata,
            &VerifierConfig::default(),
        )
        .expect("verify");
        assert!(verified);
    }

    #[test]
    fn mtls_rejects_unpublished_certificate() {
        let published = certificate();
        let presented = certificate();
        let metadata = metadata_with(&published);
        let verified = verify_proof(
            ProofMethod::Mtls,
            &ProofMaterial::PeerCertificate(presented),
            &metadata,
            &VerifierConfig::default(),
        )
        .expect("verify");
        assert!(!verified);
    }

    #[test]
    fn mtls_without_peer_certificate_fails_cleanly() {
        let cert = certificate();
        let metadata = metadata_with(&cert);
        let verified = verify_proof(
            ProofMethod::Mtls,
            &ProofMaterial::Absent,
            &metadata,
            &VerifierConfig::default(),
        )
        .expect("verify");
        assert!(!verified);
    }

    #[test]
    fn httpsign_is_distinctly_unimplemented() {
        let cert = certificate();
        let metadata = metadata_with(&cert);
        assert!(matches!(
            verify_proof(
                ProofMethod::HttpSign,
                &ProofMaterial::SignedRequest,
                &metadata,
                &VerifierConfig::default(),
            ),
            Err(ProofError::NotImplemented("httpsign"))
        ));
    }

    #[test]
    fn test_method_requires_insecure_flag() {
        let cert = certificate();
        let metadata = metadata_with(&cert);
        assert!(matches!(
            verify_proof(
                ProofMethod::Test,
                &ProofMaterial::Absent,
                &metadata,
                &VerifierConfig::default(),
            ),
            Err(ProofError::Unsupported(_))
        ));

        let verified = verify_proof(
            ProofMethod::Test,
            &ProofMaterial::Absent,
            &metadata,
            &VerifierConfig {
                insecure_test_mode: true,
            },
        )
        .expect("verify");
        assert!(verified);
    }
}
