//! Entity metadata model and SAML metadata extraction.
//!
//! # Purpose
//! Defines the credential set resolved for a federation entity and the
//! extraction of that set from a SAML metadata document: every
//! `md:KeyDescriptor` contributes its `ds:X509Certificate` values, tagged
//! with the descriptor's `use` attribute when present.
//!
//! # Key invariants
//! - A successful parse yields at least one credential; a document with
//!   no certificates is malformed, never "valid and empty".
//! - Any certificate that fails to parse fails the whole document.
//! - Usage roles are carried but not filtered on: all published
//!   credentials are eligible for proof matching.
use crate::certificate::{Certificate, CertificateError};

const MD_NS: &str = "urn:oasis:names:tc:SAML:2.0:metadata";
const DS_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Role a federation assigned to a published credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialUsage {
    Signing,
    Encryption,
}

impl CredentialUsage {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "signing" => Some(Self::Signing),
            "encryption" => Some(Self::Encryption),
            _ => None,
        }
    }
}

/// One published credential: an optional usage role plus a certificate.
#[derive(Debug, Clone)]
pub struct KeyDescriptor {
    pub usage: Option<CredentialUsage>,
    pub certificate: Certificate,
}

/// The credential set the federation publishes for one entity.
#[derive(Debug, Clone)]
pub struct EntityMetadata {
    pub entity_id: String,
    pub credentials: Vec<KeyDescriptor>,
}

impl EntityMetadata {
    /// Whether any published credential carries the given fingerprint.
    ///
    /// First match wins; order is irrelevant because equality is exact.
    pub fn matches_fingerprint(&self, fingerprint: &crate::certificate::Fingerprint) -> bool {
        self.credentials
            .iter()
            .any(|key| key.certificate.fingerprint() == fingerprint)
    }
}

/// Errors raised while parsing a metadata document.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata is not well-formed XML: {0}")]
    Xml(String),
    #[error("metadata contains no certificates")]
    NoCredentials,
    #[error("embedded certificate failed to parse: {0}")]
    Certificate(#[from] CertificateError),
}

/// Parse a SAML metadata document into an entity's credential set.
///
/// # Overview
/// Walks every `md:KeyDescriptor` in the document and collects each
/// embedded `ds:X509Certificate`, parsing the base64 body into a
/// [`Certificate`] with its fingerprint computed.
///
/// # Errors
/// - `MetadataError::Xml` when the document is not well-formed.
/// - `MetadataError::Certificate` when any embedded certificate fails to
///   decode or parse as X.509.
/// - `MetadataError::NoCredentials` when the document parses but carries
///   no certificates at all.
pub fn parse_entity_metadata(entity_id: &str, xml: &str) -> Result<EntityMetadata, MetadataError> {
    let doc = roxmltree::Document::parse(xml).map_err(|err| MetadataError::Xml(err.to_string()))?;

    let mut credentials = Vec::new();
    for descriptor in doc
        .descendants()
        .filter(|node| node.has_tag_name((MD_NS, "KeyDescriptor")))
    {
        let usage = descriptor
            .attribute("use")
            .and_then(CredentialUsage::parse);
        for cert_node in descriptor
            .descendants()
            .filter(|node| node.has_tag_name((DS_NS, "X509Certificate")))
        {
            let body = cert_node.text().unwrap_or_default();
            let certificate = Certificate::from_base64(body)?;
            credentials.push(KeyDescriptor { usage, certificate });
        }
    }

    if credentials.is_empty() {
        return Err(MetadataError::NoCredentials);
    }

    Ok(EntityMetadata {
        entity_id: entity_id.to_string(),
        credentials,
    })
}
