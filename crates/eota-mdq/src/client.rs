//! MDQ metadata client.
//!
//! # Purpose
//! Resolve an entity identifier against an MDQ metadata service: derive
//! the deterministic lookup key, perform a single GET, enforce the MDQ
//! content type, and parse the response into [`EntityMetadata`].
//!
//! # Key invariants
//! - Exactly one outbound request per [`MdqClient::resolve`] call; no
//!   retries and no caching, so a revoked entity is unauthorized on the
//!   very next transaction.
//! - The request is bounded by the configured timeout; a stalled
//!   registry fails the transaction instead of hanging it.
//! - A registry 404 is a distinct, expected failure (`NotFound`);
//!   everything else unexpected surfaces as a transport error.
use crate::metadata::{EntityMetadata, MetadataError, parse_entity_metadata};
use sha1::{Digest, Sha1};
use std::time::Duration;

const MDQ_CONTENT_TYPE: &str = "application/samlmetadata+xml";

/// Derive the MDQ lookup key for an entity identifier.
///
/// # Overview
/// The registry is queried by digest rather than raw identifier: the key
/// is the lowercase hex SHA-1 of the identifier, prefixed with a fixed
/// `{sha1}` tag naming the hash scheme. The mapping is pure and
/// deterministic, so the same entity always resolves to the same
/// document.
pub fn lookup_key(entity_id: &str) -> String {
    let digest = Sha1::digest(entity_id.as_bytes());
    format!("{{sha1}}{}", hex::encode(digest))
}

/// Errors raised while resolving entity metadata.
#[derive(Debug, thiserror::Error)]
pub enum MdqError {
    /// The registry does not know the entity.
    #[error("entity not found in metadata registry")]
    NotFound,
    /// The registry answered with something other than SAML metadata.
    #[error("registry returned unexpected content type: {0:?}")]
    WrongContentType(Option<String>),
    /// The response body failed metadata or certificate parsing.
    #[error(transparent)]
    Malformed(#[from] MetadataError),
    /// Transport-level failure, distinct from a clean not-found.
    #[error("metadata fetch failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Client for one MDQ metadata service.
///
/// # Overview
/// Wraps a `reqwest` client pinned to a base URL and a request timeout.
/// Cloning is cheap and shares the underlying connection pool, so one
/// client serves all concurrent transactions.
#[derive(Debug, Clone)]
pub struct MdqClient {
    client: reqwest::Client,
    base_url: String,
}

impl MdqClient {
    /// Build a client for the registry at `base_url`.
    ///
    /// # Errors
    /// - `MdqError::Http` if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, MdqError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve an entity's published credentials.
    ///
    /// # Overview
    /// Performs the single MDQ GET for this transaction and parses the
    /// response. Callers decide how failures map onto protocol denials;
    /// this method only classifies them.
    ///
    /// # Errors
    /// - `MdqError::NotFound` when the registry reports 404.
    /// - `MdqError::WrongContentType` when the response is not SAML
    ///   metadata.
    /// - `MdqError::Malformed` when the document or an embedded
    ///   certificate fails to parse.
    /// - `MdqError::Http` for transport faults and non-404 error
    ///   statuses.
    pub async fn resolve(&self, entity_id: &str) -> Result<EntityMetadata, MdqError> {
        // Step 1: Query by digest so the raw identifier never appears in
        // the request path.
        let url = format!("{}/{}.xml", self.base_url, lookup_key(entity_id));
        tracing::debug!(entity_id, %url, "resolving entity metadata");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, MDQ_CONTENT_TYPE)
            .send()
            .await?;

        // Step 2: Classify the status before touching the body. A 404 is
        // the registry's well-defined "unknown entity" answer; any other
        // error status is unexpected.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MdqError::NotFound);
        }
        let response = response.error_for_status()?;

        // Step 3: Enforce the MDQ content type, tolerating parameters
        // such as charset.
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let is_metadata = content_type
            .as_deref()
            .is_some_and(|value| value.starts_with(MDQ_CONTENT_TYPE));
        if !is_metadata {
            return Err(MdqError::WrongContentType(content_type));
        }

        // Step 4: Parse; all-or-nothing per the metadata invariants.
        let body = response.text().await?;
        Ok(parse_entity_metadata(entity_id, &body)?)
    }
}
