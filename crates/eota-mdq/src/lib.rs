//! Federation metadata resolution for the EOTA token authority.
//!
//! # Purpose
//! Resolve an entity identifier to the signing credentials its federation
//! has published, by querying an MDQ metadata service and parsing the
//! returned SAML metadata document into X.509 certificates with stable
//! fingerprints.
//!
//! # Architectural role
//! This crate is the trust-establishment half of the token exchange: the
//! service only accepts a proof of key possession when the presented key
//! matches a credential resolved here. It performs exactly one outbound
//! HTTP request per resolution and holds no state between calls.
//!
//! # Security boundary
//! Everything returned by this crate is derived from data the federation
//! registry published. Parsing is strict: a response that is not the MDQ
//! content type, does not parse as metadata, or embeds an unparseable
//! certificate fails the whole resolution rather than yielding a partial
//! credential set.
pub mod certificate;
pub mod client;
pub mod metadata;

pub use certificate::{Certificate, CertificateError, Fingerprint};
pub use client::{MdqClient, MdqError, lookup_key};
pub use metadata::{CredentialUsage, EntityMetadata, KeyDescriptor, MetadataError};
