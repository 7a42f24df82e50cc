//! HTTP surface: the transaction endpoint and well-known documents.
pub mod error;
pub mod transaction;
pub mod types;
pub mod wellknown;
