//! EOTA service library crate.
//!
//! # Purpose
//! Exposes the token-exchange API surface, auth helpers, configuration,
//! and observability wiring for use by the binary and tests.
//!
//! # Notes
//! Module boundaries mirror the protocol stages: `api` holds the HTTP
//! surface, `auth` the proof/token/keystore logic, `app` the router and
//! shared state.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod observability;
