//! Router assembly and shared application state.
use crate::api::{transaction, wellknown};
use crate::auth::keystore::{self, SigningKeyMaterial};
use crate::auth::proof::VerifierConfig;
use crate::config::EotaConfig;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use eota_mdq::MdqClient;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub mdq: MdqClient,
    pub signing_key: Arc<SigningKeyMaterial>,
    pub audience: String,
    pub token_ttl: Duration,
    pub verifier: VerifierConfig,
}

/// Load the keystore and build the shared state from configuration.
pub fn build_state(config: &EotaConfig) -> Result<AppState> {
    let signing_key = keystore::load_or_generate(&config.keystore_path)
        .with_context(|| format!("load keystore {}", config.keystore_path.display()))?;
    if config.insecure_test_mode {
        tracing::warn!("insecure test mode enabled; test proofs will be accepted");
    }
    Ok(AppState {
        mdq: MdqClient::new(&config.mdq_url, config.mdq_timeout)
            .with_context(|| "build mdq client")?,
        signing_key: Arc::new(signing_key),
        audience: config.audience.clone(),
        token_ttl: config.token_ttl,
        verifier: VerifierConfig {
            insecure_test_mode: config.insecure_test_mode,
        },
    })
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/transaction", post(transaction::exchange))
        .route("/.well-known/jwks.json", get(wellknown::jwks_json))
        .route("/.well-known/jwk.json", get(wellknown::jwk_json))
        .route("/.well-known/public.pem", get(wellknown::public_pem))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<axum::body::Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .with_state(state)
}
