//! The token-exchange transaction endpoint.
//!
//! # Overview
//! `POST /transaction` walks the full exchange: validate the request
//! shape, resolve the claimed entity's published credentials from the
//! MDQ registry, evaluate the named proof against the transport
//! evidence, and mint a bearer token scoped to the requested origins.
//!
//! # Key invariants
//! - Shape problems are 400s with a specific message; they never reach
//!   the registry.
//! - Every denial is the same 401 body regardless of which step failed.
//!   Unknown entity, stale metadata, wrong certificate, and unsupported
//!   proof methods are indistinguishable to the caller; the cause is
//!   logged server-side.
//! - Registry transport failures and minting failures are 500s, not
//!   denials: the caller did nothing wrong.
use crate::api::error::ApiError;
use crate::api::types::{TransactionRequest, TransactionResponse};
use crate::app::AppState;
use crate::auth::proof::{ProofError, ProofMaterial, ProofMethod, verify_proof};
use crate::auth::token::mint_access_token;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use eota_mdq::{Certificate, MdqError};

/// Header the TLS-terminating proxy uses to forward the peer certificate.
const CLIENT_CERT_HEADER: &str = "ssl-client-cert";

fn deny(entity_id: &str, reason: &'static str) -> ApiError {
    metrics::counter!("eota_transactions_total", "outcome" => "denied").increment(1);
    tracing::info!(entity_id, reason, "transaction denied");
    ApiError::denied(entity_id)
}

fn bad_request(message: &'static str) -> ApiError {
    metrics::counter!("eota_transactions_total", "outcome" => "bad_request").increment(1);
    ApiError::bad_request(message)
}

/// Extract the forwarded peer certificate, if any.
///
/// Proxies differ in how they encode the value: some forward the PEM
/// with its newlines collapsed to spaces, others send bare base64 DER.
/// An unparseable value is treated as no certificate; the mtls proof
/// then fails verification rather than erroring.
fn peer_certificate(headers: &HeaderMap) -> Option<Certificate> {
    let value = headers.get(CLIENT_CERT_HEADER)?;
    let raw = match value.to_str() {
        Ok(raw) => raw,
        Err(_) => {
            tracing::warn!("client certificate header is not valid ascii");
            return None;
        }
    };
    let parsed = if raw.contains("BEGIN CERTIFICATE") {
        Certificate::from_pem(raw)
    } else {
        Certificate::from_base64(raw)
    };
    match parsed {
        Ok(cert) => Some(cert),
        Err(err) => {
            tracing::warn!(error = %err, "unparseable client certificate header");
            None
        }
    }
}

/// `POST /transaction`
pub async fn exchange(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, ApiError> {
    // Step 1: The body must be JSON of the right shape, with the entity
    // identifier and proof method both present. Origins are optional; an
    // omitted scope means a token good for no origins, which is still a
    // valid exchange.
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejecting malformed transaction body");
        bad_request("malformed transaction body")
    })?;
    let keys = request.keys.unwrap_or_default();
    let entity_id = keys.kid.ok_or_else(|| bad_request("keys.kid is required"))?;
    let proof_name = keys
        .proof
        .ok_or_else(|| bad_request("keys.proof is required"))?;
    let origins = request
        .resources
        .and_then(|resources| resources.origins)
        .unwrap_or_default();

    // Step 2: Resolve the entity's published credentials. An entity the
    // registry does not know, or one whose published document is
    // unusable, is a denial; only transport trouble is a server fault.
    let metadata = state.mdq.resolve(&entity_id).await.map_err(|err| match err {
        MdqError::Http(source) => {
            metrics::counter!("eota_transactions_total", "outcome" => "registry_error")
                .increment(1);
            tracing::error!(entity_id, error = %source, "registry lookup failed");
            ApiError::internal("registry lookup failed")
        }
        other => {
            tracing::info!(entity_id, error = %other, "entity metadata unusable");
            deny(&entity_id, "metadata")
        }
    })?;

    // Step 3: Evaluate the proof. Method parse failures and evaluation
    // refusals both collapse into the uniform denial.
    let method = ProofMethod::parse(&proof_name).map_err(|err| {
        tracing::info!(entity_id, error = %err, "unsupported proof method");
        deny(&entity_id, "unsupported_method")
    })?;
    let material = match method {
        ProofMethod::HttpSign => ProofMaterial::SignedRequest,
        _ => match peer_certificate(&headers) {
            Some(cert) => ProofMaterial::PeerCertificate(cert),
            None => ProofMaterial::Absent,
        },
    };
    let verified = verify_proof(method, &material, &metadata, &state.verifier).map_err(|err| {
        match err {
            ProofError::NotImplemented(name) => {
                tracing::warn!(entity_id, method = name, "proof method not implemented");
                deny(&entity_id, "unimplemented_method")
            }
            ProofError::Unsupported(name) => {
                tracing::info!(entity_id, method = name, "unsupported proof method");
                deny(&entity_id, "unsupported_method")
            }
        }
    })?;
    if !verified {
        return Err(deny(&entity_id, "proof_failed"));
    }

    // Step 4: Mint the bearer token.
    let token = mint_access_token(
        &state.signing_key,
        origins.clone(),
        &state.audience,
        state.token_ttl,
    )
    .map_err(|err| {
        metrics::counter!("eota_transactions_total", "outcome" => "mint_error").increment(1);
        tracing::error!(entity_id, error = %err, "token minting failed");
        ApiError::internal("token minting failed")
    })?;

    metrics::counter!("eota_transactions_total", "outcome" => "issued").increment(1);
    tracing::info!(
        entity_id,
        method = method.as_str(),
        origins = origins.len(),
        "issued access token"
    );
    Ok(Json(TransactionResponse::bearer(token)))
}
