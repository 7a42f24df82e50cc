//! Well-known key discovery endpoints.
//!
//! Relying parties fetch the verification key here in whichever shape
//! their stack prefers: a JWKS, a bare JWK, or SPKI PEM.
use crate::api::error::ApiError;
use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

/// `GET /.well-known/jwks.json`
pub async fn jwks_json(State(state): State<AppState>) -> Response {
    Json(state.signing_key.public_jwks()).into_response()
}

/// `GET /.well-known/jwk.json`
pub async fn jwk_json(State(state): State<AppState>) -> Response {
    Json(state.signing_key.public_jwk()).into_response()
}

/// `GET /.well-known/public.pem`
pub async fn public_pem(State(state): State<AppState>) -> Response {
    match state.signing_key.public_pem() {
        Ok(pem) => (
            [(header::CONTENT_TYPE, "application/x-pem-file")],
            pem,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to render public key pem");
            ApiError::internal("public key unavailable").into_response()
        }
    }
}
