#![allow(dead_code)]
//! Shared fixtures: an in-process MDQ registry stub, metadata documents,
//! and router/state builders.
use axum::body::Body;
use axum::extract::Path;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use eota::app::AppState;
use eota::auth::keystore::SigningKeyMaterial;
use eota::auth::proof::VerifierConfig;
use eota_mdq::{MdqClient, lookup_key};
use std::sync::Arc;
use std::time::Duration;

pub const ENTITY_ID: &str = "https://idp.example.org/shibboleth";
pub const AUDIENCE: &str = "https://rp.example";

pub async fn read_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn read_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

/// SAML metadata document publishing the given base64 DER certificates.
pub fn metadata_xml(entity_id: &str, certs_b64: &[String]) -> String {
    let descriptors: String = certs_b64
        .iter()
        .map(|b64| {
            format!(
                "<md:KeyDescriptor use=\"signing\"><ds:KeyInfo><ds:X509Data>\
                 <ds:X509Certificate>{b64}</ds:X509Certificate>\
                 </ds:X509Data></ds:KeyInfo></md:KeyDescriptor>"
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\"?>\
         <md:EntityDescriptor \
         xmlns:md=\"urn:oasis:names:tc:SAML:2.0:metadata\" \
         xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\" \
         entityID=\"{entity_id}\">\
         <md:IDPSSODescriptor protocolSupportEnumeration=\
         \"urn:oasis:names:tc:SAML:2.0:protocol\">{descriptors}\
         </md:IDPSSODescriptor></md:EntityDescriptor>"
    )
}

/// Spawn an MDQ stub that answers one document and 404s everything else.
pub async fn spawn_mdq(
    document: String,
    status: StatusCode,
    content_type: String,
    body: String,
) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mdq stub");
    let addr = listener.local_addr().expect("stub addr");
    let app = axum::Router::new().route(
        "/:document",
        axum::routing::get(move |Path(requested): Path<String>| {
            let document = document.clone();
            let content_type = content_type.clone();
            let body = body.clone();
            async move {
                if requested != document {
                    return StatusCode::NOT_FOUND.into_response();
                }
                (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
            }
        }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service()).await;
    });
    format!("http://{addr}")
}

/// Stub serving well-formed metadata for [`ENTITY_ID`].
pub async fn spawn_mdq_for_entity(entity_id: &str, xml: String) -> String {
    spawn_mdq(
        format!("{}.xml", lookup_key(entity_id)),
        StatusCode::OK,
        "application/samlmetadata+xml".to_string(),
        xml,
    )
    .await
}

pub fn app_state(mdq_url: &str, insecure_test_mode: bool) -> AppState {
    AppState {
        mdq: MdqClient::new(mdq_url, Duration::from_secs(2)).expect("mdq client"),
        signing_key: Arc::new(SigningKeyMaterial::generate()),
        audience: AUDIENCE.to_string(),
        token_ttl: Duration::from_secs(600),
        verifier: VerifierConfig { insecure_test_mode },
    }
}

/// Build a `POST /transaction` request, optionally forwarding a peer
/// certificate the way a TLS-terminating proxy would.
pub fn transaction_request(
    body: &serde_json::Value,
    client_cert_pem: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/transaction")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(pem) = client_cert_pem {
        builder = builder.header("ssl-client-cert", pem.replace('\n', " "));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn default_body(proof: &str) -> serde_json::Value {
    serde_json::json!({
        "keys": { "kid": ENTITY_ID, "proof": proof },
        "resources": { "origins": ["https://app.example.org"] }
    })
}
