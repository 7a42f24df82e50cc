use axum::Router;
use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use eota_mdq::{CredentialUsage, MdqClient, MdqError, lookup_key};
use std::net::SocketAddr;
use std::time::Duration;

const ENTITY_ID: &str = "https://idp1.example.org/idp";

fn metadata_document(cert_b64: &str) -> String {
    format!(
        r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata"
            xmlns:ds="http://www.w3.org/2000/09/xmldsig#"
            entityID="{ENTITY_ID}">
          <md:IDPSSODescriptor>
            <md:KeyDescriptor use="signing">
              <ds:KeyInfo><ds:X509Data>
                <ds:X509Certificate>{cert_b64}</ds:X509Certificate>
              </ds:X509Data></ds:KeyInfo>
            </md:KeyDescriptor>
          </md:IDPSSODescriptor>
        </md:EntityDescriptor>"#
    )
}

fn self_signed_cert_b64() -> String {
    let rcgen::CertifiedKey {
        cert,
        signing_key: _,
    } = rcgen::generate_simple_self_signed(vec!["idp1.example.org".to_string()]).expect("cert");
    STANDARD.encode(cert.der())
}

async fn spawn_mdq_server(
    expected_document: String,
    response: MdqStubResponse,
) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new().route(
        "/:document",
        get(move |Path(document): Path<String>| {
            let expected = expected_document.clone();
            let response = response.clone();
            async move {
                if document != expected {
                    return (StatusCode::NOT_FOUND, "unknown entity").into_response();
                }
                match response {
                    MdqStubResponse::Metadata(body) => (
                        [(header::CONTENT_TYPE, "application/samlmetadata+xml")],
                        body,
                    )
                        .into_response(),
                    MdqStubResponse::WrongContentType(body) => {
                        ([(header::CONTENT_TYPE, "text/html")], body).into_response()
                    }
                }
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service()).await;
    });
    (addr, handle)
}

#[derive(Clone)]
enum MdqStubResponse {
    Metadata(String),
    WrongContentType(String),
}

fn expected_document() -> String {
    format!("{}.xml", lookup_key(ENTITY_ID))
}

#[tokio::test]
async fn resolve_returns_parsed_credentials() {
    let cert = self_signed_cert_b64();
    let (addr, _server) = spawn_mdq_server(
        expected_document(),
        MdqStubResponse::Metadata(metadata_document(&cert)),
    )
    .await;

    let client = MdqClient::new(&format!("http://{addr}"), Duration::from_secs(5)).expect("client");
    let metadata = client.resolve(ENTITY_ID).await.expect("resolve");
    assert_eq!(metadata.entity_id, ENTITY_ID);
    assert_eq!(metadata.credentials.len(), 1);
    assert_eq!(
        metadata.credentials[0].usage,
        Some(CredentialUsage::Signing)
    );
}

#[tokio::test]
async fn resolve_unknown_entity_is_not_found() {
    let cert = self_signed_cert_b64();
    let (addr, _server) = spawn_mdq_server(
        expected_document(),
        MdqStubResponse::Metadata(metadata_document(&cert)),
    )
    .await;

    let client = MdqClient::new(&format!("http://{addr}"), Duration::from_secs(5)).expect("client");
    let err = client
        .resolve("https://unknown.example.org/idp")
        .await
        .expect_err("unknown entity");
    assert!(matches!(err, MdqError::NotFound));
}

#[tokio::test]
async fn resolve_rejects_wrong_content_type() {
    let (addr, _server) = spawn_mdq_server(
        expected_document(),
        MdqStubResponse::WrongContentType("<html>not metadata</html>".to_string()),
    )
    .await;

    let client = MdqClient::new(&format!("http://{addr}"), Duration::from_secs(5)).expect("client");
    let err = client.resolve(ENTITY_ID).await.expect_err("content type");
    match err {
        MdqError::WrongContentType(Some(value)) => assert!(value.starts_with("text/html")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn resolve_rejects_malformed_metadata() {
    let (addr, _server) = spawn_mdq_server(
        expected_document(),
        MdqStubResponse::Metadata("<broken".to_string()),
    )
    .await;

    let client = MdqClient::new(&format!("http://{addr}"), Duration::from_secs(5)).expect("client");
    let err = client.resolve(ENTITY_ID).await.expect_err("malformed");
    assert!(matches!(err, MdqError::Malformed(_)));
}

#[tokio::test]
async fn resolve_fails_fast_when_registry_unreachable() {
    // Port 1 on localhost refuses connections immediately.
    let client = MdqClient::new("http://127.0.0.1:1", Duration::from_secs(1)).expect("client");
    let err = client.resolve(ENTITY_ID).await.expect_err("unreachable");
    assert!(matches!(err, MdqError::Http(_)));
}
