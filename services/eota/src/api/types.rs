//! Wire types for the transaction endpoint.
//!
//! Request fields are all optional so shape problems surface as typed
//! 400s from the handler instead of deserialization rejections with
//! opaque bodies.
use serde::{Deserialize, Serialize};

/// Body of `POST /transaction`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransactionRequest {
    pub keys: Option<KeyClaim>,
    pub resources: Option<ResourceScope>,
}

/// The entity and proof method the client claims.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KeyClaim {
    /// Entity identifier registered in the federation.
    pub kid: Option<String>,
    /// Proof method name: `mtls`, `httpsign`, or `test`.
    pub proof: Option<String>,
}

/// Resources the client is asking access for.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResourceScope {
    pub origins: Option<Vec<String>>,
}

/// Success body of `POST /transaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub access_token: AccessToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "type")]
    pub token_type: String,
    pub value: String,
}

impl TransactionResponse {
    pub fn bearer(value: String) -> Self {
        Self {
            access_token: AccessToken {
                token_type: "bearer".to_string(),
                value,
            },
        }
    }
}

/// Failure body shared by every error status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub status: u16,
}
