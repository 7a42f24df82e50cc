//! Proof verification, token minting, and signing-key management.
pub mod keystore;
pub mod proof;
pub mod token;

pub use keystore::{KeystoreError, PublicJwk, PublicJwks, SigningKeyMaterial, load_or_generate};
pub use proof::{ProofError, ProofMaterial, ProofMethod, VerifierConfig, verify_proof};
pub use token::{AccessTokenClaims, TokenError, mint_access_token};
