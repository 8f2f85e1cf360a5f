pub mod jwks;
pub mod middleware;
pub mod models;
pub mod verifier;

pub use models::AuthContext;
pub use verifier::{SharedSecretVerifier, TokenVerifier, UnverifiedDecoder};
