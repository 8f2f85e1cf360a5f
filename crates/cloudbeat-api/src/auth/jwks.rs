//! RS256/ES256 verification against a published JWKS (JSON Web Key Set).
//!
//! Keys are fetched on demand and cached per `kid` for a fixed TTL, so key
//! rotation on the identity provider is picked up without a restart.

use crate::auth::models::JwtClaims;
use crate::auth::verifier::{map_jwt_error, subject_of, TokenVerifier, INVALID_TOKEN};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cloudbeat_core::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const DEFAULT_CACHE_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    #[serde(rename = "kty")]
    pub key_type: String,
    #[serde(rename = "kid")]
    pub key_id: Option<String>,
    #[serde(rename = "n")]
    pub modulus: Option<String>, // RSA
    #[serde(rename = "e")]
    pub exponent: Option<String>, // RSA
    #[serde(rename = "x")]
    pub x_coordinate: Option<String>, // EC
    #[serde(rename = "y")]
    pub y_coordinate: Option<String>, // EC
    #[serde(rename = "crv")]
    pub curve: Option<String>,
}

#[derive(Clone)]
struct CachedKey {
    key_type: String,
    key: DecodingKey,
    expires_at: DateTime<Utc>,
}

/// JWK `kty` a signing algorithm needs.
fn key_type_for(alg: Algorithm) -> &'static str {
    match alg {
        Algorithm::ES256 | Algorithm::ES384 => "EC",
        _ => "RSA",
    }
}

fn rejected(reason: impl std::fmt::Display) -> AppError {
    tracing::debug!(reason = %reason, "JWKS verification failed");
    AppError::Unauthenticated(INVALID_TOKEN.to_string())
}

pub struct JwksVerifier {
    http: reqwest::Client,
    jwks_url: String,
    cache: Arc<RwLock<HashMap<String, CachedKey>>>,
    cache_ttl_seconds: i64,
    algorithms: Vec<Algorithm>,
}

impl JwksVerifier {
    pub fn new(http: reqwest::Client, jwks_url: String, cache_ttl_seconds: Option<i64>) -> Self {
        Self {
            http,
            jwks_url,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl_seconds: cache_ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS),
            algorithms: vec![Algorithm::RS256, Algorithm::ES256],
        }
    }

    async fn fetch_jwks(&self) -> Result<Jwks, AppError> {
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| rejected(format!("Failed to fetch JWKS: {}", e)))?;

        if !response.status().is_success() {
            return Err(rejected(format!(
                "JWKS endpoint returned error: {}",
                response.status()
            )));
        }

        response
            .json::<Jwks>()
            .await
            .map_err(|e| rejected(format!("Failed to parse JWKS: {}", e)))
    }

    fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AppError> {
        match jwk.key_type.as_str() {
            "RSA" => {
                let n = jwk
                    .modulus
                    .as_ref()
                    .ok_or_else(|| rejected("RSA key missing modulus"))?;
                let e = jwk
                    .exponent
                    .as_ref()
                    .ok_or_else(|| rejected("RSA key missing exponent"))?;
                DecodingKey::from_rsa_components(n, e).map_err(rejected)
            }
            "EC" => {
                let x = jwk
                    .x_coordinate
                    .as_ref()
                    .ok_or_else(|| rejected("EC key missing x coordinate"))?;
                let y = jwk
                    .y_coordinate
                    .as_ref()
                    .ok_or_else(|| rejected("EC key missing y coordinate"))?;
                if jwk.curve.as_deref() != Some("P-256") {
                    return Err(rejected(format!("Unsupported EC curve: {:?}", jwk.curve)));
                }
                DecodingKey::from_ec_components(x, y).map_err(rejected)
            }
            other => Err(rejected(format!("Unsupported key type: {}", other))),
        }
    }

    async fn get_decoding_key(
        &self,
        kid: Option<&str>,
    ) -> Result<(String, DecodingKey), AppError> {
        let cache_key = kid.unwrap_or("default").to_string();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&cache_key) {
                if cached.expires_at > Utc::now() {
                    return Ok((cached.key_type.clone(), cached.key.clone()));
                }
            }
        }

        let jwks = self.fetch_jwks().await?;
        let jwk = match kid {
            Some(kid) => jwks
                .keys
                .iter()
                .find(|k| k.key_id.as_deref() == Some(kid))
                .ok_or_else(|| rejected(format!("Key ID {} not found in JWKS", kid)))?,
            None => jwks
                .keys
                .first()
                .ok_or_else(|| rejected("No keys found in JWKS"))?,
        };
        let decoding_key = Self::jwk_to_decoding_key(jwk)?;

        self.cache.write().await.insert(
            cache_key,
            CachedKey {
                key_type: jwk.key_type.clone(),
                key: decoding_key.clone(),
                expires_at: Utc::now() + chrono::Duration::seconds(self.cache_ttl_seconds),
            },
        );

        Ok((jwk.key_type.clone(), decoding_key))
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn subject(&self, token: &str) -> Result<String, AppError> {
        let header = jsonwebtoken::decode_header(token).map_err(map_jwt_error)?;
        if !self.algorithms.contains(&header.alg) {
            return Err(rejected(format!("Unsupported algorithm: {:?}", header.alg)));
        }

        let (key_type, decoding_key) = self.get_decoding_key(header.kid.as_deref()).await?;
        if key_type != key_type_for(header.alg) {
            return Err(rejected(format!(
                "{:?} token signed for a {} key",
                header.alg, key_type
            )));
        }

        // Only the header's algorithm; jsonwebtoken checks every listed one against the key.
        let mut validation = Validation::new(header.alg);
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = 0;

        let data = decode::<JwtClaims>(token, &decoding_key, &validation).map_err(map_jwt_error)?;
        subject_of(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    #[tokio::test]
    async fn test_hs256_token_rejected_before_fetch() {
        let verifier = JwksVerifier::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/jwks.json".to_string(),
            None,
        );
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &serde_json::json!({"sub": "u"}),
            &jsonwebtoken::EncodingKey::from_secret(b"s"),
        )
        .unwrap();

        let err = verifier.subject(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(ref m) if m == INVALID_TOKEN));
    }

    #[tokio::test]
    async fn test_unreachable_jwks_is_invalid_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/jwks.json")
            .with_status(503)
            .create_async()
            .await;

        let verifier = JwksVerifier::new(
            reqwest::Client::new(),
            format!("{}/jwks.json", server.url()),
            None,
        );
        let mut header = jsonwebtoken::Header::new(Algorithm::RS256);
        header.kid = Some("k1".to_string());
        // Signature bytes are irrelevant; key lookup fails first.
        let token = format!(
            "{}.{}.c2ln",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap()),
            URL_SAFE_NO_PAD.encode(br#"{"sub":"u"}"#)
        );

        let err = verifier.subject(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(ref m) if m == INVALID_TOKEN));
        mock.assert_async().await;
    }

    const TEST_RSA_PEM: &str = include_str!("testdata/jwks_rsa.pem");
    const TEST_RSA_MODULUS: &str = "uU6EwdoXUjwMmbbPxydF7wf-Ezclfi8jPCNPeToUWIKc0w468R_DjcY_KDQgsAgBFojJ_a7U41pPBE3NrQO2l6ps3YSzWfSsHYYQOVj-jdEfXuwASWVAgLcyK6jkp2z5455yUMU6EXhpyQnN06FETkfVkI30lgoVodofz8x8M2AwHDZy1X98t2DPMSSKOwziDowF38KPNDDHHKrNd8bQrsU34K0YUzbW1XK6m8NVVjHL1BFywSETMhZdrYX1bEWoyNDz_4lTxsmXhUm3dCKeBjgULTdds-erjJopYfVpxeevKCHXaVkLayP40lC61TFjWe_6qGsC_V2DlqzzLsJnkw";

    fn rs256_token(kid: &str, claims: serde_json::Value) -> String {
        let mut header = jsonwebtoken::Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let key = jsonwebtoken::EncodingKey::from_rsa_pem(TEST_RSA_PEM.as_bytes()).unwrap();
        jsonwebtoken::encode(&header, &claims, &key).unwrap()
    }

    async fn serve_rsa_jwks(server: &mut mockito::Server, kty: &str) -> mockito::Mock {
        let body = serde_json::json!({
            "keys": [{
                "kty": kty,
                "kid": "k1",
                "alg": "RS256",
                "use": "sig",
                "n": TEST_RSA_MODULUS,
                "e": "AQAB",
                "x": "x",
                "y": "y",
                "crv": "P-256",
            }]
        });
        server
            .mock("GET", "/jwks.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_rs256_token_verified_against_published_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = serve_rsa_jwks(&mut server, "RSA").await;
        let verifier = JwksVerifier::new(
            reqwest::Client::new(),
            format!("{}/jwks.json", server.url()),
            None,
        );

        let exp = Utc::now().timestamp() + 600;
        let token = rs256_token("k1", serde_json::json!({"sub": "u1", "exp": exp}));
        assert_eq!(verifier.subject(&token).await.unwrap(), "u1");

        // Second call is served from the cache.
        let again = rs256_token("k1", serde_json::json!({"sub": "u2", "exp": exp}));
        assert_eq!(verifier.subject(&again).await.unwrap(), "u2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_rs256_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = serve_rsa_jwks(&mut server, "RSA").await;
        let verifier = JwksVerifier::new(
            reqwest::Client::new(),
            format!("{}/jwks.json", server.url()),
            None,
        );

        let token = rs256_token(
            "k1",
            serde_json::json!({"sub": "u1", "exp": Utc::now().timestamp() - 60}),
        );
        let err = verifier.subject(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(ref m) if m == "Token expired"));
    }

    #[tokio::test]
    async fn test_algorithm_must_match_key_type() {
        let mut server = mockito::Server::new_async().await;
        let _mock = serve_rsa_jwks(&mut server, "EC").await;
        let verifier = JwksVerifier::new(
            reqwest::Client::new(),
            format!("{}/jwks.json", server.url()),
            None,
        );

        let token = rs256_token(
            "k1",
            serde_json::json!({"sub": "u1", "exp": Utc::now().timestamp() + 600}),
        );
        // The EC entry carries junk coordinates; either the key build or the
        // family check rejects it, never a successful decode.
        assert!(verifier.subject(&token).await.is_err());
        assert_eq!(key_type_for(Algorithm::ES256), "EC");
        assert_eq!(key_type_for(Algorithm::RS256), "RSA");
    }

    #[test]
    fn test_unsupported_curve() {
        let jwk = Jwk {
            key_type: "EC".to_string(),
            key_id: None,
            modulus: None,
            exponent: None,
            x_coordinate: Some("x".to_string()),
            y_coordinate: Some("y".to_string()),
            curve: Some("P-521".to_string()),
        };
        assert!(JwksVerifier::jwk_to_decoding_key(&jwk).is_err());
    }
}
