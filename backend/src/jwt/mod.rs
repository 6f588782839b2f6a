//! Access token verification (HS256).
//!
//! Tokens are issued by the Tubely auth service and carry the caller's user id in `sub`.
//! Only signature, issuer and expiry are checked here; the subject is trusted as the
//! caller identity by the upload pipeline.

pub mod error;

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use error::JwtError;

/// Issuer claim every access token must carry
pub const TOKEN_ISSUER: &str = "tubely-access";

/// Registered claims of a Tubely access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// Issuer, always [`TOKEN_ISSUER`]
    pub iss: String,
    /// User id of the caller
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// Verifies (and, for tooling and tests, issues) HS256 access tokens
#[derive(Clone)]
pub struct JwtVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Creates a verifier for the shared secret
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verifies `token` and returns the caller's user id
    ///
    /// # Errors
    /// Returns `JwtError::ValidationError` for bad signatures, wrong issuer, expired or
    /// malformed tokens, and `JwtError::EmptySubject` when `sub` is blank.
    pub fn verify(&self, token: &str) -> Result<String, JwtError> {
        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(JwtError::ValidationError)?;

        let subject = data.claims.sub.trim();
        if subject.is_empty() {
            return Err(JwtError::EmptySubject);
        }

        Ok(subject.to_string())
    }

    /// Issues a token for `user_id` that expires after `ttl`
    ///
    /// # Errors
    /// Returns `JwtError::EncodingError` if signing fails
    pub fn issue(&self, user_id: &str, ttl: Duration) -> Result<String, JwtError> {
        let now = chrono::Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = AccessClaims {
            iss: TOKEN_ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::EncodingError)
    }
}
