//! JWT-related error types

use thiserror::Error;

/// Errors that can occur during JWT operations
#[derive(Error, Debug)]
pub enum JwtError {
    /// JWT encoding failed
    #[error("Failed to encode JWT token")]
    EncodingError(#[source] jsonwebtoken::errors::Error),

    /// Signature, issuer, expiry or structure check failed
    #[error("Invalid or expired token")]
    ValidationError(#[source] jsonwebtoken::errors::Error),

    /// Token verified but carries no usable subject
    #[error("Token subject is empty")]
    EmptySubject,
}
