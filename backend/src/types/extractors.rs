//! Custom extractors

use std::convert::Infallible;

use aide::OperationIo;
use axum::{
    extract::FromRequestParts,
    http::{header::CONTENT_LENGTH, request::Parts},
};

/// Declared `Content-Length` of the request, `None` if absent or malformed
///
/// Read from the headers only, so it is available before any of the body is consumed.
#[derive(Debug, Clone, Copy, OperationIo)]
pub struct ContentLength(pub Option<u64>);

impl<S> FromRequestParts<S> for ContentLength
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let length = parts
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok());

        Ok(Self(length))
    }
}
