//! Tubely backend service
//!
//! Accepts thumbnail and video uploads for existing video records, promotes them to
//! durable storage and points the record at the stored asset.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]
#![warn(missing_docs)]

/// Access token verification
pub mod jwt;

/// Request middleware
pub mod middleware;

/// HTTP routes
pub mod routes;

/// Server setup
pub mod server;

/// Shared types (configuration, errors, extractors)
pub mod types;

/// Asset upload pipeline
pub mod upload;
