//! Backend storage services for Tubely
//!
//! This crate provides the video record store consumed by the asset upload pipeline.

pub mod video;

#[cfg(any(test, feature = "test-utils"))]
mod memory;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemoryVideoStorage;
