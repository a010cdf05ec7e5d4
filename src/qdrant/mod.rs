//! Qdrant REST client.
//!
//! Fetches raw hits for the aggregator. Nothing here affects how hits are
//! grouped or rendered.

pub mod client;
pub mod error;

pub use client::{QdrantClient, QdrantClientConfig};
