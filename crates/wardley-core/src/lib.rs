//! Wardley Core Types and Definitions
//!
//! This crate provides the foundational types for Wardley maps. It includes:
//!
//! - **Semantic**: name-keyed components and edges produced by parsing map
//!   text ([`semantic`] module)
//! - **Records**: persisted nodes and edges with opaque identities, the shape
//!   consumed by text generation ([`record`] module)

pub mod record;
pub mod semantic;
