//! HTTP middleware and extractors.
//!
//! Provides caller identity and request tracing.

pub mod identity;
pub mod tracing;

pub use identity::{OWNER_HEADER, Owner};
