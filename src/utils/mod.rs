//! Small helpers shared across layers.
//!
//! - [`hash`] - FNV-1a 64-bit user id derivation
//! - [`validation`] - alias rules and long URL normalization

pub mod hash;
pub mod validation;
