//! Application layer services.
//!
//! Services consume repository traits and give HTTP handlers and the admin
//! CLI one place to go through for validation and caching.
//!
//! # Available Services
//!
//! - [`services::ShortService`] - read-through cache in front of the short store
//! - [`services::UserService`] - user creation and lookup

pub mod services;
