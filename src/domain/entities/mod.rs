//! Core records stored by every backend.
//!
//! # Entity Types
//!
//! - [`ShortRecord`] - a short alias mapped to a long URL and its owner
//! - [`UserRecord`] - a user whose id is derived from their email
//!
//! Ownership is a by-value reference: `ShortRecord::owner` holds a
//! `UserRecord::id`, and no backend enforces that the user exists.

pub mod short;
pub mod user;

pub use short::ShortRecord;
pub use user::{UserRecord, user_id};
