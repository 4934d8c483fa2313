//! Data Transfer Objects for API requests and responses.
//!
//! Field names are capitalized on the wire to match stored records.

pub mod short;
