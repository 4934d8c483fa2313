//! Business logic services for the application layer.

pub mod short_service;
pub mod user_service;

pub use short_service::{CachedUrl, ShortService};
pub use user_service::UserService;
