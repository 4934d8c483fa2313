//! HTTP request handlers.
//!
//! Each handler module corresponds to one endpoint.

pub mod create;
pub mod delete;
pub mod health;
pub mod redirect;

pub use create::create_handler;
pub use delete::delete_handler;
pub use health::health_handler;
pub use redirect::redirect_handler;
