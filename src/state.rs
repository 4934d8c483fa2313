//! Shared state injected into every handler.

use std::sync::Arc;

use crate::application::services::ShortService;
use crate::domain::repositories::Backend;
use crate::health::HealthRegistry;

#[derive(Clone)]
pub struct AppState {
    pub shorts: Arc<ShortService<dyn Backend>>,
    pub health: Arc<HealthRegistry>,
}

impl AppState {
    pub fn new(shorts: Arc<ShortService<dyn Backend>>, health: Arc<HealthRegistry>) -> Self {
        Self { shorts, health }
    }
}
