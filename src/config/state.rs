// Application state module
// Process-wide state shared by every connection

use super::types::Config;
use crate::handler::CarHandler;
use crate::store::CarStore;

/// Application state
pub struct AppState {
    pub config: Config,

    /// Owns the record store; the only mutable state requests touch
    pub cars: CarHandler,
}

impl AppState {
    /// Create `AppState` with the store seeded with the startup records
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            cars: CarHandler::new(CarStore::with_seed(), config.http.max_body_size),
        }
    }
}
