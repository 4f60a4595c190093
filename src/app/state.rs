//! Application state shared across tasks

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use crate::config::Config;
use crate::game::World;
use crate::net::broadcast::Broadcaster;

/// Write-only counters observed by the stats task. They never feed back
/// into simulation decisions.
#[derive(Default)]
pub struct Metrics {
    /// Commands decoded and applied
    pub commands: AtomicU64,
    /// Messages dropped as malformed
    pub malformed: AtomicU64,
    /// Messages dropped over the rate budget
    pub rate_limited: AtomicU64,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub world: Arc<World>,
    pub broadcaster: Arc<Broadcaster>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let world = Arc::new(World::new(config.clone()));
        let broadcaster = Arc::new(Broadcaster::new());

        Self {
            config,
            world,
            broadcaster,
            metrics: Arc::new(Metrics::default()),
        }
    }
}
