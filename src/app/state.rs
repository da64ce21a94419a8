//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::util::rate_limit::{create_player_limiter, PlayerLimiter};
use crate::world::RoomRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rooms: Arc<RoomRegistry>,
    pub mutation_limiter: Arc<PlayerLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let rooms = Arc::new(RoomRegistry::new(&config));
        let mutation_limiter = create_player_limiter(config.mutation_rate_limit);

        Self {
            config,
            rooms,
            mutation_limiter,
        }
    }
}
