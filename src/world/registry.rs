//! Registry of all live rooms
//!
//! Resolves room ids to room handles, creating rooms lazily on first
//! reference. A background sweep expires stale presence across all rooms
//! and evicts rooms that have gone idle, discarding their state entirely.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::util::rate_limit::PlayerLimiter;
use crate::util::time::unix_millis;

use super::room::Room;

pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Room>>,
    width: usize,
    height: usize,
    log_cap: usize,
    presence_ttl_ms: u64,
}

impl RoomRegistry {
    pub fn new(config: &Config) -> Self {
        Self {
            rooms: DashMap::new(),
            width: config.world_width,
            height: config.world_height,
            log_cap: config.change_log_cap,
            presence_ttl_ms: config.presence_ttl.as_millis() as u64,
        }
    }

    /// Resolve a room id, creating the room (with generated terrain) if
    /// it does not exist yet. Never fails: "room not found" is not a thing.
    pub fn get_or_create(&self, room_id: &str) -> Arc<Room> {
        if let Some(room) = self.rooms.get(room_id) {
            return room.value().clone();
        }

        let entry = self.rooms.entry(room_id.to_string()).or_insert_with(|| {
            info!(room_id = %room_id, "Creating room");
            Arc::new(Room::new(
                room_id.to_string(),
                self.width,
                self.height,
                self.log_cap,
                self.presence_ttl_ms,
            ))
        });
        entry.value().clone()
    }

    /// Look up a room without creating it
    pub fn get(&self, room_id: &str) -> Option<Arc<Room>> {
        self.rooms.get(room_id).map(|r| r.value().clone())
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_players(&self) -> usize {
        self.rooms.iter().map(|r| r.value().player_count()).sum()
    }

    /// Expire stale presence in every room
    pub fn purge_presence(&self, now_ms: u64) {
        for entry in self.rooms.iter() {
            entry.value().purge_stale_presence(now_ms);
        }
    }

    /// Evict rooms idle longer than the timeout, returning how many went
    pub fn evict_idle(&self, now_ms: u64, idle_timeout: Duration) -> usize {
        let timeout_ms = idle_timeout.as_millis() as u64;
        let idle: Vec<String> = self
            .rooms
            .iter()
            .filter(|r| r.value().is_idle(now_ms, timeout_ms))
            .map(|r| r.key().clone())
            .collect();

        let evicted = idle.len();
        for room_id in idle {
            self.rooms.remove(&room_id);
            info!(room_id = %room_id, "Evicted idle room");
        }
        evicted
    }

    /// Run the periodic sweep: presence purge and rate-limiter pruning on
    /// every tick, room eviction on the configured (coarser) cadence
    pub async fn run_sweeper(
        self: Arc<Self>,
        config: Arc<Config>,
        mutation_limiter: Arc<PlayerLimiter>,
    ) {
        let presence_tick = config.presence_sweep_interval;
        let ticks_per_eviction = (config.room_sweep_interval.as_secs()
            / presence_tick.as_secs().max(1))
        .max(1);

        let mut interval = tokio::time::interval(presence_tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut tick: u64 = 0;

        loop {
            interval.tick().await;
            tick += 1;

            let now = unix_millis();
            self.purge_presence(now);

            // Guest ids are minted per anonymous request; without pruning,
            // the keyed limiter grows for the life of the process.
            mutation_limiter.retain_recent();

            if tick % ticks_per_eviction == 0 {
                let evicted = self.evict_idle(now, config.room_idle_timeout);
                if evicted > 0 {
                    info!(evicted, active = self.active_rooms(), "Room sweep complete");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RoomRegistry {
        RoomRegistry::new(&Config::for_tests())
    }

    #[test]
    fn get_or_create_returns_same_room_for_same_id() {
        let reg = registry();
        let a = reg.get_or_create("alpha");
        let b = reg.get_or_create("alpha");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.active_rooms(), 1);
    }

    #[test]
    fn distinct_ids_get_distinct_rooms() {
        let reg = registry();
        let a = reg.get_or_create("alpha");
        let b = reg.get_or_create("beta");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(reg.active_rooms(), 2);
    }

    #[test]
    fn get_does_not_create() {
        let reg = registry();
        assert!(reg.get("nope").is_none());
        assert_eq!(reg.active_rooms(), 0);
    }

    #[test]
    fn idle_rooms_are_evicted_and_fresh_ones_kept() {
        let reg = registry();
        reg.get_or_create("old");
        let now = unix_millis();
        // Nothing is idle yet
        assert_eq!(reg.evict_idle(now, Duration::from_secs(3600)), 0);
        // Far enough in the future everything is idle
        let later = now + 2 * 3600 * 1000;
        assert_eq!(reg.evict_idle(later, Duration::from_secs(3600)), 1);
        assert_eq!(reg.active_rooms(), 0);
    }

    #[test]
    fn total_players_sums_across_rooms() {
        let reg = registry();
        reg.get_or_create("a").join("p1", "P1".to_string(), 0.0, 0.0);
        reg.get_or_create("b").join("p2", "P2".to_string(), 0.0, 0.0);
        assert_eq!(reg.total_players(), 2);
    }
}
