//! A single game-world room: grid, change log, and presence under one lock
//!
//! Rooms are the unit of isolation. Each room carries its own mutex so stamp
//! assignment and log appends are atomic within the room while distinct
//! rooms proceed fully in parallel. Nothing outside this module touches the
//! store or tracker directly.

use parking_lot::Mutex;

use crate::util::time::unix_millis;

use super::presence::{Equipment, PresenceEntry, PresenceTracker};
use super::store::{ApplyError, Delta, TileMutation, WorldSnapshot, WorldStore};
use super::terrain;
use super::tile::TileType;

struct RoomInner {
    store: WorldStore,
    presence: PresenceTracker,
    /// Unix millis of the last successful operation against this room
    last_activity: u64,
}

/// One isolated world instance, identified by a string key
pub struct Room {
    id: String,
    inner: Mutex<RoomInner>,
}

/// What a joining client receives
pub struct JoinOutcome {
    pub snapshot: WorldSnapshot,
    pub entry: PresenceEntry,
    pub others: Vec<PresenceEntry>,
}

/// Result of a delta pull: either an ordered delta or a full snapshot when
/// the caller's watermark predates the retained log
pub enum PullOutcome {
    Changes {
        mutations: Vec<TileMutation>,
        watermark: u64,
    },
    ResyncRequired {
        snapshot: WorldSnapshot,
    },
}

impl Room {
    /// Create a room with seeded terrain derived from its id
    pub fn new(id: String, width: usize, height: usize, log_cap: usize, presence_ttl_ms: u64) -> Self {
        let seed = terrain::seed_for_room(&id);
        let grid = terrain::generate(width, height, seed);
        let inner = RoomInner {
            store: WorldStore::new(grid, height, log_cap),
            presence: PresenceTracker::new(presence_ttl_ms),
            last_activity: unix_millis(),
        };
        Self {
            id,
            inner: Mutex::new(inner),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Register a player and hand back the full world state
    pub fn join(&self, player_id: &str, display_name: String, x: f32, y: f32) -> JoinOutcome {
        let now = unix_millis();
        let mut inner = self.inner.lock();
        inner.last_activity = now;
        let entry = inner.presence.join(player_id, display_name, x, y, now);
        let others = inner.presence.list_active(now, Some(player_id));
        JoinOutcome {
            snapshot: inner.store.snapshot(),
            entry,
            others,
        }
    }

    /// Record a player's state report and return the other active players
    pub fn report_state(
        &self,
        player_id: &str,
        display_name: Option<String>,
        x: f32,
        y: f32,
        health: f32,
        equipment: Equipment,
    ) -> Vec<PresenceEntry> {
        let now = unix_millis();
        let mut inner = self.inner.lock();
        inner.last_activity = now;
        inner
            .presence
            .report(player_id, display_name, x, y, health, equipment, now);
        inner.presence.list_active(now, Some(player_id))
    }

    /// Apply one tile mutation through the store
    pub fn submit_mutation(
        &self,
        x: i64,
        y: i64,
        tile: Option<TileType>,
        author_id: &str,
    ) -> Result<TileMutation, ApplyError> {
        let mut inner = self.inner.lock();
        let mutation = inner.store.apply(x, y, tile, author_id)?;
        inner.last_activity = unix_millis();
        Ok(mutation)
    }

    /// Pull mutations after the watermark, falling back to a full snapshot
    /// when the log has been truncated past it
    pub fn pull_deltas(&self, watermark: u64) -> PullOutcome {
        let now = unix_millis();
        let mut inner = self.inner.lock();
        inner.last_activity = now;
        match inner.store.changes_since(watermark) {
            Delta::Changes(mutations) => PullOutcome::Changes {
                watermark: inner.store.watermark(),
                mutations,
            },
            Delta::Stale => PullOutcome::ResyncRequired {
                snapshot: inner.store.snapshot(),
            },
        }
    }

    /// Remove a player's presence immediately
    pub fn leave(&self, player_id: &str) {
        let mut inner = self.inner.lock();
        inner.last_activity = unix_millis();
        inner.presence.leave(player_id);
    }

    /// Expire presence entries past the liveness threshold
    pub fn purge_stale_presence(&self, now_ms: u64) {
        self.inner.lock().presence.purge_stale(now_ms);
    }

    /// Active player count (without purging)
    pub fn player_count(&self) -> usize {
        self.inner.lock().presence.len()
    }

    /// Whether the last activity predates `now_ms - idle_timeout_ms`
    pub fn is_idle(&self, now_ms: u64, idle_timeout_ms: u64) -> bool {
        self.inner.lock().last_activity < now_ms.saturating_sub(idle_timeout_ms)
    }
}
