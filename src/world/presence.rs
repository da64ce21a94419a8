//! Per-room player presence tracking
//!
//! Presence is soft state: an entry exists while its owner keeps reporting
//! and evaporates once `last_seen` falls behind the liveness threshold. The
//! server is the arbiter of expiry; clients never see their own entry in
//! "other players" listings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::tile::TileType;

/// Default spawn position in world pixel space
pub const DEFAULT_SPAWN_X: f32 = 400.0;
pub const DEFAULT_SPAWN_Y: f32 = 300.0;
pub const DEFAULT_HEALTH: f32 = 100.0;

/// Held weapon options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weapon {
    None,
    Sword,
    Bow,
    Axe,
}

/// Worn armor options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Armor {
    None,
    Leather,
    Iron,
    Diamond,
}

/// What a player currently has selected/equipped
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub block: TileType,
    pub weapon: Weapon,
    pub armor: Armor,
}

impl Default for Equipment {
    fn default() -> Self {
        Self {
            block: TileType::Dirt,
            weapon: Weapon::Sword,
            armor: Armor::Leather,
        }
    }
}

/// One connected player's state within a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub player_id: String,
    pub display_name: String,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub equipment: Equipment,
    /// Unix millis of the last report from this player
    pub last_seen: u64,
}

/// Tracks connected players and expires the inactive
pub struct PresenceTracker {
    players: HashMap<String, PresenceEntry>,
    /// Liveness threshold in milliseconds
    ttl_ms: u64,
}

impl PresenceTracker {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            players: HashMap::new(),
            ttl_ms,
        }
    }

    /// Upsert a player on room join
    pub fn join(
        &mut self,
        player_id: &str,
        display_name: String,
        x: f32,
        y: f32,
        now_ms: u64,
    ) -> PresenceEntry {
        let entry = PresenceEntry {
            player_id: player_id.to_string(),
            display_name,
            x,
            y,
            health: DEFAULT_HEALTH,
            equipment: Equipment::default(),
            last_seen: now_ms,
        };
        self.players.insert(player_id.to_string(), entry.clone());
        entry
    }

    /// Update a player's reported state, treating an unknown player as an
    /// implicit join (covers clients that outlived a server restart)
    pub fn report(
        &mut self,
        player_id: &str,
        display_name: Option<String>,
        x: f32,
        y: f32,
        health: f32,
        equipment: Equipment,
        now_ms: u64,
    ) {
        let entry = self
            .players
            .entry(player_id.to_string())
            .or_insert_with(|| PresenceEntry {
                player_id: player_id.to_string(),
                display_name: String::new(),
                x,
                y,
                health,
                equipment,
                last_seen: now_ms,
            });

        if let Some(name) = display_name {
            entry.display_name = name;
        } else if entry.display_name.is_empty() {
            entry.display_name = player_id.to_string();
        }
        entry.x = x;
        entry.y = y;
        entry.health = health;
        entry.equipment = equipment;
        entry.last_seen = now_ms;
    }

    /// Explicit removal on leave
    pub fn leave(&mut self, player_id: &str) {
        self.players.remove(player_id);
    }

    /// Drop entries whose last report is older than the liveness threshold
    pub fn purge_stale(&mut self, now_ms: u64) {
        let cutoff = now_ms.saturating_sub(self.ttl_ms);
        self.players.retain(|_, p| p.last_seen >= cutoff);
    }

    /// Purge, then list the remaining players, optionally excluding the
    /// caller's own entry
    pub fn list_active(&mut self, now_ms: u64, excluding: Option<&str>) -> Vec<PresenceEntry> {
        self.purge_stale(now_ms);
        let mut active: Vec<PresenceEntry> = self
            .players
            .values()
            .filter(|p| excluding != Some(p.player_id.as_str()))
            .cloned()
            .collect();
        // Stable listing order for clients
        active.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        active
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: u64 = 30_000;

    fn tracker() -> PresenceTracker {
        PresenceTracker::new(TTL)
    }

    #[test]
    fn join_creates_entry_with_defaults() {
        let mut t = tracker();
        let entry = t.join("p1", "Alice".to_string(), 400.0, 300.0, 1_000);
        assert_eq!(entry.health, DEFAULT_HEALTH);
        assert_eq!(entry.equipment, Equipment::default());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn report_updates_fields_and_last_seen() {
        let mut t = tracker();
        t.join("p1", "Alice".to_string(), 0.0, 0.0, 1_000);
        t.report(
            "p1",
            None,
            50.0,
            60.0,
            80.0,
            Equipment {
                block: TileType::Stone,
                weapon: Weapon::Bow,
                armor: Armor::Iron,
            },
            5_000,
        );
        let active = t.list_active(5_000, None);
        assert_eq!(active[0].x, 50.0);
        assert_eq!(active[0].health, 80.0);
        assert_eq!(active[0].equipment.weapon, Weapon::Bow);
        assert_eq!(active[0].last_seen, 5_000);
        assert_eq!(active[0].display_name, "Alice");
    }

    #[test]
    fn report_for_unknown_player_is_implicit_join() {
        let mut t = tracker();
        t.report("ghost", None, 1.0, 2.0, 100.0, Equipment::default(), 1_000);
        assert_eq!(t.len(), 1);
        let active = t.list_active(1_000, None);
        assert_eq!(active[0].display_name, "ghost");
    }

    #[test]
    fn stale_entries_expire_on_list() {
        let mut t = tracker();
        t.join("p1", "Alice".to_string(), 0.0, 0.0, 1_000);
        t.join("p2", "Bob".to_string(), 0.0, 0.0, 20_000);
        // p1 has not reported within the TTL window
        let active = t.list_active(1_000 + TTL + 1, None);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].player_id, "p2");
    }

    #[test]
    fn listing_can_exclude_the_caller() {
        let mut t = tracker();
        t.join("me", "Me".to_string(), 0.0, 0.0, 1_000);
        t.join("other", "Other".to_string(), 0.0, 0.0, 1_000);
        let active = t.list_active(1_000, Some("me"));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].player_id, "other");
    }

    #[test]
    fn leave_removes_immediately() {
        let mut t = tracker();
        t.join("p1", "Alice".to_string(), 0.0, 0.0, 1_000);
        t.leave("p1");
        assert!(t.is_empty());
    }
}
