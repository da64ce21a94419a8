//! Guest identity assignment
//!
//! The sync API is guest-friendly: callers that do not present a player id
//! are handed an ephemeral one instead of being rejected. Authenticated
//! callers pass their durable id through unchanged.

use uuid::Uuid;

/// Resolve the caller's player id, minting a guest id if none was supplied
pub fn resolve_player_id(claimed: Option<String>) -> String {
    match claimed {
        Some(id) if !id.trim().is_empty() => id,
        _ => format!("guest-{}", &Uuid::new_v4().simple().to_string()[..8]),
    }
}

/// Resolve a display name, deriving a guest name from the player id if absent
pub fn resolve_display_name(claimed: Option<String>, player_id: &str) -> String {
    match claimed {
        Some(name) if !name.trim().is_empty() => name,
        _ => {
            // Player ids are client-controlled and may be multibyte; slice
            // on a char boundary, never a byte offset.
            let start = player_id
                .char_indices()
                .rev()
                .nth(3)
                .map(|(i, _)| i)
                .unwrap_or(0);
            format!("Guest_{}", &player_id[start..])
        }
    }
}
