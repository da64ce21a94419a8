//! World synchronization core: rooms, grids, change logs, presence

pub mod presence;
pub mod registry;
pub mod room;
pub mod store;
pub mod terrain;
pub mod tile;

pub use presence::{Armor, Equipment, PresenceEntry, Weapon};
pub use registry::RoomRegistry;
pub use room::{PullOutcome, Room};
pub use store::{ApplyError, Delta, TileMutation, WorldSnapshot, WorldStore};
pub use tile::TileType;
