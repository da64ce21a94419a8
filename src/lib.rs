//! Authoritative world-state synchronization for the multiplayer sandbox
//!
//! The crate is organized around per-room state: each room owns a tile grid,
//! a bounded change log, and a presence set behind its own lock. Clients
//! push mutations and pull deltas over an HTTP polling surface; conflicts
//! on the same tile resolve last-write-wins by server timestamp.

pub mod app;
pub mod config;
pub mod http;
pub mod util;
pub mod world;
