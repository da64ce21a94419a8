//! Shared utilities

pub mod identity;
pub mod rate_limit;
pub mod time;
