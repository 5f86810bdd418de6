//! Local snapshot cache.
//!
//! `CacheManager` keeps the last fetched first page of each list, per gym,
//! as JSON under `~/.cache/gymdesk/<gymId>/`, so screens have something to
//! show before the network answers. Snapshots go stale after 15 minutes and
//! are dropped when the resource is mutated.

pub mod manager;

pub use manager::{CacheManager, CachedData};
