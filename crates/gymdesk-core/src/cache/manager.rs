use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::Resource;
use crate::dashboard::DashboardStats;
use crate::models::Id;

/// Snapshots older than this are shown but refreshed in the background
const CACHE_STALE_MINUTES: i64 = 15;

const STATS_FILE: &str = "dashboard";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    /// "just now", "5m ago", "2h ago", "3d ago"
    pub fn age_display(&self) -> String {
        match self.age_minutes() {
            // Clock skew counts as fresh
            m if m < 1 => "just now".to_string(),
            m if m < 60 => format!("{}m ago", m),
            m if m < 1440 => format!("{}h ago", (m + 30) / 60),
            m => format!("{}d ago", (m + 720) / 1440),
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }

    /// Age for status lines, flagged once stale
    pub fn freshness(&self) -> String {
        if self.is_stale() {
            format!("{}, possibly out of date", self.age_display())
        } else {
            self.age_display()
        }
    }
}

/// Per-gym JSON snapshots of the last fetched first page of each list.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache dir {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    fn gym_dir(&self, gym_id: Id) -> PathBuf {
        self.cache_dir.join(gym_id.to_string())
    }

    fn cache_path(&self, gym_id: Id, name: &str) -> PathBuf {
        self.gym_dir(gym_id).join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, gym_id: Id, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(gym_id, name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, gym_id: Id, name: &str, data: &T) -> Result<()> {
        let dir = self.gym_dir(gym_id);
        std::fs::create_dir_all(&dir)?;
        let cached = CachedData::new(data);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(self.cache_path(gym_id, name), contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        debug!(gym_id = gym_id, name = name, "Saved snapshot");
        Ok(())
    }

    // ===== Resource lists =====

    /// Last saved list of `R` for a gym. A corrupt snapshot reads as missing.
    pub fn load_list<R: Resource>(&self, gym_id: Id) -> Option<CachedData<Vec<R>>> {
        match self.load(gym_id, R::PATH) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(resource = R::NAME, error = %e, "Ignoring unreadable snapshot");
                None
            }
        }
    }

    pub fn save_list<R: Resource>(&self, gym_id: Id, items: &[R]) -> Result<()> {
        self.save(gym_id, R::PATH, &items)
    }

    /// Drop the snapshot of `R` after a mutation
    pub fn invalidate<R: Resource>(&self, gym_id: Id) -> Result<()> {
        let path = self.cache_path(gym_id, R::PATH);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cache file: {}", R::PATH))?;
            debug!(gym_id = gym_id, resource = R::NAME, "Invalidated snapshot");
        }
        Ok(())
    }

    // ===== Dashboard =====

    pub fn load_stats(&self, gym_id: Id) -> Option<CachedData<DashboardStats>> {
        self.load(gym_id, STATS_FILE).ok().flatten()
    }

    pub fn save_stats(&self, gym_id: Id, stats: &DashboardStats) -> Result<()> {
        self.save(gym_id, STATS_FILE, stats)
    }

    /// Remove every snapshot of a gym
    pub fn clear_gym(&self, gym_id: Id) -> Result<()> {
        let dir = self.gym_dir(gym_id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to clear cache for gym {}", gym_id))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Package;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn cached_ago(minutes: i64) -> CachedData<()> {
        CachedData {
            data: (),
            cached_at: Utc::now() - Duration::minutes(minutes),
        }
    }

    fn package(id: Id) -> Package {
        Package {
            id,
            gym_id: 1,
            name: format!("Plan {}", id),
            description: None,
            duration_days: 30,
            price: Decimal::new(2500, 2),
            is_active: true,
        }
    }

    #[test]
    fn test_age_display() {
        assert_eq!(cached_ago(-5).age_display(), "just now");
        assert_eq!(cached_ago(0).age_display(), "just now");
        assert_eq!(cached_ago(5).age_display(), "5m ago");
        assert_eq!(cached_ago(119).age_display(), "2h ago");
        assert_eq!(cached_ago(60 + 29).age_display(), "1h ago");
        assert_eq!(cached_ago(3 * 1440).age_display(), "3d ago");
    }

    #[test]
    fn test_staleness() {
        assert!(!cached_ago(10).is_stale());
        assert!(cached_ago(16).is_stale());
        assert_eq!(cached_ago(5).freshness(), "5m ago");
        assert_eq!(cached_ago(45).freshness(), "45m ago, possibly out of date");
    }

    #[test]
    fn test_save_load_invalidate() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();

        assert!(cache.load_list::<Package>(1).is_none());
        cache.save_list(1, &[package(1), package(2)]).unwrap();

        let loaded = cache.load_list::<Package>(1).unwrap();
        assert_eq!(loaded.data.len(), 2);
        assert_eq!(loaded.data[1].price, Decimal::new(2500, 2));
        assert!(!loaded.is_stale());

        // Other gyms are separate
        assert!(cache.load_list::<Package>(2).is_none());

        cache.invalidate::<Package>(1).unwrap();
        assert!(cache.load_list::<Package>(1).is_none());
        // Invalidating twice is fine
        cache.invalidate::<Package>(1).unwrap();
    }

    #[test]
    fn test_corrupt_snapshot_reads_as_missing() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(dir.path().join("1")).unwrap();
        std::fs::write(dir.path().join("1").join("packages.json"), "{not json").unwrap();
        assert!(cache.load_list::<Package>(1).is_none());
    }

    #[test]
    fn test_stats_and_clear() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        let stats = DashboardStats {
            total_members: 40,
            ..Default::default()
        };
        cache.save_stats(7, &stats).unwrap();
        assert_eq!(cache.load_stats(7).unwrap().data, stats);
        cache.clear_gym(7).unwrap();
        assert!(cache.load_stats(7).is_none());
    }
}
