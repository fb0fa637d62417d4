//! In-memory forecast cache with time-based expiry.
//!
//! Entries carry only their creation time; the ttl lives on the cache and is
//! applied when an entry is read or swept, so changing it affects every
//! existing entry immediately.

use crate::forecast::types::ForecastSnapshot;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Default entry lifetime: 30 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Default interval between background sweeps: 1 hour.
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

// Sweep intervals beyond a year are clamped.
const MAX_PURGE_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: ForecastSnapshot,
    created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > ttl
    }
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
}

/// Concurrency-safe map from cache key to [`ForecastSnapshot`].
///
/// Reads share the lock; inserts, deletes, sweeps and ttl changes take it
/// exclusively. Absence and expiry both surface as `None`.
#[derive(Debug)]
pub struct ExpiringCache {
    state: RwLock<CacheState>,
}

impl ExpiringCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                ttl,
            }),
        }
    }

    /// Return a copy of the snapshot stored under `key` if it is still fresh.
    ///
    /// A stale entry is removed before `None` is returned.
    pub async fn get(&self, key: &str) -> Option<ForecastSnapshot> {
        let now = Instant::now();
        {
            let state = self.state.read().await;
            match state.entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now, state.ttl) => {
                    return Some(entry.snapshot.clone());
                }
                Some(_) => {}
            }
        }

        self.evict_if_expired(key, now).await;
        None
    }

    // Re-checks under the write lock: a put may have landed after the read at `now`.
    async fn evict_if_expired(&self, key: &str, now: Instant) {
        let mut state = self.state.write().await;
        let ttl = state.ttl;
        if state
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(now, ttl))
        {
            state.entries.remove(key);
            tracing::debug!("Evicted expired cache entry {:?}", key);
        }
    }

    /// Insert or overwrite the entry for `key`, stamped with the current time.
    pub async fn put(&self, key: impl Into<String>, snapshot: ForecastSnapshot) {
        let entry = CacheEntry {
            snapshot,
            created_at: Instant::now(),
        };
        self.state.write().await.entries.insert(key.into(), entry);
    }

    /// Remove the entry for `key`. Absent keys are ignored.
    pub async fn delete(&self, key: &str) {
        self.state.write().await.entries.remove(key);
    }

    pub async fn set_ttl(&self, ttl: Duration) {
        self.state.write().await.ttl = ttl;
    }

    pub async fn ttl(&self) -> Duration {
        self.state.read().await.ttl
    }

    /// Number of stored entries, including ones that have expired but not yet been evicted.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove every expired entry and return how many were removed.
    ///
    /// All entries are judged against a single timestamp taken when the
    /// sweep starts.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.write().await;
        let ttl = state.ttl;
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now, ttl));
        before - state.entries.len()
    }

    /// Spawn a task that calls [`purge_expired`](Self::purge_expired) every
    /// `interval`, starting one interval from now.
    ///
    /// Call this at most once per cache; each call starts another sweep task.
    /// Dropping the returned handle leaves the task running until process exit.
    pub fn start_auto_purge(self: &Arc<Self>, interval: Duration) -> PurgeHandle {
        // tokio intervals reject a zero period
        let period = interval.clamp(Duration::from_millis(1), MAX_PURGE_INTERVAL);
        let cache = Arc::clone(self);
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let now = Instant::now();
        let first_sweep = now.checked_add(period).unwrap_or(now);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(first_sweep, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = cache.purge_expired().await;
                        if removed > 0 {
                            tracing::info!("Cache sweep removed {} expired entries", removed);
                        }
                    }
                }
            }
            tracing::debug!("Cache sweep stopped");
        });

        PurgeHandle { token, task }
    }
}

impl Default for ExpiringCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

/// Handle to the background sweep started by [`ExpiringCache::start_auto_purge`].
pub struct PurgeHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PurgeHandle {
    /// Cancel the sweep and wait for the task to finish.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("Cache sweep task ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::types::DailyForecast;
    use tokio::time::advance;

    // Let the sweep task observe the advanced clock.
    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    fn snapshot(current_temperature: f64) -> ForecastSnapshot {
        ForecastSnapshot {
            current_temperature,
            daily: vec![DailyForecast {
                date: "2024-09-25".to_string(),
                max_temperature: 75.5,
                min_temperature: 75.2,
            }],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_then_get_round_trip() {
        let cache = ExpiringCache::default();
        cache.put("78758", snapshot(75.5)).await;

        advance(Duration::from_secs(60)).await;
        assert_eq!(cache.get("78758").await, Some(snapshot(75.5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_returns_independent_copy() {
        let cache = ExpiringCache::default();
        cache.put("78758", snapshot(75.5)).await;

        let mut copy = cache.get("78758").await.unwrap();
        copy.current_temperature = -40.0;
        copy.daily.clear();

        assert_eq!(cache.get("78758").await, Some(snapshot(75.5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_missing_key() {
        let cache = ExpiringCache::default();
        assert_eq!(cache.get("nope").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_get_evicts_entry() {
        let cache = ExpiringCache::new(Duration::from_secs(1));
        cache.put("78758", snapshot(75.5)).await;

        advance(Duration::from_secs(2)).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("78758").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_valid_at_exactly_ttl() {
        let cache = ExpiringCache::new(Duration::from_secs(10));
        cache.put("78758", snapshot(75.5)).await;

        advance(Duration::from_secs(10)).await;
        assert!(cache.get("78758").await.is_some());

        advance(Duration::from_millis(1)).await;
        assert!(cache.get("78758").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lowering_ttl_expires_existing_entries() {
        let cache = ExpiringCache::new(Duration::from_secs(30 * 60));
        cache.put("78758", snapshot(75.5)).await;

        advance(Duration::from_secs(5 * 60)).await;
        assert!(cache.get("78758").await.is_some());

        cache.set_ttl(Duration::from_secs(60)).await;
        assert_eq!(cache.ttl().await, Duration::from_secs(60));
        assert!(cache.get("78758").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_raising_ttl_revives_unevicted_entries() {
        let cache = ExpiringCache::new(Duration::from_secs(1));
        cache.put("78758", snapshot(75.5)).await;

        advance(Duration::from_secs(5)).await;
        cache.set_ttl(Duration::from_secs(60)).await;
        assert!(cache.get("78758").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_restamps() {
        let cache = ExpiringCache::new(Duration::from_secs(10));
        cache.put("78758", snapshot(70.0)).await;

        advance(Duration::from_secs(8)).await;
        cache.put("78758", snapshot(80.0)).await;

        advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("78758").await, Some(snapshot(80.0)));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_is_idempotent() {
        let cache = ExpiringCache::default();
        cache.put("78758", snapshot(75.5)).await;

        cache.delete("78758").await;
        assert_eq!(cache.get("78758").await, None);

        cache.delete("78758").await;
        cache.delete("never-there").await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_removes_only_expired_entries() {
        let cache = ExpiringCache::new(Duration::from_secs(1));
        cache.put("old", snapshot(75.5)).await;

        advance(Duration::from_secs(2)).await;
        cache.put("new", snapshot(76.5)).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("new").await, Some(snapshot(76.5)));
        assert_eq!(cache.get("old").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_on_empty_or_fresh_cache() {
        let cache = ExpiringCache::default();
        assert_eq!(cache.purge_expired().await, 0);

        cache.put("a", snapshot(1.0)).await;
        cache.put("b", snapshot(2.0)).await;
        assert_eq!(cache.purge_expired().await, 0);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_key_is_an_ordinary_bucket() {
        let cache = ExpiringCache::default();
        cache.put("", snapshot(75.5)).await;
        assert_eq!(cache.get("").await, Some(snapshot(75.5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_purge_sweeps_on_interval() {
        let cache = Arc::new(ExpiringCache::new(Duration::from_secs(5)));
        cache.put("78758", snapshot(75.5)).await;
        let handle = cache.start_auto_purge(Duration::from_secs(10));

        // First sweep at t=10s finds the entry already stale.
        advance(Duration::from_secs(9)).await;
        settle().await;
        assert_eq!(cache.len().await, 1);

        advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(cache.len().await, 0);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_sweep_no_longer_purges() {
        let cache = Arc::new(ExpiringCache::new(Duration::from_secs(1)));
        let handle = cache.start_auto_purge(Duration::from_secs(10));
        handle.stop().await;

        cache.put("78758", snapshot(75.5)).await;
        advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_sweep_interval_starts_and_stops() {
        let cache = Arc::new(ExpiringCache::new(Duration::from_secs(1)));
        cache.put("78758", snapshot(75.5)).await;
        let handle = cache.start_auto_purge(Duration::from_secs(u64::MAX));

        advance(Duration::from_secs(24 * 60 * 60)).await;
        settle().await;
        assert_eq!(cache.len().await, 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_between_stale_read_and_eviction_survives() {
        let cache = ExpiringCache::new(Duration::from_secs(1));
        cache.put("78758", snapshot(70.0)).await;
        advance(Duration::from_secs(2)).await;

        // A reader sees the stale entry at `read_at`, then a writer refreshes it.
        let read_at = Instant::now();
        cache.put("78758", snapshot(80.0)).await;

        cache.evict_if_expired("78758", read_at).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("78758").await, Some(snapshot(80.0)));
    }

    #[tokio::test]
    async fn test_concurrent_readers_and_writers() {
        let cache = Arc::new(ExpiringCache::default());
        let mut tasks = Vec::new();

        for i in 0..16 {
            let cache = Arc::clone(&cache);
            tasks.push(tokio::spawn(async move {
                let key = format!("{:05}", i % 4);
                cache.put(key.clone(), snapshot(i as f64)).await;
                assert!(cache.get(&key).await.is_some());
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(cache.len().await, 4);
    }
}
