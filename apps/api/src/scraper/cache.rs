//! TTL cache for skills extracted from job pages, keyed by URL.
//!
//! `AppState` holds an `Arc<dyn SkillsCache>`: in-memory by default, Redis
//! when `REDIS_URL` is configured. Cache errors are logged and treated as misses.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

#[async_trait]
pub trait SkillsCache: Send + Sync {
    async fn get(&self, url: &str) -> Option<Vec<String>>;
    async fn put(&self, url: &str, skills: &[String]);
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory backend
// ────────────────────────────────────────────────────────────────────────────

struct CacheEntry {
    inserted_at: Instant,
    skills: Vec<String>,
}

pub struct MemorySkillsCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemorySkillsCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SkillsCache for MemorySkillsCache {
    async fn get(&self, url: &str) -> Option<Vec<String>> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get(url) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.skills.clone());
            }
        }
        entries.remove(url);
        None
    }

    async fn put(&self, url: &str, skills: &[String]) {
        let mut entries = self.entries.lock().await;

        if !entries.contains_key(url) && entries.len() >= self.capacity {
            let ttl = self.ttl;
            entries.retain(|_, e| e.inserted_at.elapsed() < ttl);

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone());
                if let Some(key) = oldest {
                    entries.remove(&key);
                }
            }
        }

        entries.insert(
            url.to_string(),
            CacheEntry {
                inserted_at: Instant::now(),
                skills: skills.to_vec(),
            },
        );
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis backend
// ────────────────────────────────────────────────────────────────────────────

const REDIS_KEY_PREFIX: &str = "afroz:skills:";

pub struct RedisSkillsCache {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisSkillsCache {
    pub fn new(redis_url: &str, ttl_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
            ttl_secs: ttl_secs.max(1),
        })
    }

    fn key(url: &str) -> String {
        format!("{REDIS_KEY_PREFIX}{url}")
    }

    async fn try_get(&self, url: &str) -> anyhow::Result<Option<Vec<String>>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(url))
            .query_async(&mut conn)
            .await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn try_put(&self, url: &str, skills: &[String]) -> anyhow::Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(Self::key(url))
            .arg(serde_json::to_string(skills)?)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SkillsCache for RedisSkillsCache {
    async fn get(&self, url: &str) -> Option<Vec<String>> {
        self.try_get(url).await.unwrap_or_else(|e| {
            warn!("Redis skills cache read failed for {url}: {e}");
            None
        })
    }

    async fn put(&self, url: &str, skills: &[String]) {
        if let Err(e) = self.try_put(url, skills).await {
            warn!("Redis skills cache write failed for {url}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_memory_cache_hit() {
        let cache = MemorySkillsCache::new(Duration::from_secs(60), 10);
        cache.put("u1", &skills(&["python"])).await;
        assert_eq!(cache.get("u1").await, Some(skills(&["python"])));
        assert_eq!(cache.get("u2").await, None);
    }

    #[tokio::test]
    async fn test_memory_cache_expires() {
        let cache = MemorySkillsCache::new(Duration::from_millis(50), 10);
        cache.put("u1", &skills(&["python"])).await;
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(cache.get("u1").await, None);
    }

    #[tokio::test]
    async fn test_memory_cache_evicts_oldest_at_capacity() {
        let cache = MemorySkillsCache::new(Duration::from_secs(60), 2);
        cache.put("a", &skills(&["1"])).await;
        std::thread::sleep(Duration::from_millis(2));
        cache.put("b", &skills(&["2"])).await;
        std::thread::sleep(Duration::from_millis(2));
        cache.put("c", &skills(&["3"])).await;

        assert_eq!(cache.get("a").await, None);
        assert!(cache.get("b").await.is_some());
        assert!(cache.get("c").await.is_some());
    }

    #[tokio::test]
    async fn test_memory_cache_overwrite_keeps_size() {
        let cache = MemorySkillsCache::new(Duration::from_secs(60), 1);
        cache.put("a", &skills(&["1"])).await;
        cache.put("a", &skills(&["2"])).await;
        assert_eq!(cache.get("a").await, Some(skills(&["2"])));
    }

    #[tokio::test]
    async fn test_memory_cache_drops_expired_before_oldest_live() {
        let cache = MemorySkillsCache::new(Duration::from_millis(300), 3);
        cache.put("stale", &skills(&["0"])).await;
        std::thread::sleep(Duration::from_millis(400));

        cache.put("b", &skills(&["1"])).await;
        cache.put("c", &skills(&["2"])).await;
        cache.put("d", &skills(&["3"])).await;

        {
            let entries = cache.entries.lock().await;
            assert_eq!(entries.len(), 3);
            assert!(!entries.contains_key("stale"));
        }
        assert_eq!(cache.get("b").await, Some(skills(&["1"])));
        assert!(cache.get("c").await.is_some());
        assert!(cache.get("d").await.is_some());
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_a_miss() {
        let cache = RedisSkillsCache::new("redis://127.0.0.1:1", 60).unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(10), async {
            cache.put("https://jobinja.ir/x", &skills(&["python"])).await;
            cache.get("https://jobinja.ir/x").await
        })
        .await
        .expect("unreachable redis should fail fast");

        assert_eq!(outcome, None);
    }

    #[test]
    fn test_redis_key_is_prefixed() {
        assert_eq!(
            RedisSkillsCache::key("https://jobinja.ir/x"),
            "afroz:skills:https://jobinja.ir/x"
        );
    }
}
