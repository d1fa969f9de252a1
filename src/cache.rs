//! Best-effort read cache and rate limiting.
//!
//! Both are keyed `user_id:role`, injected through application state, and
//! never relied on for correctness: dropping either only costs redundant
//! reads or lost throttling, never data.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value as JsonValue;
use tokio::sync::Mutex;

/// Default TTL for cached listing responses.
pub const LIST_CACHE_TTL: Duration = Duration::from_secs(300);

// ============================================================================
// Listing cache
// ============================================================================

/// Short-lived cache for one listing endpoint. Entries expire after
/// [`LIST_CACHE_TTL`]; any document write clears the whole cache since an
/// elevated caller's view spans every owner.
#[derive(Debug, Default)]
pub struct ListCache {
    entries: Mutex<HashMap<String, (Instant, JsonValue)>>,
}

impl ListCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<JsonValue> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((stored, value)) if stored.elapsed() < LIST_CACHE_TTL => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn put(&self, key: String, value: JsonValue) {
        self.entries.lock().await.insert(key, (Instant::now(), value));
    }

    pub async fn invalidate_all(&self) {
        self.entries.lock().await.clear();
    }
}

// ============================================================================
// Rate limiter
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub capacity: f64,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 60.0,
            refill_per_sec: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter, per principal key. Best effort and
/// per-process; a multi-instance deployment swaps in a shared backend.
#[derive(Debug, Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn allow(&self, key: &str, cfg: &RateLimitConfig) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: cfg.capacity,
            last_refill: now,
        });
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + elapsed * cfg.refill_per_sec).min(cfg.capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn cache_hits_until_invalidated() {
        let cache = ListCache::new();
        cache.put("u:USER".to_string(), json!({"items": []})).await;
        assert!(cache.get("u:USER").await.is_some());
        assert!(cache.get("someone-else").await.is_none());

        cache.invalidate_all().await;
        assert!(cache.get("u:USER").await.is_none());
    }

    #[tokio::test]
    async fn limiter_exhausts_and_refuses() {
        let limiter = RateLimiter::new();
        let cfg = RateLimitConfig {
            capacity: 2.0,
            refill_per_sec: 0.0,
        };
        assert!(limiter.allow("k", &cfg).await);
        assert!(limiter.allow("k", &cfg).await);
        assert!(!limiter.allow("k", &cfg).await);
        // other keys are independent
        assert!(limiter.allow("other", &cfg).await);
    }
}
