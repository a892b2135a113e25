use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

/// What a cached reply is keyed by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheKeyMode {
    /// The matched trigger phrase: coarse, shared by many distinct questions.
    #[default]
    Trigger,
    /// The whole message, trimmed and lowercased.
    Text,
}

impl CacheKeyMode {
    pub fn key(self, phrase: &str, text: &str) -> String {
        match self {
            CacheKeyMode::Trigger => phrase.to_string(),
            CacheKeyMode::Text => text.trim().to_lowercase(),
        }
    }
}

/// Bounded reply cache with FIFO eviction.
///
/// Entries are evicted strictly in insertion order; reads never refresh an entry.
/// One lock guards both the map and the order queue so the size bound and the
/// ordering stay consistent under concurrent use.
#[derive(Debug)]
pub struct ReplyCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

impl ReplyCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Insert `reply` under `key` at the newest position, evicting the oldest
    /// insertions while over capacity.
    ///
    /// Overwriting an existing key replaces the reply but keeps its original
    /// position in the eviction order.
    pub fn put(&self, key: impl Into<String>, reply: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        let key = key.into();
        let mut inner = self.lock();

        if let Some(existing) = inner.entries.get_mut(&key) {
            *existing = reply.into();
            return;
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, reply.into());

        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn key_modes() {
        assert_eq!(CacheKeyMode::Trigger.key("how to buy", " How to buy $STUCK "), "how to buy");
        assert_eq!(CacheKeyMode::Text.key("how to buy", " How to buy $STUCK "), "how to buy $stuck");
    }

    #[test]
    fn evicts_first_inserted_past_capacity() {
        let cache = ReplyCache::new(50);
        for i in 0..51 {
            cache.put(format!("key-{i}"), format!("reply-{i}"));
        }

        assert_eq!(cache.len(), 50);
        assert_eq!(cache.get("key-0"), None);
        for i in 1..51 {
            assert_eq!(cache.get(&format!("key-{i}")), Some(format!("reply-{i}")));
        }
    }

    #[test]
    fn reads_do_not_refresh_position() {
        let cache = ReplyCache::new(2);
        cache.put("a", "1");
        cache.put("b", "2");
        assert_eq!(cache.get("a"), Some("1".to_string()));

        cache.put("c", "3");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some("2".to_string()));
        assert_eq!(cache.get("c"), Some("3".to_string()));
    }

    #[test]
    fn overwrite_keeps_position_and_size() {
        let cache = ReplyCache::new(2);
        cache.put("a", "1");
        cache.put("b", "2");
        cache.put("a", "1b");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some("1b".to_string()));

        cache.put("c", "3");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some("2".to_string()));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = ReplyCache::new(0);
        cache.put("a", "1");
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn concurrent_puts_respect_bound() {
        let cache = Arc::new(ReplyCache::new(50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        cache.put(format!("{t}-{i}"), "x");
                        assert!(cache.len() <= 50);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 50);
    }
}
