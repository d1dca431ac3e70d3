use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::AppError;

#[derive(Debug, Clone)]
struct Entry {
    value: serde_json::Value,
    stored_at: Instant,
}

/// Read-through cache for query results, keyed by `:`-joined key segments
/// (see [`super::keys`]). Mutating handlers drop every entry under the
/// prefixes they touch once the store call succeeded.
#[derive(Clone, Debug)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = {
            let entries = self.entries.read();
            let entry = entries.get(key)?;
            if entry.stored_at.elapsed() > self.ttl {
                None
            } else {
                Some(entry.value.clone())
            }
        };

        let Some(value) = value else {
            self.entries.write().remove(key);
            return None;
        };

        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Dropping cache entry {} with unexpected shape: {}", key, e);
                self.entries.write().remove(key);
                None
            }
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.write().insert(
                    key.to_string(),
                    Entry {
                        value,
                        stored_at: Instant::now(),
                    },
                );
            }
            Err(e) => tracing::warn!("Could not cache {}: {}", key, e),
        }
    }

    /// Returns the cached value under `key`, or runs `load` and caches what
    /// it returns. Failed loads are not cached.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, load: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if let Some(cached) = self.get_json::<T>(key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(cached);
        }

        let value = load().await?;
        self.set_json(key, &value);
        Ok(value)
    }

    /// Rewrites a cached value in place without touching its age.
    /// Returns false when nothing usable is cached under `key`.
    pub fn patch_json<T, F>(&self, key: &str, patch: F) -> bool
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T),
    {
        let mut entries = self.entries.write();
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };
        let Ok(mut current) = serde_json::from_value::<T>(entry.value.clone()) else {
            return false;
        };
        patch(&mut current);
        match serde_json::to_value(&current) {
            Ok(value) => {
                entry.value = value;
                true
            }
            Err(_) => false,
        }
    }

    /// Removes `prefix` itself and every key nested under it.
    /// `playlist` does not match `playlist-videos:...`.
    pub fn del_prefix(&self, prefix: &str) {
        let nested = format!("{}:", prefix);
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| key != prefix && !key.starts_with(&nested));
        tracing::debug!(
            "Invalidated {} cached queries under {}",
            before - entries.len(),
            prefix
        );
    }

    pub fn invalidate<I, S>(&self, prefixes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for prefix in prefixes {
            self.del_prefix(prefix.as_ref());
        }
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

}
