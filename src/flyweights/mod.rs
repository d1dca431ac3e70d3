//! Flyweight registries for the small, immutable descriptors the UI asks for
//! over and over (icons, languages, roles, styles, categories).
//!
//! Every registry is an owned value: the composition root builds one
//! [`Flyweights`] and hands it to the router state, tests build their own.
//! Descriptors are shared as `Arc`s, so repeated lookups of a key return the
//! same allocation and callers only ever get shared (read-only) access.

pub mod category;
pub mod icon;
pub mod language;
pub mod role;
pub mod style;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use self::category::{CategoryRegistry, PreloadPolicy};
use self::icon::IconFactory;
use self::language::LanguageRegistry;
use self::role::RoleRegistry;
use self::style::StyleRegistry;

/// Lazily populated key -> instance table shared by all registries.
///
/// Entries are never evicted; [`FlyweightCache::reset`] is the only way to
/// drop them.
#[derive(Debug)]
pub struct FlyweightCache<V> {
    entries: RwLock<HashMap<String, Arc<V>>>,
}

impl<V> Default for FlyweightCache<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> FlyweightCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.entries.read().get(key).cloned()
    }

    /// Returns the cached instance for `key`, building it with `make` on a miss.
    pub fn get_or_insert_with(&self, key: &str, make: impl FnOnce() -> V) -> Arc<V> {
        if let Some(hit) = self.entries.read().get(key) {
            return Arc::clone(hit);
        }

        // Another thread may have won the race between the two locks.
        let mut entries = self.entries.write();
        Arc::clone(
            entries
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(make())),
        )
    }

    pub fn insert(&self, key: &str, value: Arc<V>) {
        self.entries.write().insert(key.to_string(), value);
    }

    #[cfg(test)]
    pub fn reset(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

}

/// Every descriptor registry the service uses, owned by the composition root.
#[derive(Debug, Default)]
pub struct Flyweights {
    pub icons: IconFactory,
    pub languages: LanguageRegistry,
    pub roles: RoleRegistry,
    pub styles: StyleRegistry,
    pub categories: CategoryRegistry,
}

impl Flyweights {
    pub fn new(category_policy: PreloadPolicy) -> Self {
        Self {
            categories: CategoryRegistry::new(category_policy),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn reset_all(&self) {
        self.icons.reset();
        self.languages.reset();
        self.roles.reset();
        self.styles.reset();
        self.categories.reset();
        tracing::debug!("All flyweight caches cleared");
    }
}

/// A lookup key that is not part of a fixed registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{key}'")]
pub struct UnknownKey {
    pub kind: &'static str,
    pub key: String,
}

impl From<UnknownKey> for crate::errors::AppError {
    fn from(err: UnknownKey) -> Self {
        crate::errors::AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn builds_each_key_once() {
        let cache: FlyweightCache<String> = FlyweightCache::new();
        let builds = AtomicUsize::new(0);

        let first = cache.get_or_insert_with("a", || {
            builds.fetch_add(1, Ordering::SeqCst);
            "alpha".to_string()
        });
        let second = cache.get_or_insert_with("a", || {
            builds.fetch_add(1, Ordering::SeqCst);
            "other".to_string()
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.as_str(), "alpha");
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_empties_the_cache() {
        let cache: FlyweightCache<u32> = FlyweightCache::new();
        let before = cache.get_or_insert_with("k", || 7);
        assert_eq!(cache.len(), 1);

        cache.reset();
        assert_eq!(cache.len(), 0);

        let after = cache.get_or_insert_with("k", || 7);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn shared_instances_cannot_be_mutated() {
        let cache: FlyweightCache<String> = FlyweightCache::new();
        let mut handle = cache.get_or_insert_with("k", || "value".to_string());

        assert!(Arc::get_mut(&mut handle).is_none());
    }

    #[test]
    fn concurrent_lookups_share_one_instance() {
        let cache = Arc::new(FlyweightCache::<String>::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_insert_with("shared", || "x".into()))
            })
            .collect();

        let instances: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn registries_are_independent_per_instance() {
        let first = Flyweights::default();
        let second = Flyweights::default();

        let a = first.icons.get("Play");
        let b = second.icons.get("Play");
        assert!(!Arc::ptr_eq(&a, &b));

        first.reset_all();
        assert_eq!(first.icons.len(), 0);
        assert_eq!(second.icons.len(), 1);
    }
}
