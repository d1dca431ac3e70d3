use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use uuid::Uuid;

use super::FlyweightCache;
use crate::entities::category::Category;

/// A category row frozen behind an `Arc`.
pub type CategoryFlyweight = Arc<Category>;

/// What [`CategoryRegistry::preload`] does when a row for an already cached id arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PreloadPolicy {
    /// Keep the first instance seen for an id. Later rows are ignored even if
    /// their fields changed, so cached categories can go stale until reset.
    #[default]
    FirstWins,
    /// Replace the cached instance when the incoming row differs from it.
    RefreshOnChange,
}

impl fmt::Display for PreloadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreloadPolicy::FirstWins => f.write_str("first-wins"),
            PreloadPolicy::RefreshOnChange => f.write_str("refresh-on-change"),
        }
    }
}

impl FromStr for PreloadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-wins" | "first_wins" => Ok(PreloadPolicy::FirstWins),
            "refresh-on-change" | "refresh_on_change" => Ok(PreloadPolicy::RefreshOnChange),
            other => Err(format!(
                "unknown category preload policy '{}', expected first-wins or refresh-on-change",
                other
            )),
        }
    }
}

#[derive(Debug, Default)]
pub struct CategoryRegistry {
    cache: FlyweightCache<Category>,
    policy: PreloadPolicy,
}

impl CategoryRegistry {
    pub fn new(policy: PreloadPolicy) -> Self {
        Self {
            cache: FlyweightCache::new(),
            policy,
        }
    }

    pub fn policy(&self) -> PreloadPolicy {
        self.policy
    }

    /// Seeds the cache from fetched rows and returns one shared instance per row.
    pub fn preload(&self, categories: Vec<Category>) -> Vec<CategoryFlyweight> {
        categories
            .into_iter()
            .map(|category| {
                let key = category.id.to_string();
                match (self.cache.get(&key), self.policy) {
                    (Some(existing), PreloadPolicy::FirstWins) => existing,
                    (Some(existing), PreloadPolicy::RefreshOnChange) if *existing == category => {
                        existing
                    }
                    (Some(_), PreloadPolicy::RefreshOnChange) => {
                        tracing::debug!(category_id = %key, "Refreshing changed category flyweight");
                        let fresh = Arc::new(category);
                        self.cache.insert(&key, Arc::clone(&fresh));
                        fresh
                    }
                    (None, _) => self.cache.get_or_insert_with(&key, || category),
                }
            })
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Option<CategoryFlyweight> {
        self.cache.get(&id.to_string())
    }

    #[cfg(test)]
    pub fn reset(&self) {
        self.cache.reset();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn category(name: &str) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            icon: "BookOpen".to_string(),
            color: "#111111".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn preloaded_instance_is_returned_by_get() {
        let registry = CategoryRegistry::default();
        let frontend = category("Frontend");

        let preloaded = registry.preload(vec![frontend.clone()]);
        let fetched = registry.get(frontend.id).expect("category should be cached");

        assert!(Arc::ptr_eq(&preloaded[0], &fetched));
    }

    #[test]
    fn different_ids_get_different_instances() {
        let registry = CategoryRegistry::default();
        let loaded = registry.preload(vec![category("Frontend"), category("Backend")]);

        assert!(!Arc::ptr_eq(&loaded[0], &loaded[1]));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn first_wins_keeps_the_stale_instance() {
        let registry = CategoryRegistry::new(PreloadPolicy::FirstWins);
        let original = category("Frontend");
        let mut renamed = original.clone();
        renamed.name = "Front-end".to_string();

        let first = registry.preload(vec![original]);
        let second = registry.preload(vec![renamed]);

        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(second[0].name, "Frontend");
    }

    #[test]
    fn refresh_on_change_replaces_changed_rows() {
        let registry = CategoryRegistry::new(PreloadPolicy::RefreshOnChange);
        let original = category("Frontend");
        let mut renamed = original.clone();
        renamed.name = "Front-end".to_string();

        let first = registry.preload(vec![original.clone()]);
        let unchanged = registry.preload(vec![original]);
        assert!(Arc::ptr_eq(&first[0], &unchanged[0]));

        let refreshed = registry.preload(vec![renamed.clone()]);
        assert!(!Arc::ptr_eq(&first[0], &refreshed[0]));
        assert_eq!(registry.get(renamed.id).unwrap().name, "Front-end");
    }

    #[test]
    fn missing_id_is_a_cache_miss() {
        let registry = CategoryRegistry::default();
        assert!(registry.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn reset_empties_the_cache() {
        let registry = CategoryRegistry::default();
        let row = category("Music");
        registry.preload(vec![row.clone()]);

        registry.reset();
        assert_eq!(registry.len(), 0);
        assert!(registry.get(row.id).is_none());
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!(
            "refresh-on-change".parse::<PreloadPolicy>().unwrap(),
            PreloadPolicy::RefreshOnChange
        );
        assert_eq!("FIRST-WINS".parse::<PreloadPolicy>().unwrap(), PreloadPolicy::FirstWins);
        assert!("newest".parse::<PreloadPolicy>().is_err());
    }
}
