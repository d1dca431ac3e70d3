use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{FlyweightCache, UnknownKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleId {
    NavLink,
    SectionTitle,
    SectionDescription,
    MutedText,
    MutedIcon,
}

impl StyleId {
    pub const ALL: [StyleId; 5] = [
        StyleId::NavLink,
        StyleId::SectionTitle,
        StyleId::SectionDescription,
        StyleId::MutedText,
        StyleId::MutedIcon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleId::NavLink => "navLink",
            StyleId::SectionTitle => "sectionTitle",
            StyleId::SectionDescription => "sectionDescription",
            StyleId::MutedText => "mutedText",
            StyleId::MutedIcon => "mutedIcon",
        }
    }

    fn class_name(&self) -> &'static str {
        match self {
            StyleId::NavLink => {
                "text-sm font-medium text-muted-foreground hover:text-foreground transition-colors"
            }
            StyleId::SectionTitle => "text-2xl md:text-3xl font-bold",
            StyleId::SectionDescription => "text-muted-foreground mt-1",
            StyleId::MutedText => "text-sm text-muted-foreground",
            StyleId::MutedIcon => "text-muted-foreground",
        }
    }
}

impl FromStr for StyleId {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StyleId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownKey {
                kind: "style",
                key: s.to_string(),
            })
    }
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    id: StyleId,
    class_name: &'static str,
}

impl Style {
    pub fn id(&self) -> StyleId {
        self.id
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }
}

#[derive(Debug, Default)]
pub struct StyleRegistry {
    cache: FlyweightCache<Style>,
}

impl StyleRegistry {
    pub fn get(&self, id: StyleId) -> Arc<Style> {
        self.cache.get_or_insert_with(id.as_str(), || Style {
            id,
            class_name: id.class_name(),
        })
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

    #[test]
    fn same_style_returns_same_instance() {
        let styles = StyleRegistry::default();
        assert!(Arc::ptr_eq(
            &styles.get(StyleId::NavLink),
            &styles.get(StyleId::NavLink)
        ));
    }

    #[test]
    fn different_styles_return_different_instances() {
        let styles = StyleRegistry::default();
        let nav = styles.get(StyleId::NavLink);
        let title = styles.get(StyleId::SectionTitle);

        assert!(!Arc::ptr_eq(&nav, &title));
        assert_eq!(title.class_name(), "text-2xl md:text-3xl font-bold");
    }

    #[test]
    fn parses_ids_by_their_frontend_names() {
        assert_eq!("mutedIcon".parse::<StyleId>().unwrap(), StyleId::MutedIcon);
        assert!("hero".parse::<StyleId>().is_err());
    }

    #[test]
    fn reset_empties_the_cache() {
        let styles = StyleRegistry::default();
        for id in StyleId::ALL {
            styles.get(id);
        }
        assert_eq!(styles.len(), 5);

        styles.reset();
        assert_eq!(styles.len(), 0);
    }
}
