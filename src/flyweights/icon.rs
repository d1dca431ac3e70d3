use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Serialize;

use super::FlyweightCache;

/// Icon used when a requested name is not in the registry.
pub const FALLBACK_ICON: &str = "Link";

/// Lucide icon names the frontend renders, with their kebab-case asset slugs.
static ICON_REGISTRY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ArrowLeft", "arrow-left"),
        ("ArrowRight", "arrow-right"),
        ("BookOpen", "book-open"),
        ("Code", "code"),
        ("Facebook", "facebook"),
        ("FolderX", "folder-x"),
        ("Gavel", "gavel"),
        ("Github", "github"),
        ("Globe", "globe"),
        ("GraduationCap", "graduation-cap"),
        ("Handshake", "handshake"),
        ("Heart", "heart"),
        ("Instagram", "instagram"),
        ("KeyRound", "key-round"),
        ("Lightbulb", "lightbulb"),
        ("Link", "link"),
        ("Linkedin", "linkedin"),
        ("ListVideo", "list-video"),
        ("Lock", "lock"),
        ("LogOut", "log-out"),
        ("Menu", "menu"),
        ("MessageSquare", "message-square"),
        ("Play", "play"),
        ("Plus", "plus"),
        ("Scale", "scale"),
        ("Search", "search"),
        ("Settings", "settings"),
        ("ShieldCheck", "shield-check"),
        ("Sparkles", "sparkles"),
        ("Twitter", "twitter"),
        ("User", "user"),
        ("Youtube", "youtube"),
    ])
});

/// Icon shown next to each social platform on a profile.
static PLATFORM_ICONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("instagram", "Instagram"),
        ("github", "Github"),
        ("youtube", "Youtube"),
        ("twitter", "Twitter"),
        ("linkedin", "Linkedin"),
        ("facebook", "Facebook"),
        ("website", "Globe"),
    ])
});

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Icon {
    name: &'static str,
    slug: &'static str,
}

impl Icon {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn slug(&self) -> &'static str {
        self.slug
    }
}

#[derive(Debug, Default)]
pub struct IconFactory {
    cache: FlyweightCache<Icon>,
}

impl IconFactory {
    /// Unknown names resolve to the shared [`FALLBACK_ICON`] instance.
    pub fn get(&self, name: &str) -> Arc<Icon> {
        let (name, slug) = match ICON_REGISTRY.get_key_value(name) {
            Some((name, slug)) => (*name, *slug),
            None => {
                tracing::debug!(icon = %name, "Unknown icon requested, using fallback");
                (FALLBACK_ICON, ICON_REGISTRY[FALLBACK_ICON])
            }
        };

        self.cache.get_or_insert_with(name, || Icon { name, slug })
    }

    pub fn for_platform(&self, platform: &str) -> Arc<Icon> {
        let name = PLATFORM_ICONS
            .get(platform.to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(FALLBACK_ICON);
        self.get(name)
    }

    #[cfg(test)]
    pub fn reset(&self) {
        self.cache.reset();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

}
