use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Serialize;

use super::FlyweightCache;

pub const DEFAULT_LANGUAGE: &str = "pt";

/// Languages the UI is translated into, in menu order.
pub const SUPPORTED_LANGUAGES: [&str; 4] = ["pt", "en", "es", "fr"];

/// code -> (label, native name). `other` tags videos in any remaining language.
static LANGUAGE_REGISTRY: Lazy<HashMap<&'static str, (&'static str, &'static str)>> =
    Lazy::new(|| {
        HashMap::from([
            ("pt", ("PT", "Português")),
            ("en", ("EN", "English")),
            ("es", ("ES", "Español")),
            ("fr", ("FR", "Français")),
            ("other", ("OTHER", "Outro")),
        ])
    });

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    code: &'static str,
    label: &'static str,
    native_name: &'static str,
}

impl Language {
    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn native_name(&self) -> &'static str {
        self.native_name
    }
}

/// Maps any code to a registry code, falling back to [`DEFAULT_LANGUAGE`].
pub fn resolve_code(code: &str) -> &'static str {
    let normalized = code.trim().to_ascii_lowercase();
    LANGUAGE_REGISTRY
        .get_key_value(normalized.as_str())
        .map(|(code, _)| *code)
        .unwrap_or(DEFAULT_LANGUAGE)
}

pub fn is_registered(code: &str) -> bool {
    LANGUAGE_REGISTRY.contains_key(code)
}

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}

#[derive(Debug, Default)]
pub struct LanguageRegistry {
    cache: FlyweightCache<Language>,
}

impl LanguageRegistry {
    pub fn get(&self, code: &str) -> Arc<Language> {
        let code = resolve_code(code);
        self.cache.get_or_insert_with(code, || {
            let (label, native_name) = LANGUAGE_REGISTRY[code];
            Language {
                code,
                label,
                native_name,
            }
        })
    }

    pub fn default_language(&self) -> Arc<Language> {
        self.get(DEFAULT_LANGUAGE)
    }

    pub fn supported(&self) -> Vec<Arc<Language>> {
        SUPPORTED_LANGUAGES.iter().map(|code| self.get(code)).collect()
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
    fn same_code_returns_same_instance() {
        let languages = LanguageRegistry::default();
        assert!(Arc::ptr_eq(&languages.get("en"), &languages.get("en")));
    }

    #[test]
    fn different_codes_return_different_instances() {
        let languages = LanguageRegistry::default();
        assert!(!Arc::ptr_eq(&languages.get("en"), &languages.get("pt")));
    }

    #[test]
    fn unsupported_code_falls_back_to_default() {
        let languages = LanguageRegistry::default();
        let fallback = languages.get("xx-unsupported");

        assert_eq!(fallback.code(), DEFAULT_LANGUAGE);
        assert!(Arc::ptr_eq(&fallback, &languages.default_language()));
    }

    #[test]
    fn codes_are_normalized() {
        assert_eq!(resolve_code(" EN "), "en");
        assert_eq!(resolve_code(""), DEFAULT_LANGUAGE);
    }

    #[test]
    fn supported_languages_keep_menu_order() {
        let languages = LanguageRegistry::default();
        let codes: Vec<&str> = languages.supported().iter().map(|l| l.code()).collect();

        assert_eq!(codes, vec!["pt", "en", "es", "fr"]);
        assert!(!is_supported("other"));
        assert!(is_registered("other"));
    }

    #[test]
    fn reset_empties_the_cache() {
        let languages = LanguageRegistry::default();
        languages.supported();
        assert_eq!(languages.len(), 4);

        languages.reset();
        assert_eq!(languages.len(), 0);
    }
}
