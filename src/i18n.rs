//! Translation dictionaries served to the web client.
//!
//! Locale files are nested JSON (`{"auth": {"error": {...}}}`); they are
//! flattened into dotted keys (`auth.error.invalidEmail`) once at startup.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::flyweights::language::{is_supported, resolve_code, DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES};

pub type Dictionary = BTreeMap<String, String>;

const FALLBACK_LANGUAGE: &str = "en";

#[derive(Debug, Default)]
pub struct Locales {
    dictionaries: HashMap<&'static str, Arc<Dictionary>>,
}

impl Locales {
    /// Reads `{code}.json` for every supported language. A missing or broken
    /// file leaves that language empty rather than failing startup.
    pub fn load(dir: &Path) -> Self {
        let mut dictionaries = HashMap::new();
        for code in SUPPORTED_LANGUAGES {
            let path = dir.join(format!("{}.json", code));
            let dictionary = match std::fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|raw| Ok(serde_json::from_str::<Value>(&raw)?))
            {
                Ok(value) => flatten(&value),
                Err(e) => {
                    tracing::warn!("Could not load locale {}: {}", path.display(), e);
                    Dictionary::new()
                }
            };
            tracing::debug!("Loaded {} translations for {}", dictionary.len(), code);
            dictionaries.insert(code, Arc::new(dictionary));
        }
        Self { dictionaries }
    }

    #[cfg(test)]
    pub fn from_dictionaries(entries: impl IntoIterator<Item = (&'static str, Dictionary)>) -> Self {
        Self {
            dictionaries: entries
                .into_iter()
                .map(|(code, dict)| (code, Arc::new(dict)))
                .collect(),
        }
    }

    /// Dictionary for `code`; unsupported codes get the default language's.
    pub fn dictionary(&self, code: &str) -> Arc<Dictionary> {
        let code = resolve_supported(code);
        self.dictionaries.get(code).cloned().unwrap_or_default()
    }

    /// Looks `key` up in `code`, then in English, then returns the key itself.
    pub fn translate(&self, code: &str, key: &str) -> String {
        [resolve_supported(code), FALLBACK_LANGUAGE]
            .iter()
            .find_map(|c| self.dictionaries.get(c).and_then(|d| d.get(key)).cloned())
            .unwrap_or_else(|| key.to_string())
    }
}

/// The UI only ships translations for the supported languages.
pub fn resolve_supported(code: &str) -> &'static str {
    // Browsers report region tags such as `en-US`.
    let primary = code.split(['-', '_']).next().unwrap_or(code);
    let code = resolve_code(primary);
    if is_supported(code) {
        code
    } else {
        DEFAULT_LANGUAGE
    }
}

pub fn flatten(value: &Value) -> Dictionary {
    let mut out = Dictionary::new();
    flatten_into(value, String::new(), &mut out);
    out
}

fn flatten_into(value: &Value, prefix: String, out: &mut Dictionary) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(nested, path, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix, s.clone());
        }
        Value::Null => {}
        other => {
            out.insert(prefix, other.to_string());
        }
    }
}
