//! Localization infrastructure
//!
//! Message catalogs are YAML maps (`key: text`) embedded at build time, one
//! per language. A [`Localizer`] binds the catalogs to one tenant language.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};

const EMBEDDED_CATALOGS: [(&str, &str); 3] = [
    ("en", include_str!("../../../translations/translate.en.yml")),
    ("ru", include_str!("../../../translations/translate.ru.yml")),
    ("es", include_str!("../../../translations/translate.es.yml")),
];

/// All loaded message catalogs plus the fallback language.
#[derive(Debug)]
pub struct Translations {
    catalogs: HashMap<String, HashMap<String, String>>,
    default_lang: String,
}

impl Translations {
    /// Load the catalogs shipped with the binary.
    pub fn embedded(default_lang: &str) -> DomainResult<Self> {
        Self::from_sources(default_lang, &EMBEDDED_CATALOGS)
    }

    /// Parse catalogs from `(language, yaml)` pairs.
    pub fn from_sources(default_lang: &str, sources: &[(&str, &str)]) -> DomainResult<Self> {
        let mut catalogs = HashMap::new();
        for (lang, source) in sources {
            let catalog: HashMap<String, String> = serde_yaml::from_str(source).map_err(|e| {
                DomainError::Localization(format!("invalid translation catalog '{lang}': {e}"))
            })?;
            catalogs.insert(lang.to_ascii_lowercase(), catalog);
        }

        let default_lang = default_lang.to_ascii_lowercase();
        if !catalogs.contains_key(&default_lang) {
            return Err(DomainError::Localization(format!(
                "no translation catalog for default language '{default_lang}'"
            )));
        }

        Ok(Self {
            catalogs,
            default_lang,
        })
    }

    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// Loaded languages, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.catalogs.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }

    /// Resolve a locale tag such as `ru`, `ru-RU` or `es_ES` to a loaded language.
    pub fn match_lang(&self, tag: &str) -> &str {
        let primary = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        self.catalogs
            .get_key_value(&primary)
            .map_or(self.default_lang.as_str(), |(lang, _)| lang.as_str())
    }

    /// Look up `key` in `lang`, then in the default language, then echo the key.
    pub fn localize(&self, lang: &str, key: &str) -> String {
        if let Some(text) = self.catalogs.get(lang).and_then(|c| c.get(key)) {
            return text.clone();
        }
        if let Some(text) = self.catalogs.get(&self.default_lang).and_then(|c| c.get(key)) {
            tracing::debug!(lang, key, "translation missing, using default language");
            return text.clone();
        }
        tracing::warn!(lang, key, "translation missing in every catalog");
        key.to_string()
    }

    /// Keys present in some catalog but absent from `lang`.
    pub fn missing_keys(&self, lang: &str) -> Vec<String> {
        let all: BTreeSet<&String> = self.catalogs.values().flat_map(HashMap::keys).collect();
        let Some(catalog) = self.catalogs.get(lang) else {
            return all.into_iter().cloned().collect();
        };
        all.into_iter()
            .filter(|key| !catalog.contains_key(*key))
            .cloned()
            .collect()
    }

    /// Build a localizer for a tenant locale tag.
    pub fn localizer(self: &Arc<Self>, tag: &str) -> Localizer {
        Localizer {
            lang: self.match_lang(tag).to_string(),
            translations: Arc::clone(self),
        }
    }
}

/// Message lookup bound to one language.
#[derive(Debug, Clone)]
pub struct Localizer {
    translations: Arc<Translations>,
    lang: String,
}

impl Localizer {
    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn localize(&self, key: &str) -> String {
        self.translations.localize(&self.lang, key)
    }
}
