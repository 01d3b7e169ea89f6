//! Localized site strings, keyed by dotted keys such as `nav.home`.
//!
//! One table per locale. Tables are loaded wholesale (built-in defaults,
//! optionally extended from a JSON file) and never mutated afterwards.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::Locale;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("failed to read translations file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid translations file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Strings for a single locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct TranslationTable {
    entries: HashMap<String, String>,
}

impl TranslationTable {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn extend(&mut self, other: TranslationTable) {
        self.entries.extend(other.entries);
    }
}

impl<K, V> FromIterator<(K, V)> for TranslationTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Translation tables for every locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationCatalog {
    en: TranslationTable,
    fr: TranslationTable,
}

/// On-disk shape: `{"en": {...}, "fr": {...}}`. Either side may be omitted.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    en: TranslationTable,
    #[serde(default)]
    fr: TranslationTable,
}

impl TranslationCatalog {
    pub fn new(en: TranslationTable, fr: TranslationTable) -> Self {
        Self { en, fr }
    }

    /// The site's own strings.
    pub fn builtin() -> Self {
        Self {
            en: ENGLISH_STRINGS.iter().copied().collect(),
            fr: FRENCH_STRINGS.iter().copied().collect(),
        }
    }

    /// Built-in strings, overridden and extended by the entries in `path`.
    pub fn builtin_with_file(path: impl AsRef<Path>) -> Result<Self, TranslationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TranslationError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let file: CatalogFile =
            serde_json::from_str(&raw).map_err(|source| TranslationError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        let mut catalog = Self::builtin();
        catalog.en.extend(file.en);
        catalog.fr.extend(file.fr);
        Ok(catalog)
    }

    pub fn table(&self, locale: Locale) -> &TranslationTable {
        match locale {
            Locale::En => &self.en,
            Locale::Fr => &self.fr,
        }
    }

    /// Look `key` up in `locale` only. There is no cross-locale fallback.
    pub fn lookup(&self, locale: Locale, key: &str) -> Option<&str> {
        self.table(locale).get(key)
    }
}

impl Default for TranslationCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// ==================== English Strings ====================

/// English strings (canonical). Values may contain inline markup.
pub const ENGLISH_STRINGS: &[(&str, &str)] = &[
    ("nav.home", "Home"),
    ("nav.artists", "Artists"),
    ("nav.exhibitions", "Exhibitions"),
    ("nav.about", "About"),
    ("nav.contact", "Contact"),
    ("footer.about", "About"),
    (
        "footer.description",
        "Galerie Tremblay - A premier art gallery showcasing exceptional works from contemporary artists.",
    ),
    ("footer.quickLinks", "Quick Links"),
    ("footer.contact", "Contact"),
    (
        "footer.address",
        "186 Pl. Sutton<br>Beaconsfield, QC H9W 5S3<br>Canada",
    ),
    ("footer.rights", "All rights reserved."),
    (
        "fallback.message",
        "This page is not available in French. Showing English version.",
    ),
    ("fallback.notice", "Language Notice"),
];

// ==================== French Strings ====================

pub const FRENCH_STRINGS: &[(&str, &str)] = &[
    ("nav.home", "Accueil"),
    ("nav.artists", "Artistes"),
    ("nav.exhibitions", "Expositions"),
    ("nav.about", "À propos"),
    ("nav.contact", "Contact"),
    ("footer.about", "À propos"),
    (
        "footer.description",
        "Galerie Tremblay - Une galerie d'art de premier plan présentant des œuvres exceptionnelles d'artistes contemporains.",
    ),
    ("footer.quickLinks", "Liens rapides"),
    ("footer.contact", "Contact"),
    (
        "footer.address",
        "186 Pl. Sutton<br>Beaconsfield, QC H9W 5S3<br>Canada",
    ),
    ("footer.rights", "Tous droits réservés."),
    (
        "fallback.message",
        "Cette page n'est pas disponible en français. Affichage de la version anglaise.",
    ),
    ("fallback.notice", "Avis de langue"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;

    fn keys(strings: &'static [(&'static str, &'static str)]) -> HashSet<&'static str> {
        strings.iter().map(|(key, _)| *key).collect()
    }

    #[test]
    fn test_builtin_tables_have_the_same_keys() {
        assert_eq!(keys(ENGLISH_STRINGS), keys(FRENCH_STRINGS));
    }

    #[test]
    fn test_builtin_strings_are_non_empty() {
        for (key, value) in ENGLISH_STRINGS.iter().chain(FRENCH_STRINGS) {
            assert!(!value.trim().is_empty(), "empty string for {}", key);
        }
    }

    #[test]
    fn test_lookup_by_locale() {
        let catalog = TranslationCatalog::builtin();
        assert_eq!(catalog.lookup(Locale::En, "nav.home"), Some("Home"));
        assert_eq!(catalog.lookup(Locale::Fr, "nav.home"), Some("Accueil"));
    }

    #[test]
    fn test_lookup_never_crosses_locales() {
        let catalog = TranslationCatalog::new(
            [("only.english", "Hello")].into_iter().collect(),
            TranslationTable::default(),
        );
        assert_eq!(catalog.lookup(Locale::En, "only.english"), Some("Hello"));
        assert_eq!(catalog.lookup(Locale::Fr, "only.english"), None);
    }

    #[test]
    fn test_lookup_missing_key() {
        let catalog = TranslationCatalog::builtin();
        assert_eq!(catalog.lookup(Locale::En, "does.not.exist"), None);
    }

    #[test]
    fn test_file_overrides_and_extends_builtins() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"fr": {{"nav.home": "Page d'accueil", "nav.shop": "Boutique"}}}}"#
        )
        .expect("write");

        let catalog = TranslationCatalog::builtin_with_file(file.path()).expect("load");
        assert_eq!(catalog.lookup(Locale::Fr, "nav.home"), Some("Page d'accueil"));
        assert_eq!(catalog.lookup(Locale::Fr, "nav.shop"), Some("Boutique"));
        assert_eq!(catalog.lookup(Locale::Fr, "nav.artists"), Some("Artistes"));
        assert_eq!(catalog.lookup(Locale::En, "nav.home"), Some("Home"));
    }

    #[test]
    fn test_file_missing() {
        let err = TranslationCatalog::builtin_with_file("/nonexistent/strings.json").unwrap_err();
        assert!(matches!(err, TranslationError::Read { .. }));
    }

    #[test]
    fn test_file_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "not json").expect("write");

        let err = TranslationCatalog::builtin_with_file(file.path()).unwrap_err();
        assert!(matches!(err, TranslationError::Parse { .. }));
        assert!(err.to_string().contains("invalid translations file"));
    }
}
