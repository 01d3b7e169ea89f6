//! Locale type: the two languages the site is published in.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A site locale.
///
/// English is the canonical locale: every page exists in English, and
/// French pages may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Locale {
    En,
    Fr,
}

/// Returned when a string is not one of the supported locale codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown locale code: '{0}'")]
pub struct UnknownLocale(pub String);

impl Locale {
    /// All locales, canonical first.
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Fr];

    /// ISO 639-1 code, also used as the URL prefix segment.
    pub const fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
        }
    }

    /// English name of the language.
    pub const fn name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Fr => "French",
        }
    }

    /// Exact segment match, as used when reading a path prefix.
    ///
    /// Unlike [`FromStr`], this is case-sensitive: `/FR/` is not a locale
    /// prefix.
    pub fn from_segment(segment: &str) -> Option<Locale> {
        match segment {
            "en" => Some(Locale::En),
            "fr" => Some(Locale::Fr),
            _ => None,
        }
    }

    /// `/{code}/`, the root page of this locale.
    pub fn root_path(self) -> String {
        format!("/{}/", self.code())
    }

    /// Pick the preferred locale from an `Accept-Language` header value.
    ///
    /// Only the first entry counts: French if it starts with `fr`
    /// (ignoring ASCII case), English otherwise. A missing or empty header
    /// yields English.
    pub fn from_accept_language(header: Option<&str>) -> Locale {
        let first = header
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .unwrap_or_default();

        let is_french = first
            .get(..2)
            .map(|tag| tag.eq_ignore_ascii_case("fr"))
            .unwrap_or(false);

        if is_french {
            Locale::Fr
        } else {
            Locale::En
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Locale::ALL
            .into_iter()
            .find(|locale| locale.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| UnknownLocale(s.to_string()))
    }
}
