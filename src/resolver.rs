//! Works out which locale a page is being viewed in.

use std::fmt;

use reqwest::Url;
use tracing::{debug, warn};

use crate::i18n::{
    has_fallback_marker, localized_page_path, with_fallback_marker, Locale, LocalePath,
    FALLBACK_PARAM, FALLBACK_VALUE,
};
use crate::probe::{PageProbe, ProbeStatus};

/// The path and query of a page URL. Scheme, host and fragment are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    path: String,
    query: Option<String>,
}

impl PageUrl {
    pub fn new(path: impl Into<String>, query: Option<String>) -> Self {
        let path = path.into();
        Self {
            path: if path.is_empty() { "/".to_string() } else { path },
            query: query.filter(|q| !q.is_empty()),
        }
    }

    /// Accepts an absolute URL (`https://host/fr/?a=b`) or a bare
    /// path-and-query (`/fr/?a=b`).
    pub fn parse(reference: &str) -> Self {
        if reference.contains("://") {
            if let Ok(url) = Url::parse(reference) {
                return Self::from(&url);
            }
        }

        let without_fragment = reference.split('#').next().unwrap_or_default();
        match without_fragment.split_once('?') {
            Some((path, query)) => Self::new(path, Some(query.to_string())),
            None => Self::new(without_fragment, None),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

impl From<&Url> for PageUrl {
    fn from(url: &Url) -> Self {
        Self::new(url.path(), url.query().map(str::to_string))
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}?{}", self.path, query),
            None => write!(f, "{}", self.path),
        }
    }
}

/// Locale state of one page view.
///
/// A fallback view is always English: there is no way to build a state
/// with `is_fallback` set and French active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocaleState {
    active: Locale,
    is_fallback: bool,
    path_without_locale: String,
}

impl ResolvedLocaleState {
    pub fn active(&self) -> Locale {
        self.active
    }

    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    pub fn path_without_locale(&self) -> &str {
        &self.path_without_locale
    }

    /// Canonical URL for this state: the active prefix, the page path, and
    /// the fallback marker when set.
    pub fn to_page_url(&self) -> PageUrl {
        let path = if self.path_without_locale == "/" {
            self.active.root_path()
        } else {
            format!("/{}{}", self.active.code(), self.path_without_locale)
        };
        let query = self
            .is_fallback
            .then(|| format!("{}={}", FALLBACK_PARAM, FALLBACK_VALUE));
        PageUrl::new(path, query)
    }

    /// Path of the same page in `locale`, as linked from the language switcher.
    pub fn path_in(&self, locale: Locale) -> String {
        localized_page_path(locale, &self.path_without_locale)
    }
}

/// Derive the locale state from a page URL. Pure.
pub fn resolve(url: &PageUrl) -> ResolvedLocaleState {
    let parsed = LocalePath::parse(url.path());
    let is_fallback = has_fallback_marker(url.query());
    let active = if parsed.prefix() == Some(Locale::Fr) && !is_fallback {
        Locale::Fr
    } else {
        Locale::En
    };

    ResolvedLocaleState {
        active,
        is_fallback,
        path_without_locale: parsed.path_without_locale(),
    }
}

/// Client-side check that a French page really exists.
///
/// Returns the English fallback URL when the French page is missing (or
/// the probe fails), `None` when there is nothing to do.
pub async fn client_fallback_target<P: PageProbe>(
    probe: &P,
    state: &ResolvedLocaleState,
) -> Option<String> {
    if state.active() != Locale::Fr {
        return None;
    }

    let (french, english) = if state.path_without_locale() == "/" {
        ("/fr/index.html".to_string(), "/en/index.html".to_string())
    } else {
        (state.path_in(Locale::Fr), state.path_in(Locale::En))
    };

    match probe.probe(&french).await {
        Ok(ProbeStatus::NotFound) => {
            debug!("{} is missing, falling back to English", french);
            Some(with_fallback_marker(&english, None))
        }
        Ok(_) => None,
        Err(e) => {
            warn!("Could not verify {}: {}", french, e);
            Some(with_fallback_marker(&english, None))
        }
    }
}
