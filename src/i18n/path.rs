//! Path⇄locale rules shared by the edge router and the page reconciler.
//!
//! Everything here is pure string manipulation so that both sides of the
//! request boundary derive exactly the same answers.

use super::Locale;

/// Query parameter name carrying the fallback marker.
pub const FALLBACK_PARAM: &str = "fallback";

/// Marker value: English content served in place of a missing French page.
pub const FALLBACK_VALUE: &str = "en";

/// A URL path split into an optional locale prefix and the remaining segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalePath {
    prefix: Option<Locale>,
    segments: Vec<String>,
}

impl LocalePath {
    /// Split `path` on `/`, dropping empty segments. The first segment is
    /// the prefix only when it is exactly `en` or `fr`.
    pub fn parse(path: &str) -> Self {
        let mut segments: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        let prefix = segments
            .first()
            .and_then(|segment| Locale::from_segment(segment));
        if prefix.is_some() {
            segments.remove(0);
        }

        Self { prefix, segments }
    }

    pub fn prefix(&self) -> Option<Locale> {
        self.prefix
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True when nothing follows the (optional) prefix.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The un-localized identity of the page, e.g. `/exhibitions/2024`.
    /// Always starts with `/`; the root is `/`.
    pub fn path_without_locale(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Replace a leading `/{from}/` with `/{to}/`.
///
/// Returns `None` if `path` does not start with `/{from}/`.
pub fn swap_prefix(path: &str, from: Locale, to: Locale) -> Option<String> {
    let rest = path
        .strip_prefix('/')?
        .strip_prefix(from.code())?
        .strip_prefix('/')?;
    Some(format!("/{}/{}", to.code(), rest))
}

/// If `href` starts with any locale prefix, return it with the prefix set
/// to `target`. Applying it twice gives the same result as applying it once.
pub fn relocalize_href(href: &str, target: Locale) -> Option<String> {
    Locale::ALL
        .into_iter()
        .find_map(|from| swap_prefix(href, from, target))
}

/// Path of the page identified by `path_without_locale` in `locale`.
///
/// The root maps to `/{locale}/`. Any other path loses a trailing `.html`
/// and gets the locale prefix and a `.html` suffix, so
/// `/exhibitions/2024` becomes `/fr/exhibitions/2024.html`.
pub fn localized_page_path(locale: Locale, path_without_locale: &str) -> String {
    let trimmed = path_without_locale.trim_end_matches('/');
    if trimmed.is_empty() {
        return locale.root_path();
    }

    let clean = trimmed.strip_suffix(".html").unwrap_or(trimmed);
    let clean = if clean.starts_with('/') {
        clean.to_string()
    } else {
        format!("/{}", clean)
    };
    format!("/{}{}.html", locale.code(), clean)
}

/// First value of `name` in a raw query string (no leading `?`).
pub fn query_param<'a>(query: Option<&'a str>, name: &str) -> Option<&'a str> {
    query?
        .split('&')
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == name).then_some(value)
        })
}

/// True when the query carries `fallback=en`.
pub fn has_fallback_marker(query: Option<&str>) -> bool {
    query_param(query, FALLBACK_PARAM) == Some(FALLBACK_VALUE)
}

/// `path` with `fallback=en` added to `query`.
///
/// Existing pairs are kept exactly as written, in order; `&` joins onto an
/// existing query and `?` starts a new one. Any existing `fallback` pair is
/// replaced so the marker never appears twice.
pub fn with_fallback_marker(path: &str, query: Option<&str>) -> String {
    let marker = format!("{}={}", FALLBACK_PARAM, FALLBACK_VALUE);
    let mut pairs: Vec<&str> = match query {
        Some(query) if !query.is_empty() => query
            .split('&')
            .filter(|pair| pair.split('=').next() != Some(FALLBACK_PARAM))
            .collect(),
        _ => Vec::new(),
    };
    pairs.push(&marker);

    format!("{}?{}", path, pairs.join("&"))
}
