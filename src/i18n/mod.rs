//! Locale model shared by the edge router and the page reconciler.
//!
//! # Architecture
//!
//! - `locale`: the `Locale` enum and `Accept-Language` preference
//! - `path`: path⇄locale parsing and the `fallback=en` query marker
//! - `strings`: per-locale translation tables
//!
//! Nothing in here performs I/O except loading a translations file, so the
//! same rules apply on both sides of the request boundary.
//!
//! # Example
//!
//! ```rust
//! use locale_router::i18n::{LocalePath, Locale};
//!
//! let path = LocalePath::parse("/fr/exhibitions/2024");
//! assert_eq!(path.prefix(), Some(Locale::Fr));
//! assert_eq!(path.path_without_locale(), "/exhibitions/2024");
//! ```

mod locale;
mod path;
mod strings;

pub use locale::{Locale, UnknownLocale};
pub use path::{
    has_fallback_marker, localized_page_path, query_param, relocalize_href, swap_prefix,
    with_fallback_marker, LocalePath, FALLBACK_PARAM, FALLBACK_VALUE,
};
pub use strings::{
    TranslationCatalog, TranslationError, TranslationTable, ENGLISH_STRINGS, FRENCH_STRINGS,
};
