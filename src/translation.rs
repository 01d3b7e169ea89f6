//! Applies localized strings to `data-i18n` elements.

use tracing::{debug, trace};

use crate::document::{Document, NodeId};
use crate::i18n::{Locale, TranslationCatalog};

/// Attribute naming the translation key of an element.
pub const I18N_ATTR: &str = "data-i18n";

enum Target {
    Value,
    Placeholder,
    Content,
}

/// Translate every `data-i18n` element into `locale`.
///
/// Keys missing from the locale's table leave the element as it is.
/// Returns how many elements were updated.
pub fn translate(doc: &mut Document, locale: Locale, catalog: &TranslationCatalog) -> usize {
    let mut applied = 0;

    for id in doc.select(|element| element.attr(I18N_ATTR).is_some()) {
        // An earlier replacement may have removed this element
        if !doc.is_attached(id) {
            continue;
        }
        let Some(key) = doc.attr(id, I18N_ATTR).map(str::to_string) else {
            continue;
        };
        let Some(value) = catalog.lookup(locale, &key) else {
            trace!("No {} string for '{}'", locale, key);
            continue;
        };

        apply(doc, id, &key, value);
        applied += 1;
    }

    debug!("Translated {} elements into {}", applied, locale.name());
    applied
}

fn target_of(doc: &Document, id: NodeId) -> Option<Target> {
    let element = doc.element(id)?;
    let is_submit = element.tag() == "input"
        && element
            .attr("type")
            .map(|t| t.eq_ignore_ascii_case("submit"))
            .unwrap_or(false);

    Some(if is_submit {
        Target::Value
    } else if element.attr("placeholder").is_some() {
        Target::Placeholder
    } else {
        Target::Content
    })
}

fn apply(doc: &mut Document, id: NodeId, key: &str, value: &str) {
    match target_of(doc, id) {
        Some(Target::Value) => doc.set_attr(id, "value", value),
        Some(Target::Placeholder) => doc.set_attr(id, "placeholder", value),
        Some(Target::Content) => {
            if let Err(e) = doc.set_inner_html(id, value) {
                debug!("String '{}' is not valid markup ({}), using text", key, e);
                doc.set_text(id, value);
            }
        }
        None => {}
    }
}
