//! Brings a rendered page in line with its locale state: shared fragments,
//! localized links, the language switcher and the fallback notice.
//!
//! Each step takes the document and an explicit [`Reconciliation`] so the
//! order is visible at the call site and steps can be re-run safely.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::document::{Document, NodeId};
use crate::fragments::{FragmentError, FragmentSource};
use crate::i18n::{relocalize_href, Locale, TranslationCatalog};
use crate::resolver::{resolve, PageUrl, ResolvedLocaleState};
use crate::translation::translate;

pub const HEADER_PLACEHOLDER: &str = "header-placeholder";
pub const FOOTER_PLACEHOLDER: &str = "footer-placeholder";
pub const DEFAULT_HEADER_FRAGMENT: &str = "/shared/header.html";
pub const DEFAULT_FOOTER_FRAGMENT: &str = "/shared/footer.html";

pub const NOTICE_CLASS: &str = "language-fallback-notice";
/// Marks a control that closes the enclosing notice.
pub const DISMISS_ATTR: &str = "data-dismiss";

const SWITCHER_CLASS: &str = "language-switcher";
const LOGO_CLASS: &str = "logo";
const ACTIVE_CLASS: &str = "active";
const LANG_ATTR: &str = "data-lang";

/// Where a page view is in the reconciliation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Stage {
    #[default]
    Init,
    LocaleResolved,
    FragmentsLoaded,
    LinksReconciled,
    NoticeShown,
    NoticeSkipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FragmentOutcome {
    #[default]
    Pending,
    Injected,
    Failed,
    TimedOut,
}

/// Per-view reconciliation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    state: ResolvedLocaleState,
    stage: Stage,
    header: FragmentOutcome,
    footer: FragmentOutcome,
    dismissed: bool,
}

impl Reconciliation {
    pub fn resolve(url: &PageUrl) -> Self {
        Self::from_state(resolve(url))
    }

    pub fn from_state(state: ResolvedLocaleState) -> Self {
        let mut reconciliation = Self {
            state,
            stage: Stage::Init,
            header: FragmentOutcome::Pending,
            footer: FragmentOutcome::Pending,
            dismissed: false,
        };
        reconciliation.advance(Stage::LocaleResolved);
        reconciliation
    }

    pub fn state(&self) -> &ResolvedLocaleState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn header(&self) -> FragmentOutcome {
        self.header
    }

    pub fn footer(&self) -> FragmentOutcome {
        self.footer
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }

    /// Stages only move forward; re-running an earlier step keeps the
    /// current stage.
    fn advance(&mut self, to: Stage) {
        if to > self.stage {
            debug!("Reconciliation {:?} -> {:?}", self.stage, to);
            self.stage = to;
        }
    }
}

/// Runs the whole sequence for one page view.
pub struct PageReconciler<F> {
    fragments: F,
    catalog: Arc<TranslationCatalog>,
    header_path: String,
    footer_path: String,
    fragment_timeout: Option<Duration>,
}

impl<F: FragmentSource> PageReconciler<F> {
    pub fn new(fragments: F, catalog: Arc<TranslationCatalog>) -> Self {
        Self {
            fragments,
            catalog,
            header_path: DEFAULT_HEADER_FRAGMENT.to_string(),
            footer_path: DEFAULT_FOOTER_FRAGMENT.to_string(),
            fragment_timeout: None,
        }
    }

    pub fn with_fragment_paths(mut self, header: &str, footer: &str) -> Self {
        self.header_path = header.to_string();
        self.footer_path = footer.to_string();
        self
    }

    /// Give up on fragments after `timeout` and continue with the page as is.
    pub fn with_fragment_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fragment_timeout = timeout;
        self
    }

    /// Fetch both fragments concurrently and inject them. Returns once both
    /// have settled. With a timeout, a fragment that has not arrived in time
    /// is given up on while the other one is still injected.
    pub async fn load_fragments(&self, doc: &mut Document, reconciliation: &mut Reconciliation) {
        let (header, footer) = futures::join!(
            self.fetch_fragment(&self.header_path),
            self.fetch_fragment(&self.footer_path)
        );

        reconciliation.header = match header {
            Some(fetched) => inject_fragment(doc, HEADER_PLACEHOLDER, fetched),
            None => FragmentOutcome::TimedOut,
        };
        reconciliation.footer = match footer {
            Some(fetched) => inject_fragment(doc, FOOTER_PLACEHOLDER, fetched),
            None => FragmentOutcome::TimedOut,
        };
        reconciliation.advance(Stage::FragmentsLoaded);
    }

    /// `None` when the fragment timeout elapsed first.
    async fn fetch_fragment(&self, path: &str) -> Option<Result<String, FragmentError>> {
        let Some(limit) = self.fragment_timeout else {
            return Some(self.fragments.fetch(path).await);
        };

        match tokio::time::timeout(limit, self.fragments.fetch(path)).await {
            Ok(fetched) => Some(fetched),
            Err(_) => {
                warn!(
                    "{} did not load within {:?}, keeping initial markup",
                    path, limit
                );
                None
            }
        }
    }

    /// Resolve, load fragments, reconcile links, show or skip the notice,
    /// then translate.
    pub async fn run(&self, doc: &mut Document, url: &PageUrl) -> Reconciliation {
        let mut reconciliation = Reconciliation::resolve(url);
        self.load_fragments(doc, &mut reconciliation).await;
        reconcile_links(doc, &mut reconciliation);
        show_fallback_notice(doc, &mut reconciliation);
        translate(doc, reconciliation.state().active(), &self.catalog);

        info!(
            "Reconciled {} as {} ({:?})",
            url,
            reconciliation.state().active().name(),
            reconciliation.stage()
        );
        reconciliation
    }
}

/// Put `fetched` into the element with id `placeholder`.
///
/// Any failure leaves the placeholder untouched.
pub fn inject_fragment(
    doc: &mut Document,
    placeholder: &str,
    fetched: Result<String, FragmentError>,
) -> FragmentOutcome {
    let html = match fetched {
        Ok(html) => html,
        Err(e) => {
            warn!("Skipping #{}: {}", placeholder, e);
            return FragmentOutcome::Failed;
        }
    };
    let Some(target) = doc.get_element_by_id(placeholder) else {
        warn!("Skipping fragment: page has no #{}", placeholder);
        return FragmentOutcome::Failed;
    };

    match doc.set_inner_html(target, &html) {
        Ok(()) => FragmentOutcome::Injected,
        Err(e) => {
            warn!("Skipping #{}: {}", placeholder, e);
            FragmentOutcome::Failed
        }
    }
}

/// Point nav/footer links, the logo and the language switcher at the
/// active locale, then mark the active switcher entry. Idempotent.
///
/// Returns the number of `href`s that changed.
pub fn reconcile_links(doc: &mut Document, reconciliation: &mut Reconciliation) -> usize {
    let state = reconciliation.state().clone();
    let active = state.active();
    let mut changed = 0;

    let landmark_links = doc.select(|element| element.tag() == "a" && element.attr("href").is_some());
    for link in landmark_links {
        let in_landmark =
            doc.has_ancestor(link, |element| matches!(element.tag(), "nav" | "footer"));
        if !in_landmark {
            continue;
        }
        let relocalized = doc
            .attr(link, "href")
            .and_then(|href| relocalize_href(href, active));
        if let Some(href) = relocalized {
            changed += update_href(doc, link, &href);
        }
    }

    if let Some(logo) = doc.select_first(|element| element.has_class(LOGO_CLASS)) {
        changed += update_href(doc, logo, &active.root_path());
    }

    for entry in switcher_entries(doc) {
        let Some(lang) = doc.attr(entry, LANG_ATTR).and_then(Locale::from_segment) else {
            continue;
        };
        changed += update_href(doc, entry, &state.path_in(lang));
    }

    mark_active_language(doc, active);
    reconciliation.advance(Stage::LinksReconciled);
    debug!("Reconciled links for {} ({} changed)", active, changed);
    changed
}

fn update_href(doc: &mut Document, id: NodeId, href: &str) -> usize {
    if doc.attr(id, "href") == Some(href) {
        return 0;
    }
    doc.set_attr(id, "href", href);
    1
}

fn switcher_entries(doc: &Document) -> Vec<NodeId> {
    doc.select(|element| element.tag() == "a" && element.attr(LANG_ATTR).is_some())
        .into_iter()
        .filter(|entry| doc.has_ancestor(*entry, |element| element.has_class(SWITCHER_CLASS)))
        .collect()
}

/// Give the switcher entry for `locale` the `active` class and take it
/// off every other entry.
pub fn mark_active_language(doc: &mut Document, locale: Locale) {
    for entry in switcher_entries(doc) {
        if doc.attr(entry, LANG_ATTR) == Some(locale.code()) {
            doc.add_class(entry, ACTIVE_CLASS);
        } else {
            doc.remove_class(entry, ACTIVE_CLASS);
        }
    }
}

/// Show the fallback notice for fallback views.
///
/// Reuses a notice already in the page and never shows one again after
/// it was dismissed. Returns the notice if it is on the page.
pub fn show_fallback_notice(
    doc: &mut Document,
    reconciliation: &mut Reconciliation,
) -> Option<NodeId> {
    if !reconciliation.state().is_fallback() {
        reconciliation.advance(Stage::NoticeSkipped);
        return None;
    }
    if reconciliation.is_dismissed() {
        return None;
    }

    let notice = match doc.select_first(|element| element.has_class(NOTICE_CLASS)) {
        Some(existing) => existing,
        None => build_notice(doc),
    };

    match doc.elements_by_tag("header").first() {
        Some(header) => doc.insert_after(*header, notice),
        None => {
            let body = doc.body();
            if doc.children(body).first() != Some(&notice) {
                doc.prepend_child(body, notice);
            }
        }
    }

    mark_active_language(doc, reconciliation.state().active());
    reconciliation.advance(Stage::NoticeShown);
    Some(notice)
}

fn build_notice(doc: &mut Document) -> NodeId {
    let notice = doc.create_element(
        "div",
        &[
            ("class", NOTICE_CLASS),
            ("data-i18n-notice", "fallback.notice"),
            ("role", "status"),
        ],
    );

    let message = doc.create_element("span", &[("data-i18n", "fallback.message")]);
    let text =
        doc.create_text("This page is not available in French. Showing English version.");
    doc.append_child(message, text);
    doc.append_child(notice, message);

    let button = doc.create_element(
        "button",
        &[
            ("type", "button"),
            ("class", "close-notice"),
            ("aria-label", "Close"),
            (DISMISS_ATTR, "notice"),
        ],
    );
    let label = doc.create_text("\u{00d7}");
    doc.append_child(button, label);
    doc.append_child(notice, button);

    notice
}

/// Handle activation of `control`. When it is (or sits inside) a dismiss
/// control of a notice, remove that notice and return `true`.
pub fn dismiss(doc: &mut Document, reconciliation: &mut Reconciliation, control: NodeId) -> bool {
    let Some(button) = doc.closest(control, |element| element.attr(DISMISS_ATTR).is_some()) else {
        return false;
    };
    let Some(notice) = doc.closest(button, |element| element.has_class(NOTICE_CLASS)) else {
        return false;
    };

    doc.detach(notice);
    reconciliation.dismissed = true;
    debug!("Fallback notice dismissed");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PAGE: &str = r##"<!DOCTYPE html><html><body><div id="header-placeholder"></div><main><h1>Jane Doe</h1><a href="/en/about.html">inline</a></main><div id="footer-placeholder"></div></body></html>"##;

    const HEADER: &str = r##"<header><a class="logo" href="/en/">Gallery</a><nav><a href="/en/artists.html" data-i18n="nav.artists">Artists</a><a href="https://example.org/">Shop</a><a href="#top">Top</a></nav><div class="language-switcher"><a data-lang="en" href="#">EN</a><a data-lang="fr" href="#">FR</a><a data-lang="de" href="#">DE</a></div></header>"##;

    const FOOTER: &str = r##"<footer><a href="/fr/contact.html">Contact</a><p data-i18n="footer.rights">All rights reserved.</p></footer>"##;

    struct MapFragments {
        pages: HashMap<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl MapFragments {
        fn site() -> Self {
            Self::with(&[
                (DEFAULT_HEADER_FRAGMENT, HEADER),
                (DEFAULT_FOOTER_FRAGMENT, FOOTER),
            ])
        }

        fn with(pages: &[(&'static str, &'static str)]) -> Self {
            Self {
                pages: pages.iter().copied().collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl FragmentSource for MapFragments {
        async fn fetch(&self, path: &str) -> Result<String, FragmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages
                .get(path)
                .map(|html| html.to_string())
                .ok_or_else(|| FragmentError::Status {
                    path: path.to_string(),
                    status: 404,
                })
        }
    }

    struct NeverFragments;

    impl FragmentSource for NeverFragments {
        fn fetch(&self, _path: &str) -> impl Future<Output = Result<String, FragmentError>> + Send {
            std::future::pending()
        }
    }

    fn reconciler<F: FragmentSource>(fragments: F) -> PageReconciler<F> {
        PageReconciler::new(fragments, Arc::new(TranslationCatalog::builtin()))
    }

    fn hrefs(doc: &Document) -> Vec<String> {
        doc.elements_by_tag("a")
            .into_iter()
            .filter_map(|a| doc.attr(a, "href").map(str::to_string))
            .collect()
    }

    fn switcher(doc: &Document, lang: &str) -> NodeId {
        doc.select_first(|element| element.attr(LANG_ATTR) == Some(lang))
            .unwrap()
    }

    fn notices(doc: &Document) -> usize {
        doc.elements_by_class(NOTICE_CLASS).len()
    }

    // ==================== Stage Tests ====================

    #[test]
    fn test_new_reconciliation_is_resolved() {
        let reconciliation = Reconciliation::resolve(&PageUrl::parse("/fr/"));
        assert_eq!(reconciliation.stage(), Stage::LocaleResolved);
        assert_eq!(reconciliation.header(), FragmentOutcome::Pending);
        assert!(Stage::Init < Stage::LocaleResolved);
    }

    // ==================== Fragment Tests ====================

    #[tokio::test]
    async fn test_fragments_are_injected() {
        let mut doc = Document::parse(PAGE).unwrap();
        let mut reconciliation = Reconciliation::resolve(&PageUrl::parse("/en/"));
        let reconciler = reconciler(MapFragments::site());

        reconciler.load_fragments(&mut doc, &mut reconciliation).await;

        assert_eq!(reconciliation.stage(), Stage::FragmentsLoaded);
        assert_eq!(reconciliation.header(), FragmentOutcome::Injected);
        assert_eq!(reconciliation.footer(), FragmentOutcome::Injected);
        let placeholder = doc.get_element_by_id(HEADER_PLACEHOLDER).unwrap();
        assert!(doc.inner_html(placeholder).starts_with("<header>"));
        assert_eq!(reconciler.fragments.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fragment_keeps_placeholder() {
        let mut doc = Document::parse(PAGE).unwrap();
        let mut reconciliation = Reconciliation::resolve(&PageUrl::parse("/en/"));
        let reconciler = reconciler(MapFragments::with(&[(DEFAULT_FOOTER_FRAGMENT, FOOTER)]));

        reconciler.load_fragments(&mut doc, &mut reconciliation).await;

        assert_eq!(reconciliation.header(), FragmentOutcome::Failed);
        assert_eq!(reconciliation.footer(), FragmentOutcome::Injected);
        let placeholder = doc.get_element_by_id(HEADER_PLACEHOLDER).unwrap();
        assert!(doc.children(placeholder).is_empty());
        assert_eq!(reconciliation.stage(), Stage::FragmentsLoaded);
    }

    #[test]
    fn test_inject_into_missing_placeholder() {
        let mut doc = Document::parse("<main></main>").unwrap();
        let outcome = inject_fragment(&mut doc, HEADER_PLACEHOLDER, Ok(HEADER.to_string()));
        assert_eq!(outcome, FragmentOutcome::Failed);
        assert_eq!(doc.to_html(), "<main></main>");
    }

    #[test]
    fn test_inject_unparseable_fragment() {
        let mut doc = Document::parse(PAGE).unwrap();
        let outcome = inject_fragment(&mut doc, HEADER_PLACEHOLDER, Ok("<header".to_string()));
        assert_eq!(outcome, FragmentOutcome::Failed);
    }

    #[tokio::test]
    async fn test_fragment_timeout_proceeds_with_initial_markup() {
        let mut doc = Document::parse(PAGE).unwrap();
        let before = doc.to_html();
        let reconciler = reconciler(NeverFragments)
            .with_fragment_timeout(Some(Duration::from_millis(20)));

        let reconciliation = reconciler.run(&mut doc, &PageUrl::parse("/fr/")).await;

        assert_eq!(reconciliation.header(), FragmentOutcome::TimedOut);
        assert_eq!(reconciliation.stage(), Stage::NoticeSkipped);
        assert_eq!(doc.to_html(), before);
    }

    struct HeaderOnlyFragments;

    impl FragmentSource for HeaderOnlyFragments {
        fn fetch(&self, path: &str) -> impl Future<Output = Result<String, FragmentError>> + Send {
            let header = (path == DEFAULT_HEADER_FRAGMENT).then(|| HEADER.to_string());
            async move {
                match header {
                    Some(html) => Ok(html),
                    None => std::future::pending().await,
                }
            }
        }
    }

    #[tokio::test]
    async fn test_fragment_timeout_keeps_loaded_header() {
        let mut doc = Document::parse(PAGE).unwrap();
        let reconciler = reconciler(HeaderOnlyFragments)
            .with_fragment_timeout(Some(Duration::from_millis(50)));

        let reconciliation = reconciler.run(&mut doc, &PageUrl::parse("/fr/x.html")).await;

        assert_eq!(reconciliation.header(), FragmentOutcome::Injected);
        assert_eq!(reconciliation.footer(), FragmentOutcome::TimedOut);
        let header = doc.get_element_by_id(HEADER_PLACEHOLDER).unwrap();
        assert!(doc.inner_html(header).starts_with("<header>"));
        let footer = doc.get_element_by_id(FOOTER_PLACEHOLDER).unwrap();
        assert!(doc.children(footer).is_empty());
        // The header that did arrive is still localized
        assert_eq!(doc.attr(switcher(&doc, "fr"), "href"), Some("/fr/x.html"));
    }

    // ==================== Link Tests ====================

    #[tokio::test]
    async fn test_french_page_links() {
        let mut doc = Document::parse(PAGE).unwrap();
        let reconciliation = reconciler(MapFragments::site())
            .run(&mut doc, &PageUrl::parse("/fr/exhibitions/2024.html"))
            .await;

        assert_eq!(reconciliation.stage(), Stage::NoticeSkipped);
        assert_eq!(
            hrefs(&doc),
            vec![
                "/fr/",
                "/fr/artists.html",
                "https://example.org/",
                "#top",
                "/en/exhibitions/2024.html",
                "/fr/exhibitions/2024.html",
                "#",
                // main content is not a landmark
                "/en/about.html",
                "/fr/contact.html",
            ]
        );
        assert!(doc.has_class(switcher(&doc, "fr"), ACTIVE_CLASS));
        assert!(!doc.has_class(switcher(&doc, "en"), ACTIVE_CLASS));
    }

    #[tokio::test]
    async fn test_english_root_links() {
        let mut doc = Document::parse(PAGE).unwrap();
        reconciler(MapFragments::site())
            .run(&mut doc, &PageUrl::parse("/en/"))
            .await;

        assert_eq!(doc.attr(switcher(&doc, "fr"), "href"), Some("/fr/"));
        assert_eq!(doc.attr(switcher(&doc, "en"), "href"), Some("/en/"));
        let footer_link = doc.elements_by_tag("footer")[0];
        assert!(doc
            .outer_html(footer_link)
            .contains(r#"href="/en/contact.html""#));
    }

    #[test]
    fn test_reconcile_links_without_landmarks() {
        let html = r#"<p><a href="/fr/x.html">x</a></p>"#;
        let mut doc = Document::parse(html).unwrap();
        let mut reconciliation = Reconciliation::resolve(&PageUrl::parse("/en/"));

        assert_eq!(reconcile_links(&mut doc, &mut reconciliation), 0);
        assert_eq!(doc.to_html(), html);
        assert_eq!(reconciliation.stage(), Stage::LinksReconciled);
    }

    #[test]
    fn test_reconcile_links_reentry() {
        let html = format!("<body>{}{}</body>", HEADER, FOOTER);
        let mut doc = Document::parse(&html).unwrap();
        let mut reconciliation = Reconciliation::resolve(&PageUrl::parse("/fr/about.html"));

        assert!(reconcile_links(&mut doc, &mut reconciliation) > 0);
        let once = doc.to_html();
        assert_eq!(reconcile_links(&mut doc, &mut reconciliation), 0);
        assert_eq!(doc.to_html(), once);
    }

    proptest! {
        #[test]
        fn prop_reconcile_links_is_idempotent(
            page in prop_oneof![
                Just("/"), Just("/en/"), Just("/fr/"), Just("/fr/about.html"),
                Just("/en/artists/jane-doe.html?fallback=en"), Just("/fr/a/b?x=1"),
            ],
            targets in proptest::collection::vec(
                prop_oneof![Just("/en/"), Just("/fr/x.html"), Just("/de/y.html"), Just("#"), Just("/fr")],
                0..5,
            ),
        ) {
            let links: String = targets
                .iter()
                .map(|href| format!(r#"<a href="{}">l</a>"#, href))
                .collect();
            let html = format!("<body><nav>{}</nav>{}{}</body>", links, HEADER, FOOTER);
            let mut doc = Document::parse(&html).unwrap();
            let mut reconciliation = Reconciliation::resolve(&PageUrl::parse(page));

            reconcile_links(&mut doc, &mut reconciliation);
            let once = doc.to_html();
            reconcile_links(&mut doc, &mut reconciliation);
            prop_assert_eq!(doc.to_html(), once);
        }
    }

    // ==================== Notice Tests ====================

    #[tokio::test]
    async fn test_fallback_notice_after_header() {
        let mut doc = Document::parse(PAGE).unwrap();
        let reconciliation = reconciler(MapFragments::site())
            .run(&mut doc, &PageUrl::parse("/en/artists/jane-doe.html?fallback=en"))
            .await;

        assert_eq!(reconciliation.stage(), Stage::NoticeShown);
        assert_eq!(notices(&doc), 1);

        let header = doc.elements_by_tag("header")[0];
        let notice = doc.elements_by_class(NOTICE_CLASS)[0];
        assert_eq!(doc.parent(notice), doc.parent(header));
        let siblings = doc.children(doc.parent(header).unwrap());
        let at = siblings.iter().position(|id| *id == header).unwrap();
        assert_eq!(siblings.get(at + 1), Some(&notice));

        assert!(doc.has_class(switcher(&doc, "en"), ACTIVE_CLASS));
        assert!(!doc.has_class(switcher(&doc, "fr"), ACTIVE_CLASS));
        assert_eq!(doc.attr(switcher(&doc, "fr"), "href"), Some("/fr/artists/jane-doe.html"));
        assert!(doc
            .text_content(notice)
            .contains("This page is not available in French"));
    }

    #[test]
    fn test_fallback_notice_without_header_goes_first_in_body() {
        let mut doc = Document::parse("<html><body><main>x</main></body></html>").unwrap();
        let mut reconciliation = Reconciliation::resolve(&PageUrl::parse("/en/?fallback=en"));

        let notice = show_fallback_notice(&mut doc, &mut reconciliation).unwrap();
        let body = doc.body();
        assert_eq!(doc.children(body).first(), Some(&notice));
        assert_eq!(
            doc.outer_html(notice),
            "<div class=\"language-fallback-notice\" data-i18n-notice=\"fallback.notice\" role=\"status\"><span data-i18n=\"fallback.message\">This page is not available in French. Showing English version.</span><button type=\"button\" class=\"close-notice\" aria-label=\"Close\" data-dismiss=\"notice\">\u{00d7}</button></div>"
        );
    }

    #[test]
    fn test_fallback_notice_is_never_duplicated() {
        let mut doc = Document::parse(&format!("<body>{}<main></main></body>", HEADER)).unwrap();
        let mut reconciliation = Reconciliation::resolve(&PageUrl::parse("/en/?fallback=en"));

        let first = show_fallback_notice(&mut doc, &mut reconciliation);
        let once = doc.to_html();
        let second = show_fallback_notice(&mut doc, &mut reconciliation);

        assert_eq!(first, second);
        assert_eq!(notices(&doc), 1);
        assert_eq!(doc.to_html(), once);
        assert_eq!(reconciliation.stage(), Stage::NoticeShown);
    }

    #[test]
    fn test_notice_skipped_without_marker() {
        let mut doc = Document::parse(PAGE).unwrap();
        let mut reconciliation = Reconciliation::resolve(&PageUrl::parse("/en/about.html"));

        assert_eq!(show_fallback_notice(&mut doc, &mut reconciliation), None);
        assert_eq!(notices(&doc), 0);
        assert_eq!(reconciliation.stage(), Stage::NoticeSkipped);
    }

    #[tokio::test]
    async fn test_translated_notice() {
        let mut doc = Document::parse(PAGE).unwrap();
        reconciler(MapFragments::site())
            .run(&mut doc, &PageUrl::parse("/en/?fallback=en"))
            .await;

        // Fallback views are English, so the footer keeps its English string
        let rights = doc
            .select_first(|element| element.attr("data-i18n") == Some("footer.rights"))
            .unwrap();
        assert_eq!(doc.text_content(rights), "All rights reserved.");
    }

    // ==================== Dismiss Tests ====================

    #[test]
    fn test_dismiss_removes_notice() {
        let mut doc = Document::parse("<body><main></main></body>").unwrap();
        let mut reconciliation = Reconciliation::resolve(&PageUrl::parse("/en/?fallback=en"));
        show_fallback_notice(&mut doc, &mut reconciliation);

        let button = doc.select_first(|element| element.tag() == "button").unwrap();
        assert!(dismiss(&mut doc, &mut reconciliation, button));
        assert_eq!(notices(&doc), 0);
        assert!(reconciliation.is_dismissed());

        // Re-entering the notice step does not bring it back
        assert_eq!(show_fallback_notice(&mut doc, &mut reconciliation), None);
        assert_eq!(notices(&doc), 0);
    }

    #[test]
    fn test_dismiss_from_button_label() {
        let mut doc = Document::parse("<body></body>").unwrap();
        let mut reconciliation = Reconciliation::resolve(&PageUrl::parse("/en/?fallback=en"));
        show_fallback_notice(&mut doc, &mut reconciliation);

        let button = doc.select_first(|element| element.tag() == "button").unwrap();
        let label = doc.children(button)[0];
        assert!(dismiss(&mut doc, &mut reconciliation, label));
        assert_eq!(notices(&doc), 0);
    }

    #[test]
    fn test_dismiss_ignores_other_controls() {
        let mut doc = Document::parse(PAGE).unwrap();
        let mut reconciliation = Reconciliation::resolve(&PageUrl::parse("/en/?fallback=en"));
        show_fallback_notice(&mut doc, &mut reconciliation);

        let heading = doc.elements_by_tag("h1")[0];
        assert!(!dismiss(&mut doc, &mut reconciliation, heading));
        assert_eq!(notices(&doc), 1);
        assert!(!reconciliation.is_dismissed());
    }
}
