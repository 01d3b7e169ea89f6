//! Request-time routing in front of the static site.
//!
//! Sends visitors of `/` to their preferred locale, and sends requests
//! for French pages that do not exist to the English page with the
//! fallback marker. Everything else passes through.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, warn};

use crate::i18n::{swap_prefix, with_fallback_marker, Locale};
use crate::probe::{PageProbe, ProbeStatus, PROBE_HEADER};

pub const DEFAULT_BYPASS_PREFIXES: &[&str] = &["/assets/", "/shared/"];

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Forward,
    /// 302 to the given location.
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRules {
    bypass_prefixes: Vec<String>,
}

impl RoutingRules {
    pub fn new(bypass_prefixes: Vec<String>) -> Self {
        Self { bypass_prefixes }
    }

    pub fn is_bypassed(&self, path: &str) -> bool {
        self.bypass_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn is_root(path: &str) -> bool {
        path == "/" || path == "/index.html"
    }
}

impl Default for RoutingRules {
    fn default() -> Self {
        Self::new(DEFAULT_BYPASS_PREFIXES.iter().map(|p| p.to_string()).collect())
    }
}

pub struct EdgeRouter<P> {
    rules: Arc<RoutingRules>,
    probe: Arc<P>,
}

impl<P> Clone for EdgeRouter<P> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            probe: Arc::clone(&self.probe),
        }
    }
}

impl<P: PageProbe> EdgeRouter<P> {
    pub fn new(rules: RoutingRules, probe: P) -> Self {
        Self {
            rules: Arc::new(rules),
            probe: Arc::new(probe),
        }
    }

    /// Decide how to answer a request for `path`. Probes at most once.
    pub async fn decide(&self, path: &str, query: Option<&str>, headers: &HeaderMap) -> RouteDecision {
        if headers.contains_key(PROBE_HEADER) {
            debug!("Forwarding probe request for {}", path);
            return RouteDecision::Forward;
        }

        if self.rules.is_bypassed(path) {
            debug!("Forwarding static asset {}", path);
            return RouteDecision::Forward;
        }

        if RoutingRules::is_root(path) {
            let accept_language = headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|value| value.to_str().ok());
            let locale = Locale::from_accept_language(accept_language);
            info!(
                "Root request (Accept-Language: {:?}), redirecting to {}",
                accept_language,
                locale.root_path()
            );
            return RouteDecision::Redirect(locale.root_path());
        }

        let Some(english) = swap_prefix(path, Locale::Fr, Locale::En) else {
            debug!("Forwarding {}", path);
            return RouteDecision::Forward;
        };

        match self.probe.probe(path).await {
            Ok(ProbeStatus::NotFound) => {
                let location = with_fallback_marker(&english, query);
                info!("{} not found, falling back to {}", path, location);
                RouteDecision::Redirect(location)
            }
            Ok(status) => {
                debug!("Forwarding {} (probe: {:?})", path, status);
                RouteDecision::Forward
            }
            Err(e) => {
                let location = with_fallback_marker(&english, query);
                warn!("{}; treating as missing, redirecting to {}", e, location);
                RouteDecision::Redirect(location)
            }
        }
    }
}

/// axum middleware applying [`EdgeRouter::decide`].
pub async fn route_request<P: PageProbe + 'static>(
    State(router): State<EdgeRouter<P>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    let decision = router
        .decide(&path, query.as_deref(), request.headers())
        .await;

    if let RouteDecision::Redirect(location) = decision {
        match HeaderValue::from_str(&location) {
            Ok(value) => return (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
            Err(e) => warn!("Cannot redirect to {:?}: {}", location, e),
        }
    }

    next.run(request).await
}
