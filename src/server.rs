//! HTTP front end: the edge router layered over the static site.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::edge::{route_request, EdgeRouter, RoutingRules};
use crate::probe::{HttpProbe, PageProbe};
use crate::retry::RetryConfig;

/// Static files from `site_dir`, with `router` deciding first.
pub fn build_app<P: PageProbe + 'static>(site_dir: &Path, router: EdgeRouter<P>) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(site_dir))
        .layer(middleware::from_fn_with_state(router, route_request::<P>))
        .layer(TraceLayer::new_for_http())
}

/// The edge router configured from `config`, probing over HTTP.
pub fn edge_router(config: &Config) -> Result<EdgeRouter<HttpProbe>> {
    let probe = HttpProbe::new(
        &config.probe_origin,
        RetryConfig::probe(config.probe_attempts),
    )
    .context("Failed to set up page probe")?;
    let rules = RoutingRules::new(config.bypass_prefixes.clone());
    Ok(EdgeRouter::new(rules, probe))
}

/// Serve `app` on an already bound listener until the process stops.
pub async fn serve_on(listener: TcpListener, app: Router) -> Result<()> {
    let local = listener.local_addr()?;
    info!("Listening on http://{}", local);
    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")
}

pub async fn serve(config: &Config) -> Result<()> {
    let router = edge_router(config)?;
    let app = build_app(&config.site_dir, router);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        "Serving {} (probe origin {}, bypass {:?})",
        config.site_dir.display(),
        config.probe_origin,
        config.bypass_prefixes
    );
    serve_on(listener, app).await
}
