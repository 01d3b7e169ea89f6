//! Render a page the way a visitor's browser would see it after
//! localization, and print the resulting HTML.
//!
//! Usage:
//!   cargo run --bin render-page -- http://localhost:8080/fr/about.html
//!   cargo run --bin render-page -- http://localhost:8080/fr/about.html --verify
//!
//! `--verify` checks that a French page exists before rendering it and
//! switches to the English fallback if it does not.
//!
//! Optional environment variables:
//! - HEADER_FRAGMENT (defaults to /shared/header.html)
//! - FOOTER_FRAGMENT (defaults to /shared/footer.html)
//! - FRAGMENT_TIMEOUT_SECS (no timeout by default)
//! - TRANSLATIONS_FILE (extra/override strings, JSON)
//! - PROBE_ATTEMPTS (defaults to 1)

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use locale_router::config::Config;
use locale_router::document::Document;
use locale_router::fragments::HttpFragmentSource;
use locale_router::i18n::TranslationCatalog;
use locale_router::probe::HttpProbe;
use locale_router::reconcile::PageReconciler;
use locale_router::resolver::{client_fallback_target, resolve, PageUrl};
use locale_router::retry::RetryConfig;
use reqwest::Url;
use tracing::info;

async fn fetch_page(client: &reqwest::Client, url: Url) -> Result<(Url, String)> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    let status = response.status();
    if !status.is_success() {
        bail!("{} returned HTTP {}", url, status);
    }

    // Redirects from the edge router are followed, like a browser would
    let final_url = response.url().clone();
    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read {}", final_url))?;
    Ok((final_url, body))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, the page goes to stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("locale_router=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let verify = args.iter().any(|arg| arg == "--verify");
    let Some(raw_url) = args.iter().find(|arg| !arg.starts_with("--")) else {
        bail!("Usage: render-page <url> [--verify]");
    };

    let config = Config::from_env()?;
    let url = Url::parse(raw_url).with_context(|| format!("Invalid URL '{}'", raw_url))?;
    let origin = url.join("/").context("URL has no origin")?;
    let client = reqwest::Client::new();

    let (mut page_url, mut html) = fetch_page(&client, url).await?;

    if verify {
        let probe = HttpProbe::new(origin.as_str(), RetryConfig::probe(config.probe_attempts))?;
        let state = resolve(&PageUrl::from(&page_url));
        if let Some(target) = client_fallback_target(&probe, &state).await {
            info!("French page missing, loading {}", target);
            let fallback = origin
                .join(&target)
                .with_context(|| format!("Invalid fallback target '{}'", target))?;
            (page_url, html) = fetch_page(&client, fallback).await?;
        }
    }

    let catalog = match &config.translations_file {
        Some(path) => TranslationCatalog::builtin_with_file(path)?,
        None => TranslationCatalog::builtin(),
    };
    let fragments = HttpFragmentSource::with_client(client.clone(), origin);
    let reconciler = PageReconciler::new(fragments, Arc::new(catalog))
        .with_fragment_paths(&config.header_fragment, &config.footer_fragment)
        .with_fragment_timeout(config.fragment_timeout);

    let mut doc = Document::parse(&html).context("Page is not parseable HTML")?;
    let reconciliation = reconciler.run(&mut doc, &PageUrl::from(&page_url)).await;

    info!(
        "Rendered {} (locale: {}, fallback: {}, header: {:?}, footer: {:?})",
        page_url,
        reconciliation.state().active(),
        reconciliation.state().is_fallback(),
        reconciliation.header(),
        reconciliation.footer()
    );
    println!("{}", doc.to_html());
    Ok(())
}
