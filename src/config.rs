use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub site_dir: PathBuf,

    // Edge routing
    pub bypass_prefixes: Vec<String>,
    pub probe_origin: String,
    pub probe_attempts: u32,

    // Page reconciliation
    pub header_fragment: String,
    pub footer_fragment: String,
    pub fragment_timeout: Option<Duration>,
    pub translations_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port: u16 = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", raw))?,
            Err(_) => 8080,
        };

        let bypass_prefixes: Vec<String> = std::env::var("BYPASS_PREFIXES")
            .unwrap_or_else(|_| "/assets/,/shared/".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for prefix in &bypass_prefixes {
            if !prefix.starts_with('/') {
                bail!("BYPASS_PREFIXES entries must start with '/', got '{}'", prefix);
            }
        }

        Ok(Self {
            port,
            site_dir: std::env::var("SITE_DIR")
                .unwrap_or_else(|_| "public".to_string())
                .into(),

            bypass_prefixes,
            // Same origin by default: the probe goes through this server's own static service
            probe_origin: std::env::var("PROBE_ORIGIN")
                .unwrap_or_else(|_| format!("http://127.0.0.1:{}", port)),
            probe_attempts: std::env::var("PROBE_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n >= 1)
                .unwrap_or(1),

            header_fragment: std::env::var("HEADER_FRAGMENT")
                .unwrap_or_else(|_| "/shared/header.html".to_string()),
            footer_fragment: std::env::var("FOOTER_FRAGMENT")
                .unwrap_or_else(|_| "/shared/footer.html".to_string()),
            fragment_timeout: std::env::var("FRAGMENT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
            translations_file: std::env::var("TRANSLATIONS_FILE").ok().map(PathBuf::from),
        })
    }
}
