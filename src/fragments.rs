//! Shared header/footer fragments.

use std::future::Future;

use reqwest::Url;
use thiserror::Error;
use tracing::debug;

use crate::retry::{with_retry_if, RetryConfig};

#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("invalid fragment origin '{origin}': {message}")]
    InvalidOrigin { origin: String, message: String },

    #[error("invalid fragment path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("could not load {path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not load {path}: HTTP {status}")]
    Status { path: String, status: u16 },
}

impl FragmentError {
    fn is_transport(&self) -> bool {
        matches!(self, FragmentError::Transport { .. })
    }
}

/// Source of raw fragment HTML.
pub trait FragmentSource: Send + Sync {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, FragmentError>> + Send;
}

/// Fetches fragments with a plain `GET` against the site origin.
#[derive(Debug, Clone)]
pub struct HttpFragmentSource {
    client: reqwest::Client,
    origin: Url,
    retry: RetryConfig,
}

impl HttpFragmentSource {
    pub fn new(origin: &str) -> Result<Self, FragmentError> {
        let origin = Url::parse(origin).map_err(|e| FragmentError::InvalidOrigin {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::with_client(reqwest::Client::new(), origin))
    }

    pub fn with_client(client: reqwest::Client, origin: Url) -> Self {
        Self {
            client,
            origin,
            retry: RetryConfig::fragment(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl FragmentSource for HttpFragmentSource {
    async fn fetch(&self, path: &str) -> Result<String, FragmentError> {
        let url = self.origin.join(path).map_err(|e| FragmentError::InvalidPath {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let url = &url;

        let html = with_retry_if(
            &self.retry,
            &format!("Fragment {}", path),
            move || async move {
                let response = self.client.get(url.clone()).send().await.map_err(|source| {
                    FragmentError::Transport {
                        path: path.to_string(),
                        source,
                    }
                })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(FragmentError::Status {
                        path: path.to_string(),
                        status: status.as_u16(),
                    });
                }

                response.text().await.map_err(|source| FragmentError::Transport {
                    path: path.to_string(),
                    source,
                })
            },
            FragmentError::is_transport,
        )
        .await?;

        debug!("Loaded fragment {} ({} bytes)", path, html.len());
        Ok(html)
    }
}
