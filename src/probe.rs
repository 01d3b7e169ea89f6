//! Same-origin existence checks for localized pages.

use std::future::Future;

use reqwest::Url;
use thiserror::Error;
use tracing::debug;

use crate::retry::{with_retry_if, RetryConfig};

/// Header marking a request as an existence probe. The edge router lets
/// such requests through untouched, so probing a French page never
/// triggers another probe.
pub const PROBE_HEADER: &str = "x-locale-probe";

/// What a probe learned about a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Found,
    NotFound,
    /// Any other status (redirects, server errors). Not evidence of absence.
    Other(u16),
}

impl ProbeStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            404 => ProbeStatus::NotFound,
            200..=299 => ProbeStatus::Found,
            other => ProbeStatus::Other(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to build probe client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid probe origin '{origin}': {message}")]
    InvalidOrigin { origin: String, message: String },

    #[error("cannot probe '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("probe of '{path}' failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ProbeError {
    /// Network-level failure, as opposed to a bad configuration or path.
    pub fn is_transport(&self) -> bool {
        matches!(self, ProbeError::Transport { .. })
    }
}

/// Checks whether a page exists.
///
/// Implementations must not cache: every call reflects the origin as it is
/// right now.
pub trait PageProbe: Send + Sync {
    fn probe(&self, path: &str) -> impl Future<Output = Result<ProbeStatus, ProbeError>> + Send;
}

/// Probes pages with a `HEAD` request against an HTTP origin.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    origin: Url,
    retry: RetryConfig,
}

impl HttpProbe {
    pub fn new(origin: &str, retry: RetryConfig) -> Result<Self, ProbeError> {
        let origin = Url::parse(origin).map_err(|e| ProbeError::InvalidOrigin {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        // A redirect is an answer in itself; following it would hide it.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ProbeError::Client)?;

        Ok(Self {
            client,
            origin,
            retry,
        })
    }
}

impl PageProbe for HttpProbe {
    async fn probe(&self, path: &str) -> Result<ProbeStatus, ProbeError> {
        let url = self.origin.join(path).map_err(|e| ProbeError::InvalidPath {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let url = &url;

        let status = with_retry_if(
            &self.retry,
            "Page probe",
            move || async move {
                let response = self
                    .client
                    .head(url.clone())
                    .header(PROBE_HEADER, "1")
                    .send()
                    .await
                    .map_err(|source| ProbeError::Transport {
                        path: path.to_string(),
                        source,
                    })?;
                Ok(ProbeStatus::from_code(response.status().as_u16()))
            },
            ProbeError::is_transport,
        )
        .await?;

        debug!("Probe {} -> {:?}", path, status);
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== ProbeStatus Tests ====================

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProbeStatus::from_code(200), ProbeStatus::Found);
        assert_eq!(ProbeStatus::from_code(204), ProbeStatus::Found);
        assert_eq!(ProbeStatus::from_code(404), ProbeStatus::NotFound);
        assert_eq!(ProbeStatus::from_code(500), ProbeStatus::Other(500));
        assert_eq!(ProbeStatus::from_code(301), ProbeStatus::Other(301));
        assert_eq!(ProbeStatus::from_code(410), ProbeStatus::Other(410));
    }

    // ==================== HttpProbe Tests ====================

    #[test]
    fn test_invalid_origin() {
        let err = HttpProbe::new("not a url", RetryConfig::default()).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidOrigin { .. }));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_probe_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/fr/about.html"))
            .and(header(PROBE_HEADER, "1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let probe = HttpProbe::new(&mock_server.uri(), RetryConfig::default()).unwrap();
        let status = probe.probe("/fr/about.html").await.unwrap();
        assert_eq!(status, ProbeStatus::Found);
    }

    #[tokio::test]
    async fn test_probe_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let probe = HttpProbe::new(&mock_server.uri(), RetryConfig::default()).unwrap();
        let status = probe.probe("/fr/artists/jane-doe.html").await.unwrap();
        assert_eq!(status, ProbeStatus::NotFound);
    }

    #[tokio::test]
    async fn test_probe_does_not_follow_redirects() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/fr/old.html"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/fr/new.html"))
            .mount(&mock_server)
            .await;

        let probe = HttpProbe::new(&mock_server.uri(), RetryConfig::default()).unwrap();
        let status = probe.probe("/fr/old.html").await.unwrap();
        assert_eq!(status, ProbeStatus::Other(301));
    }

    #[tokio::test]
    async fn test_probe_is_not_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/fr/about.html"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&mock_server)
            .await;

        let probe = HttpProbe::new(&mock_server.uri(), RetryConfig::default()).unwrap();
        probe.probe("/fr/about.html").await.unwrap();
        probe.probe("/fr/about.html").await.unwrap();
    }

    #[tokio::test]
    async fn test_probe_server_error_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let retry = RetryConfig::probe(3).with_max_delay(Duration::from_millis(10));
        let probe = HttpProbe::new(&mock_server.uri(), retry).unwrap();
        let status = probe.probe("/fr/about.html").await.unwrap();
        assert_eq!(status, ProbeStatus::Other(503));
    }

    #[tokio::test]
    async fn test_probe_transport_error() {
        // Nothing listens on port 1
        let probe = HttpProbe::new("http://127.0.0.1:1", RetryConfig::default()).unwrap();
        let err = probe.probe("/fr/about.html").await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("/fr/about.html"));
    }
}
