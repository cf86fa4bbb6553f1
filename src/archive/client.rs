//! HTTP client for the archive service
//!
//! `ArchiveClient` speaks the two JSON endpoints; `HttpFetcher` adapts it to
//! the session loop by posting `FetchSettled` when a request finishes.

use super::types::{
    error_message, parse_learn_reply, parse_prophecy, FetchError, LearnRequest, Prophecy,
    SeanceRequest,
};
use crate::integration::config::ArchiveConfig;
use crate::session::{EventSink, SessionEvent, SessionToken};
use crate::{Result, SeanceError};
use serde::Serialize;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// The one outbound operation a session needs
pub trait ResultFetcher: Send {
    /// Start fetching the prophecy for `query`
    ///
    /// Implementations must eventually emit exactly one
    /// [`SessionEvent::FetchSettled`] for `token` into `sink`.
    fn fetch(&self, token: SessionToken, query: &str, sink: EventSink);
}

/// Client for `/api/seance` and `/api/learn`
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    http: reqwest::Client,
    seance_url: String,
    learn_url: String,
}

impl ArchiveClient {
    pub fn new(config: &ArchiveConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SeanceError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let base = config.base_url.trim_end_matches('/');

        Ok(Self {
            http,
            seance_url: format!("{}{}", base, config.seance_path),
            learn_url: format!("{}{}", base, config.learn_path),
        })
    }

    pub fn seance_url(&self) -> &str {
        &self.seance_url
    }

    pub fn learn_url(&self) -> &str {
        &self.learn_url
    }

    /// Ask the medium about `query`
    pub async fn ask(&self, query: &str) -> std::result::Result<Prophecy, FetchError> {
        let body = self
            .post(&self.seance_url, &SeanceRequest { user_query: query })
            .await?;
        parse_prophecy(&body)
    }

    /// Ask the learning archive about `query`
    pub async fn learn(&self, query: &str) -> std::result::Result<String, FetchError> {
        let body = self.post(&self.learn_url, &LearnRequest { query }).await?;
        parse_learn_reply(&body)
    }

    async fn post<B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> std::result::Result<String, FetchError> {
        debug!("POST {}", url);

        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(&text).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string()
            });
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }
}

/// [`ResultFetcher`] that runs [`ArchiveClient::ask`] on a tokio runtime
pub struct HttpFetcher {
    client: Arc<ArchiveClient>,
    runtime: Handle,
}

impl HttpFetcher {
    pub fn new(client: Arc<ArchiveClient>, runtime: Handle) -> Self {
        Self { client, runtime }
    }
}

impl ResultFetcher for HttpFetcher {
    fn fetch(&self, token: SessionToken, query: &str, sink: EventSink) {
        let client = Arc::clone(&self.client);
        let query = query.to_string();

        self.runtime.spawn(async move {
            let outcome = client.ask(&query).await;
            match &outcome {
                Ok(_) => info!("Archive answered session {}", token),
                Err(e) => warn!("Archive request for session {} failed: {}", token, e),
            }
            sink.emit(SessionEvent::FetchSettled { token, outcome });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    fn config(base_url: &str) -> ArchiveConfig {
        ArchiveConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_millis(500),
            ..ArchiveConfig::default()
        }
    }

    #[test]
    fn test_urls_join_base_and_path() {
        let client = ArchiveClient::new(&config("http://localhost:5000/")).unwrap();
        assert_eq!(client.seance_url(), "http://localhost:5000/api/seance");
        assert_eq!(client.learn_url(), "http://localhost:5000/api/learn");
    }

    #[test]
    fn test_unreachable_archive_settles_with_transport_error() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        // Port 9 (discard) on localhost is closed on any sane test host
        let client = Arc::new(ArchiveClient::new(&config("http://127.0.0.1:9")).unwrap());
        let fetcher = HttpFetcher::new(client, runtime.handle().clone());

        let (tx, rx) = unbounded();
        let token = SessionToken::NONE.next();
        fetcher.fetch(token, "what is gopher", EventSink::new(tx));

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            SessionEvent::FetchSettled { token: t, outcome } => {
                assert_eq!(t, token);
                assert!(matches!(outcome, Err(FetchError::Transport(_))));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
