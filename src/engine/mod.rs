//! The entry point: one resilient acquisition composed from the parts.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::announcements::{AnnouncementClient, AnnouncementRecord, CacheMode};
use crate::core::retry::with_retry;
use crate::core::{ErrorKind, NseError, RetryConfig};
use crate::resolve::{BrowserSymbolResolver, ResolveInteractive, SymbolResolver};
use crate::session::{AcquireSession, BrowserSessionAcquirer, SessionCache, SessionMetadata};

/// One caller request.
#[derive(Debug, Clone)]
pub struct AcquisitionRequest {
    /// Company symbol or free-text name.
    pub symbol: String,
    /// Optional issuer hint, forwarded to the data endpoint.
    pub issuer: Option<String>,
    /// Discard any cached session and response before proceeding.
    pub force_refresh: bool,
}

impl AcquisitionRequest {
    /// Request for a symbol with default options.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            issuer: None,
            force_refresh: false,
        }
    }

    /// Attach an issuer hint.
    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Force fresh session and response.
    #[must_use]
    pub const fn force_refresh(mut self, yes: bool) -> Self {
        self.force_refresh = yes;
        self
    }
}

/// Successful outcome of one engine invocation. Not retained by the engine;
/// persistence is the caller's concern.
#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionResult {
    /// The resolved canonical symbol.
    pub symbol: String,
    /// Recent announcements, newest first.
    pub announcements: Vec<AnnouncementRecord>,
    /// Number of announcements returned.
    pub count: usize,
    /// When the result was assembled.
    #[serde(rename = "fetchedAt")]
    pub fetched_at: DateTime<Utc>,
    /// Diagnostics about the backing session.
    pub session: SessionMetadata,
}

/// Composes resolver, session cache, and announcement client into one
/// resilient operation.
pub struct AcquisitionEngine {
    resolver: SymbolResolver,
    sessions: SessionCache,
    client: AnnouncementClient,
    fetch_retry: RetryConfig,
}

impl AcquisitionEngine {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> AcquisitionEngineBuilder {
        AcquisitionEngineBuilder::default()
    }

    /// Shared session cache, exposed so a caller-facing layer can surface
    /// explicit invalidation.
    #[must_use]
    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    /// Resolve → session → fetch → assemble.
    ///
    /// If the fetch reports access denial the cached session is invalidated
    /// before the retry, so the next attempt runs against fresh cookies.
    ///
    /// # Errors
    ///
    /// A classified [`NseError`]; the classification made at the point of
    /// detection is propagated unchanged.
    #[tracing::instrument(skip(self), fields(symbol = %request.symbol))]
    pub async fn run(&self, request: AcquisitionRequest) -> Result<AcquisitionResult, NseError> {
        let symbol = self.resolver.resolve(&request.symbol).await?;

        if request.force_refresh {
            self.sessions.invalidate().await;
        }
        let mode = if request.force_refresh {
            CacheMode::Refresh
        } else {
            CacheMode::Use
        };
        let issuer = request.issuer.as_deref();

        let (announcements, session_meta) = with_retry(&self.fetch_retry, |_attempt| {
            let symbol = symbol.clone();
            async move {
                let was_warm = self.sessions.is_warm().await;
                let session = self.sessions.get_or_acquire().await?;
                match self.client.fetch(&symbol, issuer, &session, mode).await {
                    Ok(records) => Ok((
                        records,
                        SessionMetadata {
                            cookie_count: session.cookies.len(),
                            acquired_at: session.acquired_at,
                            from_cache: was_warm,
                        },
                    )),
                    Err(e) if e.kind() == ErrorKind::AccessDenied => {
                        // Stale cookies, not a malformed request: drop the
                        // session so the retry reacquires.
                        self.sessions.invalidate().await;
                        Err(e)
                    }
                    Err(e) => Err(e),
                }
            }
        })
        .await?;

        Ok(AcquisitionResult {
            symbol,
            count: announcements.len(),
            announcements,
            fetched_at: Utc::now(),
            session: session_meta,
        })
    }
}

/* ----------------------- Builder ----------------------- */

/// Builder for [`AcquisitionEngine`]. Every collaborator is injectable; the
/// defaults wire up the production browser-driven implementations.
#[derive(Default)]
pub struct AcquisitionEngineBuilder {
    acquirer: Option<Arc<dyn AcquireSession>>,
    interactive: Option<Arc<dyn ResolveInteractive>>,
    exact_only: bool,
    api_url: Option<Url>,
    referer: Option<String>,
    http_timeout: Option<Duration>,
    response_cache_ttl: Option<Duration>,
    window_days: Option<i64>,
    session_retry: Option<RetryConfig>,
    fetch_retry: Option<RetryConfig>,
}

impl AcquisitionEngineBuilder {
    /// Substitute the session source (tests inject counting fakes here).
    #[must_use]
    pub fn acquirer(mut self, acquirer: Arc<dyn AcquireSession>) -> Self {
        self.acquirer = Some(acquirer);
        self
    }

    /// Substitute the interactive symbol lookup.
    #[must_use]
    pub fn interactive_resolver(mut self, resolver: Arc<dyn ResolveInteractive>) -> Self {
        self.interactive = Some(resolver);
        self
    }

    /// Disable the interactive strategy entirely; only ticker-shaped input
    /// resolves.
    #[must_use]
    pub const fn exact_resolution_only(mut self) -> Self {
        self.exact_only = true;
        self
    }

    /// Override the data endpoint (tests point this at a mock server).
    #[must_use]
    pub fn api_url(mut self, url: Url) -> Self {
        self.api_url = Some(url);
        self
    }

    /// Override the Referer presented with API calls.
    #[must_use]
    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Overall HTTP timeout for data-endpoint calls.
    #[must_use]
    pub const fn http_timeout(mut self, dur: Duration) -> Self {
        self.http_timeout = Some(dur);
        self
    }

    /// Per-symbol response cache TTL.
    #[must_use]
    pub const fn response_cache_ttl(mut self, dur: Duration) -> Self {
        self.response_cache_ttl = Some(dur);
        self
    }

    /// Recency window in days.
    #[must_use]
    pub const fn window_days(mut self, days: i64) -> Self {
        self.window_days = Some(days);
        self
    }

    /// Retry policy for session acquisition.
    #[must_use]
    pub fn session_retry(mut self, cfg: RetryConfig) -> Self {
        self.session_retry = Some(cfg);
        self
    }

    /// Retry policy for the resolve-session-fetch pipeline.
    #[must_use]
    pub fn fetch_retry(mut self, cfg: RetryConfig) -> Self {
        self.fetch_retry = Some(cfg);
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Propagates announcement-client construction failures.
    pub fn build(self) -> Result<AcquisitionEngine, NseError> {
        let acquirer = self
            .acquirer
            .unwrap_or_else(|| Arc::new(BrowserSessionAcquirer::default()));
        let sessions = SessionCache::new(
            acquirer,
            self.session_retry.unwrap_or_else(RetryConfig::for_session),
        );

        let resolver = if self.exact_only {
            SymbolResolver::exact_only()
        } else {
            let interactive = self
                .interactive
                .unwrap_or_else(|| Arc::new(BrowserSymbolResolver::default()));
            SymbolResolver::with_interactive(interactive)
        };

        let mut client = AnnouncementClient::builder();
        if let Some(url) = self.api_url {
            client = client.api_url(url);
        }
        if let Some(referer) = self.referer {
            client = client.referer(referer);
        }
        if let Some(t) = self.http_timeout {
            client = client.timeout(t);
        }
        if let Some(ttl) = self.response_cache_ttl {
            client = client.cache_ttl(ttl);
        }
        if let Some(days) = self.window_days {
            client = client.window_days(days);
        }

        Ok(AcquisitionEngine {
            resolver,
            sessions,
            client: client.build()?,
            fetch_retry: self.fetch_retry.unwrap_or_else(RetryConfig::for_fetch),
        })
    }
}
