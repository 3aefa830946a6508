//! The retrieval call against the corporate-announcements endpoint.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::header;
use tokio::sync::RwLock;
use url::Url;

use crate::announcements::model::AnnouncementRecord;
use crate::announcements::wire;
use crate::core::NseError;
use crate::core::constants::{
    DEFAULT_API_URL, DEFAULT_HTTP_TIMEOUT, DEFAULT_REFERER, DEFAULT_RESPONSE_CACHE_TTL,
    RECENCY_WINDOW_DAYS,
};
use crate::session::Session;

/// Defines the behavior of the per-symbol response cache for one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheMode {
    /// Read a non-expired entry if present; otherwise fetch and cache. (Default)
    Use,
    /// Always fetch, then overwrite the cached entry.
    Refresh,
    /// Always fetch; neither read nor write the cache.
    Bypass,
}

#[derive(Debug)]
struct CacheEntry {
    records: Vec<AnnouncementRecord>,
    expires_at: Instant,
}

/// Issues the data-endpoint call with the session's cookies and matching
/// fingerprint headers, filters to the recency window, and caches the result
/// per symbol.
pub struct AnnouncementClient {
    http: reqwest::Client,
    api_url: Url,
    referer: String,
    window_days: i64,
    cache_ttl: Duration,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl AnnouncementClient {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> AnnouncementClientBuilder {
        AnnouncementClientBuilder::default()
    }

    /// Fetches, filters, and projects announcements for `symbol`.
    ///
    /// A 404 from the endpoint is a legitimate empty result. A 403 surfaces
    /// as `AccessDenied` so the caller can invalidate the session and retry.
    ///
    /// # Errors
    ///
    /// `AccessDenied` on 403, `Status` on any other unexpected code,
    /// `Timeout`/`Network` on transport failures, `Json` on a malformed body.
    pub async fn fetch(
        &self,
        symbol: &str,
        issuer: Option<&str>,
        session: &Session,
        mode: CacheMode,
    ) -> Result<Vec<AnnouncementRecord>, NseError> {
        let key = symbol.trim().to_uppercase();

        if mode == CacheMode::Use
            && let Some(hit) = self.cache_get(&key).await
        {
            tracing::debug!(symbol = %key, "response cache hit");
            return Ok(hit);
        }

        let mut url = self.api_url.clone();
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("index", "equities");
            qp.append_pair("symbol", &key);
            if let Some(issuer) = issuer {
                qp.append_pair("issuer", issuer);
            }
        }

        // The network-layer identity must match the browser-layer identity
        // that produced the cookies; a mismatched UA is itself a signal.
        let fp = &session.fingerprint;
        let resp = self
            .http
            .get(url.clone())
            .header(header::USER_AGENT, &fp.user_agent)
            .header(header::ACCEPT, "application/json, text/plain, */*")
            .header(header::ACCEPT_LANGUAGE, &fp.accept_language)
            .header(header::COOKIE, session.cookie_header())
            .header(header::REFERER, &self.referer)
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Sec-Fetch-Dest", "empty")
            .header("Sec-Fetch-Mode", "cors")
            .header("Sec-Fetch-Site", "same-origin")
            .send()
            .await?;

        let status = resp.status();
        let records = match status.as_u16() {
            200 => {
                let body = resp.text().await?;
                let raw: Vec<wire::RawAnnouncement> = serde_json::from_str(&body)?;
                let total = raw.len();
                let records = project_window(raw, Utc::now(), self.window_days);
                tracing::info!(
                    symbol = %key,
                    total,
                    recent = records.len(),
                    "announcements fetched"
                );
                records
            }
            404 => {
                tracing::info!(symbol = %key, "no announcements for symbol");
                Vec::new()
            }
            403 => {
                return Err(NseError::AccessDenied {
                    url: url.to_string(),
                });
            }
            code => {
                return Err(NseError::Status {
                    status: code,
                    url: url.to_string(),
                });
            }
        };

        if mode != CacheMode::Bypass {
            self.cache_put(key, records.clone()).await;
        }
        Ok(records)
    }

    async fn cache_get(&self, key: &str) -> Option<Vec<AnnouncementRecord>> {
        let guard = self.cache.read().await;
        let entry = guard.get(key)?;
        if Instant::now() <= entry.expires_at {
            Some(entry.records.clone())
        } else {
            None
        }
    }

    async fn cache_put(&self, key: String, records: Vec<AnnouncementRecord>) {
        let entry = CacheEntry {
            records,
            expires_at: Instant::now() + self.cache_ttl,
        };
        self.cache.write().await.insert(key, entry);
    }
}

/// Filters raw rows to the recency window, deduplicates on
/// (symbol, attachment URL), and orders newest first.
fn project_window(
    raw: Vec<wire::RawAnnouncement>,
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<AnnouncementRecord> {
    let cutoff = now - chrono::Duration::days(window_days);
    let mut records: Vec<AnnouncementRecord> = raw
        .into_iter()
        .filter_map(wire::RawAnnouncement::into_record)
        .filter(|r| r.broadcast_timestamp >= cutoff)
        .collect();

    records.sort_by(|a, b| b.broadcast_timestamp.cmp(&a.broadcast_timestamp));
    let mut seen = std::collections::HashSet::new();
    records.retain(|r| {
        let (symbol, url) = r.dedup_key();
        seen.insert((symbol.to_string(), url.to_string()))
    });
    records
}

/* ----------------------- Builder ----------------------- */

/// Builder for [`AnnouncementClient`].
#[derive(Default)]
pub struct AnnouncementClientBuilder {
    api_url: Option<Url>,
    referer: Option<String>,
    timeout: Option<Duration>,
    cache_ttl: Option<Duration>,
    window_days: Option<i64>,
}

impl AnnouncementClientBuilder {
    /// Override the data endpoint (used by tests to point at a mock server).
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

    /// Set the overall HTTP timeout. Default: 15s.
    #[must_use]
    pub const fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set the per-symbol response cache TTL. Default: 30 minutes.
    #[must_use]
    pub const fn cache_ttl(mut self, dur: Duration) -> Self {
        self.cache_ttl = Some(dur);
        self
    }

    /// Override the recency window. Default: 7 days.
    #[must_use]
    pub const fn window_days(mut self, days: i64) -> Self {
        self.window_days = Some(days);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns an error when the default endpoint constant fails to parse or
    /// the HTTP client cannot be constructed.
    pub fn build(self) -> Result<AnnouncementClient, NseError> {
        let api_url = match self.api_url {
            Some(u) => u,
            None => Url::parse(DEFAULT_API_URL)?,
        };
        // No cookie store and no default UA: both are carried per-request
        // from the session so they always match the browser that produced
        // the cookies.
        let http = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT))
            .build()?;

        Ok(AnnouncementClient {
            http,
            api_url,
            referer: self.referer.unwrap_or_else(|| DEFAULT_REFERER.to_string()),
            window_days: self.window_days.unwrap_or(RECENCY_WINDOW_DAYS),
            cache_ttl: self.cache_ttl.unwrap_or(DEFAULT_RESPONSE_CACHE_TTL),
            cache: RwLock::new(HashMap::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(symbol: &str, file: &str, when: &str) -> wire::RawAnnouncement {
        serde_json::from_value(serde_json::json!({
            "symbol": symbol,
            "desc": "Board Meeting",
            "attchmntFile": file,
            "smIndustry": "Refineries",
            "attchmntText": "Outcome of board meeting",
            "fileSize": "120 KB",
            "exchdisstime": when,
        }))
        .unwrap()
    }

    #[test]
    fn window_includes_and_excludes_around_seven_days() {
        let rows = vec![raw("RELIANCE", "a.pdf", "18-Jun-2025 19:08:25")];
        let near = Utc.with_ymd_and_hms(2025, 6, 20, 0, 0, 0).unwrap();
        assert_eq!(project_window(rows, near, 7).len(), 1);

        let rows = vec![raw("RELIANCE", "a.pdf", "18-Jun-2025 19:08:25")];
        let far = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        assert!(project_window(rows, far, 7).is_empty());
    }

    #[test]
    fn newest_first_and_deduplicated() {
        let rows = vec![
            raw("RELIANCE", "old.pdf", "16-Jun-2025 09:00:00"),
            raw("RELIANCE", "new.pdf", "18-Jun-2025 19:08:25"),
            raw("RELIANCE", "new.pdf", "18-Jun-2025 19:08:25"),
        ];
        let now = Utc.with_ymd_and_hms(2025, 6, 19, 0, 0, 0).unwrap();
        let out = project_window(rows, now, 7);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].attachment_url, "new.pdf");
        assert_eq!(out[1].attachment_url, "old.pdf");
    }

    #[test]
    fn unparseable_rows_are_dropped() {
        let rows = vec![
            serde_json::from_value::<wire::RawAnnouncement>(
                serde_json::json!({"symbol": "X", "exchdisstime": "not a date"}),
            )
            .unwrap(),
            raw("RELIANCE", "a.pdf", "18-Jun-2025 19:08:25"),
        ];
        let now = Utc.with_ymd_and_hms(2025, 6, 19, 0, 0, 0).unwrap();
        assert_eq!(project_window(rows, now, 7).len(), 1);
    }
}
