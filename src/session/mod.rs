//! Authenticated browsing sessions: acquisition, caching, invalidation.

pub(crate) mod browser;

mod acquirer;
mod cache;

pub use acquirer::{AcquirerConfig, BrowserSessionAcquirer};
pub use cache::SessionCache;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::NseError;
use crate::fingerprint::FingerprintProfile;

/// One cookie extracted from the browser context, in extraction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

/// A cookie jar plus the fingerprint that produced it.
///
/// Read-only after creation; discarded (never mutated) on expiry or explicit
/// invalidation.
#[derive(Debug, Clone)]
pub struct Session {
    /// Cookies in the order the browser context reported them.
    pub cookies: Vec<SessionCookie>,
    /// The browser identity the cookies were issued against.
    pub fingerprint: FingerprintProfile,
    /// When the session was acquired.
    pub acquired_at: DateTime<Utc>,
    /// When the cache stops trusting this session. Strictly earlier than the
    /// real cookie expiry so a call never runs against cookies that lapse
    /// mid-flight.
    pub cache_expires_at: DateTime<Utc>,
}

impl Session {
    /// Renders the jar as a `Cookie:` header value.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Whether the cache may still hand this session out at `now`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.cache_expires_at
    }
}

/// Summary of the session that backed an acquisition, for diagnostics.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionMetadata {
    /// Number of cookies in the jar.
    #[serde(rename = "cookieCount")]
    pub cookie_count: usize,
    /// When the session was acquired.
    #[serde(rename = "acquiredAt")]
    pub acquired_at: DateTime<Utc>,
    /// Whether the session came from the warm cache.
    #[serde(rename = "fromCache")]
    pub from_cache: bool,
}

/// Source of fresh sessions. The production implementation drives a headless
/// browser; tests substitute canned sessions.
#[async_trait]
pub trait AcquireSession: Send + Sync {
    /// Produces a new session or fails with `SessionUnavailable` / `Timeout`.
    async fn acquire(&self) -> Result<Session, NseError>;
}
