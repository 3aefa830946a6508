//! Centralized constants for default endpoints and request defaults.

/// NSE landing page for corporate filings; visiting it yields the session
/// cookies the data endpoint expects.
pub(crate) const DEFAULT_LANDING_URL: &str =
    "https://www.nseindia.com/companies-listing/corporate-filings-announcements";

/// Corporate announcements data endpoint (query: `index=equities&symbol=...`).
pub(crate) const DEFAULT_API_URL: &str = "https://www.nseindia.com/api/corporate-announcements";

/// Referer presented with API calls; must match the page that produced the cookies.
pub(crate) const DEFAULT_REFERER: &str =
    "https://www.nseindia.com/companies-listing/corporate-filings-announcements";

/// Accept-Language consistent with the target audience.
pub(crate) const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9,hi;q=0.8";

/// How long a filtered announcement response stays cached per symbol.
pub(crate) const DEFAULT_RESPONSE_CACHE_TTL: std::time::Duration =
    std::time::Duration::from_secs(30 * 60);

/// How long an acquired session is trusted. Deliberately far below the real
/// cookie lifetime so a retrieval call never runs against cookies that expire
/// mid-flight.
pub(crate) const DEFAULT_SESSION_TTL: std::time::Duration = std::time::Duration::from_secs(5 * 60);

/// Recency window for announcements.
pub(crate) const RECENCY_WINDOW_DAYS: i64 = 7;

/// Overall HTTP timeout for the data endpoint.
pub(crate) const DEFAULT_HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);
