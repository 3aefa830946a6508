use thiserror::Error;

/// Stable classification of a failed acquisition, exposed to callers so an
/// outer request layer can map each kind to a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The browser/session layer failed outright.
    SessionUnavailable,
    /// The data endpoint rejected the session (stale cookies, not necessarily malice).
    AccessDenied,
    /// A bounded wait was exceeded.
    Timeout,
    /// Transport-level failure.
    NetworkFailure,
    /// No plausible symbol could be found for the input.
    SymbolNotResolved,
    /// Anything that does not fit the categories above.
    Unknown,
}

/// The primary error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum NseError {
    /// The headless browser could not produce a usable session.
    #[error("session unavailable: {0}")]
    SessionUnavailable(String),

    /// The data endpoint returned 403 for a request carrying session cookies.
    #[error("access denied at {url}")]
    AccessDenied {
        /// The URL that rejected the session.
        url: String,
    },

    /// A browser action or HTTP call exceeded its bounded timeout.
    #[error("timed out: {0}")]
    Timeout(String),

    /// An error occurred during an HTTP request.
    #[error("network failure: {0}")]
    Network(reqwest::Error),

    /// Symbol resolution produced no candidates for the input.
    #[error("could not resolve a symbol for {query:?}")]
    SymbolNotResolved {
        /// The normalized query that failed to resolve.
        query: String,
    },

    /// The server returned an unexpected or unsuccessful HTTP status code.
    #[error("unexpected response status: {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// A browser automation step failed.
    #[error("browser error: {0}")]
    Browser(String),

    /// The data received was in an unexpected format or missing a required field.
    #[error("data format unexpected or missing field: {0}")]
    Data(String),

    /// A provided URL could not be parsed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The response body was not valid JSON for the expected shape.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for NseError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NseError::Timeout(e.to_string())
        } else {
            NseError::Network(e)
        }
    }
}

impl NseError {
    /// The stable classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SessionUnavailable(_) => ErrorKind::SessionUnavailable,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Network(_) => ErrorKind::NetworkFailure,
            Self::SymbolNotResolved { .. } => ErrorKind::SymbolNotResolved,
            // Server-side pressure behaves like a transport failure for
            // classification purposes; other statuses stay unclassified.
            Self::Status { status, .. } if *status == 429 || *status >= 500 => {
                ErrorKind::NetworkFailure
            }
            Self::Status { .. }
            | Self::Browser(_)
            | Self::Data(_)
            | Self::Url(_)
            | Self::Json(_) => ErrorKind::Unknown,
        }
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Access denial counts as retryable because the session cache is
    /// invalidated before the retry; a 4xx other than 403/429 does not, since
    /// no amount of retrying fixes a malformed request.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::AccessDenied
                | ErrorKind::Timeout
                | ErrorKind::NetworkFailure
                | ErrorKind::SessionUnavailable
        )
    }
}
