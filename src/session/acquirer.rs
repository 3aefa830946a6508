//! Browser-driven session acquisition.
//!
//! Drives a stealth headless Chromium through the target's filings landing
//! page and extracts the cookie jar the data endpoint expects. The browser
//! process is torn down on every exit path.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::core::NseError;
use crate::core::constants::{DEFAULT_LANDING_URL, DEFAULT_SESSION_TTL};
use crate::fingerprint::FingerprintProfile;
use crate::session::browser::StealthBrowser;
use crate::session::{AcquireSession, Session};

/// Consent banner selectors, tried in priority order; first match wins.
const CONSENT_SELECTORS: &[&str] = &[
    "button[id*='accept']",
    "button[class*='accept']",
    ".cookie-accept",
    ".accept-cookies",
    "#cookie-accept",
];

/// Tunables for the browser-driven acquisition flow.
#[derive(Debug, Clone)]
pub struct AcquirerConfig {
    /// Landing page to visit for cookies.
    pub landing_url: String,
    /// Explicit Chromium binary; auto-detected when `None`.
    pub chrome_executable: Option<PathBuf>,
    /// Bound on browser process startup.
    pub launch_timeout: Duration,
    /// Bound on the landing page navigation.
    pub navigation_timeout: Duration,
    /// Extra allowance for the "checking your browser" interstitial.
    pub challenge_timeout: Duration,
    /// How long the resulting session is trusted by the cache.
    pub session_ttl: Duration,
}

impl Default for AcquirerConfig {
    fn default() -> Self {
        Self {
            landing_url: DEFAULT_LANDING_URL.to_string(),
            chrome_executable: None,
            launch_timeout: Duration::from_secs(20),
            navigation_timeout: Duration::from_secs(30),
            challenge_timeout: Duration::from_secs(25),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

/// Production [`AcquireSession`] implementation over headless Chromium.
#[derive(Debug, Clone, Default)]
pub struct BrowserSessionAcquirer {
    config: AcquirerConfig,
}

impl BrowserSessionAcquirer {
    /// Creates an acquirer with the given tunables.
    #[must_use]
    pub fn new(config: AcquirerConfig) -> Self {
        Self { config }
    }

    /// The configured landing URL.
    #[must_use]
    pub fn landing_url(&self) -> &str {
        &self.config.landing_url
    }

    async fn drive(&self, browser: &StealthBrowser) -> Result<Vec<super::SessionCookie>, NseError> {
        browser
            .navigate(&self.config.landing_url, self.config.navigation_timeout)
            .await?;
        browser.ride_out_challenge(self.config.challenge_timeout).await?;

        // A consent banner may or may not be present; absence is fine.
        if let Some(sel) = browser
            .click_first(CONSENT_SELECTORS, Duration::from_secs(2))
            .await
        {
            tracing::debug!(selector = sel, "dismissed consent banner");
            StealthBrowser::settle(800, 1600).await;
        }

        // Let the dynamic content finish setting its cookies.
        StealthBrowser::settle(2000, 4000).await;

        let cookies = browser.cookies().await?;
        if cookies.is_empty() {
            return Err(NseError::SessionUnavailable(
                "landing flow completed but no cookies were set".into(),
            ));
        }
        Ok(cookies)
    }
}

#[async_trait]
impl AcquireSession for BrowserSessionAcquirer {
    async fn acquire(&self) -> Result<Session, NseError> {
        let fingerprint = FingerprintProfile::random();
        tracing::info!(
            user_agent = %fingerprint.user_agent,
            viewport = %format!(
                "{}x{}",
                fingerprint.viewport_width, fingerprint.viewport_height
            ),
            "acquiring session"
        );

        let browser = StealthBrowser::launch(
            &fingerprint,
            self.config.chrome_executable.as_ref(),
            self.config.launch_timeout,
        )
        .await?;

        // Teardown must run whether the flow succeeded, failed, or timed out.
        let outcome = self.drive(&browser).await;
        browser.close().await;

        let cookies = outcome?;
        let acquired_at = Utc::now();
        let ttl = chrono::Duration::from_std(self.config.session_ttl)
            .map_err(|e| NseError::Data(format!("session TTL out of range: {e}")))?;

        tracing::info!(cookie_count = cookies.len(), "session acquired");
        Ok(Session {
            cookies,
            fingerprint,
            acquired_at,
            cache_expires_at: acquired_at + ttl,
        })
    }
}
