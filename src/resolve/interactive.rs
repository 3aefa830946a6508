//! Browser-driven autocomplete lookup.
//!
//! Types the query into the filings search box with human-cadence keystrokes
//! and harvests the rendered suggestion list. Input velocity is one of the
//! automation heuristics the target applies, hence the per-keystroke jitter.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::NseError;
use crate::core::constants::DEFAULT_LANDING_URL;
use crate::fingerprint::FingerprintProfile;
use crate::resolve::{ResolveInteractive, SymbolCandidate, SymbolQuery};
use crate::session::browser::{StealthBrowser, browser_err};

/// Search box selectors, most specific first.
const SEARCH_INPUT_SELECTORS: &[&str] = &[
    "input[placeholder='Company Name or Symbol']",
    "input[placeholder*='Company Name']",
    "input[placeholder*='Symbol']",
    "input[placeholder*='Company']",
    "input[name*='company']",
    "input[type='text']",
];

/// Suggestion container selectors, most specific first.
const DROPDOWN_SELECTORS: &[&str] = &[
    ".autocompleteList",
    ".tt-suggestion",
    ".tt-menu",
    "[role='listbox']",
    ".autocomplete-suggestions",
    ".search-suggestions",
];

/// Extracts candidates from whichever suggestion markup rendered: the
/// `.lt` span carries the company name, the sibling span the symbol.
const EXTRACT_CANDIDATES_JS: &str = r"
(() => {
  const nodes = document.querySelectorAll(
    '.autocompleteList.tt-suggestion, .tt-suggestion, .autocompleteList, [role=\'option\']'
  );
  const out = [];
  for (const n of nodes) {
    const lt = n.querySelector('.lt');
    const name = lt && lt.textContent ? lt.textContent.trim() : '';
    let symbol = '';
    for (const s of n.querySelectorAll('span')) {
      if (!s.classList.contains('lt') && s.textContent) {
        symbol = s.textContent.trim();
        break;
      }
    }
    out.push({ text: (n.textContent || '').trim(), name: name, symbol: symbol });
  }
  return out;
})()
";

/// Tunables for the interactive resolution flow.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Page hosting the autocomplete control.
    pub landing_url: String,
    /// Explicit Chromium binary; auto-detected when `None`.
    pub chrome_executable: Option<PathBuf>,
    /// Bound on browser process startup.
    pub launch_timeout: Duration,
    /// Bound on the page navigation.
    pub navigation_timeout: Duration,
    /// Bound on waiting for suggestions to render.
    pub dropdown_timeout: Duration,
    /// Inter-keystroke delay range in milliseconds.
    pub keystroke_delay_ms: (u64, u64),
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            landing_url: DEFAULT_LANDING_URL.to_string(),
            chrome_executable: None,
            launch_timeout: Duration::from_secs(20),
            navigation_timeout: Duration::from_secs(30),
            dropdown_timeout: Duration::from_secs(8),
            keystroke_delay_ms: (100, 200),
        }
    }
}

/// Production [`ResolveInteractive`] implementation over headless Chromium.
#[derive(Debug, Clone, Default)]
pub struct BrowserSymbolResolver {
    config: ResolverConfig,
}

impl BrowserSymbolResolver {
    /// Creates a resolver with the given tunables.
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    async fn drive(
        &self,
        browser: &StealthBrowser,
        query: &SymbolQuery,
    ) -> Result<Vec<SymbolCandidate>, NseError> {
        browser
            .navigate(&self.config.landing_url, self.config.navigation_timeout)
            .await?;
        browser
            .ride_out_challenge(self.config.navigation_timeout)
            .await?;

        let mut input = None;
        for &sel in SEARCH_INPUT_SELECTORS {
            if let Some(el) = browser.wait_for_element(sel, Duration::from_secs(2)).await {
                tracing::debug!(selector = sel, "found search input");
                input = Some(el);
                break;
            }
        }
        let Some(input) = input else {
            return Err(NseError::Browser("no company search input on page".into()));
        };

        input.click().await.map_err(browser_err)?;
        StealthBrowser::settle(400, 900).await;

        // Character-by-character with jitter, mimicking human cadence.
        let (lo, hi) = self.config.keystroke_delay_ms;
        for ch in query.normalized.chars() {
            input
                .type_str(ch.to_string())
                .await
                .map_err(browser_err)?;
            StealthBrowser::settle(lo, hi).await;
        }

        // Bounded wait for any suggestion container to render.
        let deadline = tokio::time::Instant::now() + self.config.dropdown_timeout;
        let mut rendered = false;
        'outer: while tokio::time::Instant::now() < deadline {
            for &sel in DROPDOWN_SELECTORS {
                if browser.page().find_element(sel).await.is_ok() {
                    rendered = true;
                    break 'outer;
                }
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        if !rendered {
            return Err(NseError::SymbolNotResolved {
                query: query.normalized.clone(),
            });
        }
        StealthBrowser::settle(500, 1000).await;

        let candidates: Vec<SymbolCandidate> = browser
            .page()
            .evaluate(EXTRACT_CANDIDATES_JS)
            .await
            .map_err(browser_err)?
            .into_value()
            .map_err(|e| NseError::Data(format!("candidate extraction: {e}")))?;

        if candidates.is_empty() {
            return Err(NseError::SymbolNotResolved {
                query: query.normalized.clone(),
            });
        }
        tracing::debug!(count = candidates.len(), "autocomplete candidates rendered");
        Ok(candidates)
    }
}

#[async_trait]
impl ResolveInteractive for BrowserSymbolResolver {
    async fn lookup(&self, query: &SymbolQuery) -> Result<Vec<SymbolCandidate>, NseError> {
        let fingerprint = FingerprintProfile::random();
        let browser = StealthBrowser::launch(
            &fingerprint,
            self.config.chrome_executable.as_ref(),
            self.config.launch_timeout,
        )
        .await?;

        // Teardown runs on every exit path.
        let outcome = self.drive(&browser, query).await;
        browser.close().await;
        outcome
    }
}
