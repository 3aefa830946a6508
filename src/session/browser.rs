//! Shared stealth browser plumbing for the acquirer and the interactive
//! symbol resolver.
//!
//! Every launch gets a fresh fingerprint-configured context; the process is
//! torn down on every exit path via [`StealthBrowser::close`], which the
//! owning flows call from success, failure, and timeout branches alike.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::core::NseError;
use crate::fingerprint::FingerprintProfile;
use crate::session::SessionCookie;

/// Launch flags that disable automation banners and the sandboxed
/// environments that break inside containers.
const LAUNCH_ARGS: &[&str] = &[
    "--headless=new",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-blink-features=AutomationControlled",
    "--disable-gpu",
    "--no-first-run",
    "--no-zygote",
    "--disable-extensions",
    "--disable-background-networking",
];

/// Runs before any page script: hides the automation globals the site's
/// heuristics probe for and pins navigator/geolocation values to the
/// fingerprint. `__LAT__`/`__LON__` are substituted at launch.
const STEALTH_INIT_SCRIPT: &str = r"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', {
  get: () => ({
    length: 4,
    0: { name: 'Chrome PDF Plugin' },
    1: { name: 'Chrome PDF Viewer' },
    2: { name: 'Native Client' },
    3: { name: 'WebKit built-in PDF' },
  }),
});
Object.defineProperty(navigator, 'hardwareConcurrency', { get: () => 8 });
window.chrome = window.chrome || { runtime: {} };
delete window.cdc_adoQpoasnfa76pfcZLmcfl_Array;
delete window.cdc_adoQpoasnfa76pfcZLmcfl_Promise;
delete window.cdc_adoQpoasnfa76pfcZLmcfl_Symbol;
if (navigator.geolocation) {
  navigator.geolocation.getCurrentPosition = (ok) => ok({
    coords: { latitude: __LAT__, longitude: __LON__, accuracy: 50 },
    timestamp: Date.now(),
  });
}
";

/// Title fragments of the target's interstitial challenge page.
const CHALLENGE_TITLES: &[&str] = &["Just a moment", "Checking your browser"];

pub(crate) fn browser_err(e: impl std::fmt::Display) -> NseError {
    NseError::Browser(e.to_string())
}

/// A launched headless Chromium with one configured page.
pub(crate) struct StealthBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
}

impl StealthBrowser {
    /// Launches a browser configured for `fingerprint` and opens a blank page
    /// with the stealth script installed.
    pub(crate) async fn launch(
        fingerprint: &FingerprintProfile,
        executable: Option<&PathBuf>,
        launch_timeout: Duration,
    ) -> Result<Self, NseError> {
        let mut builder = BrowserConfig::builder()
            .arg(format!("--user-agent={}", fingerprint.user_agent))
            .arg(format!(
                "--window-size={},{}",
                fingerprint.viewport_width, fingerprint.viewport_height
            ))
            .arg(format!("--lang={}", fingerprint.locale));
        for arg in LAUNCH_ARGS {
            builder = builder.arg(*arg);
        }
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| NseError::SessionUnavailable(format!("browser config: {e}")))?;

        let (browser, mut handler) = tokio::time::timeout(launch_timeout, Browser::launch(config))
            .await
            .map_err(|_| NseError::Timeout("browser launch".into()))?
            .map_err(|e| NseError::SessionUnavailable(format!("browser failed to start: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(p) => p,
            Err(e) => {
                let mut b = browser;
                let _ = b.close().await;
                handler_task.abort();
                return Err(NseError::SessionUnavailable(format!(
                    "failed to open page: {e}"
                )));
            }
        };

        let this = Self {
            browser,
            handler_task,
            page,
        };

        let script = STEALTH_INIT_SCRIPT
            .replace("__LAT__", &fingerprint.latitude.to_string())
            .replace("__LON__", &fingerprint.longitude.to_string());
        if let Err(e) = this.install_overrides(&script, &fingerprint.timezone).await {
            this.close().await;
            return Err(e);
        }

        Ok(this)
    }

    async fn install_overrides(&self, script: &str, timezone: &str) -> Result<(), NseError> {
        self.page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(script))
            .await
            .map_err(browser_err)?;
        self.page
            .execute(SetTimezoneOverrideParams::new(timezone))
            .await
            .map_err(browser_err)?;
        Ok(())
    }

    pub(crate) fn page(&self) -> &Page {
        &self.page
    }

    /// Navigates with a bounded timeout and waits for the load to settle.
    pub(crate) async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), NseError> {
        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| NseError::Timeout(format!("navigation to {url}")))?
            .map_err(browser_err)?;
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    /// Current document title, empty when unavailable.
    pub(crate) async fn title(&self) -> String {
        self.page
            .evaluate("document.title")
            .await
            .ok()
            .and_then(|v| v.into_value::<String>().ok())
            .unwrap_or_default()
    }

    /// Whether the current page is the "checking your browser" interstitial.
    pub(crate) async fn on_challenge_page(&self) -> bool {
        let title = self.title().await;
        CHALLENGE_TITLES.iter().any(|t| title.contains(t))
    }

    /// Waits out the interstitial challenge, polling the title until it
    /// clears or `max_wait` elapses. Returns `Timeout` if it never clears.
    pub(crate) async fn ride_out_challenge(&self, max_wait: Duration) -> Result<(), NseError> {
        if !self.on_challenge_page().await {
            return Ok(());
        }
        tracing::info!("interstitial challenge detected, waiting for it to clear");
        let deadline = tokio::time::Instant::now() + max_wait;
        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            if !self.on_challenge_page().await {
                return Ok(());
            }
        }
        Err(NseError::Timeout("browser challenge page".into()))
    }

    /// Polls for a selector until it matches or `timeout` elapses.
    pub(crate) async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Option<Element> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Ok(el) = self.page.find_element(selector).await {
                return Some(el);
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    /// Tries each selector in priority order, clicking the first match.
    /// Returns the winning selector, or `None` when nothing matched.
    pub(crate) async fn click_first(
        &self,
        selectors: &[&'static str],
        per_selector_wait: Duration,
    ) -> Option<&'static str> {
        for &sel in selectors {
            if let Some(el) = self.wait_for_element(sel, per_selector_wait).await
                && el.click().await.is_ok()
            {
                return Some(sel);
            }
        }
        None
    }

    /// Sleeps a randomized interval, mimicking a human pause.
    pub(crate) async fn settle(min_ms: u64, max_ms: u64) {
        let ms = rand::random_range(min_ms..=max_ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Full cookie jar of the browsing context, in reported order.
    pub(crate) async fn cookies(&self) -> Result<Vec<SessionCookie>, NseError> {
        let raw = self.page.get_cookies().await.map_err(browser_err)?;
        Ok(raw
            .into_iter()
            .map(|c| SessionCookie {
                name: c.name,
                value: c.value,
            })
            .collect())
    }

    /// Closes page and browser; must run on every exit path.
    pub(crate) async fn close(self) {
        let Self {
            mut browser,
            handler_task,
            page,
        } = self;
        let _ = page.close().await;
        let _ = browser.close().await;
        let _ = browser.wait().await;
        handler_task.abort();
    }
}
