#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use httpmock::MockServer;
use nse_filings_rs::{
    AcquireSession, AcquisitionEngine, FingerprintProfile, NseError, RetryConfig, Session,
    SessionCookie,
};
use tokio::sync::Mutex;
use url::Url;

/// Starts a mock server, installing an env-filtered subscriber once so
/// `RUST_LOG=nse_filings_rs=debug` surfaces crate events during a test run.
pub fn setup_server() -> MockServer {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    MockServer::start()
}

/// Retry policies with millisecond backoff so tests stay fast.
pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        base_delay: Duration::from_millis(1),
        factor: 2.0,
        max_delay: Duration::from_millis(5),
        jitter: false,
    }
}

/// An acquirer that hands out scripted cookie values and counts launches,
/// standing in for the browser flow.
pub struct ScriptedAcquirer {
    values: Mutex<VecDeque<String>>,
    launches: AtomicUsize,
}

impl ScriptedAcquirer {
    pub fn new(values: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            values: Mutex::new(values.iter().map(|s| (*s).to_string()).collect()),
            launches: AtomicUsize::new(0),
        })
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AcquireSession for ScriptedAcquirer {
    async fn acquire(&self) -> Result<Session, NseError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let mut values = self.values.lock().await;
        let value = if values.len() > 1 {
            values.pop_front().unwrap()
        } else {
            values
                .front()
                .cloned()
                .ok_or_else(|| NseError::SessionUnavailable("script exhausted".into()))?
        };
        let now = Utc::now();
        Ok(Session {
            cookies: vec![SessionCookie {
                name: "nsit".into(),
                value,
            }],
            fingerprint: FingerprintProfile::random(),
            acquired_at: now,
            cache_expires_at: now + chrono::Duration::minutes(5),
        })
    }
}

/// An acquirer whose every attempt times out.
pub struct TimingOutAcquirer {
    pub launches: AtomicUsize,
}

#[async_trait]
impl AcquireSession for TimingOutAcquirer {
    async fn acquire(&self) -> Result<Session, NseError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Err(NseError::Timeout("navigation to landing page".into()))
    }
}

/// Engine wired to the mock server with scripted sessions and fast retries.
pub fn engine_over(
    server: &MockServer,
    acquirer: Arc<dyn AcquireSession>,
) -> AcquisitionEngine {
    AcquisitionEngine::builder()
        .acquirer(acquirer)
        .exact_resolution_only()
        .api_url(api_url(server))
        .session_retry(fast_retry(1))
        .fetch_retry(fast_retry(3))
        .build()
        .unwrap()
}

pub fn api_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/api/corporate-announcements", server.base_url())).unwrap()
}

/// A wire-format announcement row with the given broadcast time string.
pub fn wire_row(symbol: &str, file: &str, when: &str) -> serde_json::Value {
    serde_json::json!({
        "symbol": symbol,
        "desc": "Board Meeting Intimation",
        "attchmntFile": file,
        "smIndustry": "Refineries",
        "attchmntText": "Intimation of board meeting outcome",
        "fileSize": "120 KB",
        "exchdisstime": when,
    })
}

/// A broadcast time string `days_ago` days in the past, in the source's
/// primary format and timezone.
pub fn broadcast_days_ago(days_ago: i64) -> String {
    (Utc::now() - chrono::Duration::days(days_ago))
        .with_timezone(&chrono_tz::Asia::Kolkata)
        .format("%d-%b-%Y %H:%M:%S")
        .to_string()
}
