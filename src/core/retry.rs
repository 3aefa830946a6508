use std::future::Future;
use std::time::Duration;

use crate::core::NseError;

/// Configuration for the automatic retry mechanism.
///
/// Backoff between attempts is `base * factor^attempt`, capped at `max_delay`,
/// with optional +/- 50% jitter.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// The initial backoff duration.
    pub base_delay: Duration,
    /// The multiplicative factor for each subsequent retry.
    pub factor: f64,
    /// The maximum duration to wait between attempts.
    pub max_delay: Duration,
    /// Whether to apply random jitter to the delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::for_fetch()
    }
}

impl RetryConfig {
    /// Policy for announcement fetches: 3 attempts, 2s base delay doubling.
    #[must_use]
    pub fn for_fetch() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            factor: 2.0,
            max_delay: Duration::from_secs(15),
            jitter: true,
        }
    }

    /// Policy for session acquisition: browser launches are expensive, so
    /// only one retry.
    #[must_use]
    pub fn for_session() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_secs(2),
            factor: 2.0,
            max_delay: Duration::from_secs(8),
            jitter: false,
        }
    }

    /// Delay to sleep after a failed attempt (0-based). `max_delay` bounds
    /// the result even after jitter.
    pub(crate) fn delay_for(&self, attempt: u32) -> Duration {
        let mut secs = self.base_delay.as_secs_f64() * self.factor.powi(attempt as i32);
        if self.jitter {
            secs *= rand::random_range(0.5..=1.5);
        }
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Runs `op` up to `cfg.max_attempts` times, sleeping between attempts.
///
/// Only errors whose classification is retryable trigger another attempt;
/// the final error is propagated unchanged, classification intact.
pub(crate) async fn with_retry<T, F, Fut>(cfg: &RetryConfig, mut op: F) -> Result<T, NseError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, NseError>>,
{
    let attempts = cfg.max_attempts.max(1);
    let mut last_err = None;

    for attempt in 0..attempts {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                let more_attempts = attempt + 1 < attempts;
                if !e.retryable() || !more_attempts {
                    return Err(e);
                }
                let delay = cfg.delay_for(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    ?delay,
                    error = %e,
                    "attempt failed, backing off"
                );
                last_err = Some(e);
                tokio::time::sleep(delay).await;
            }
        }
    }

    // Unreachable with attempts >= 1, but keeps the compiler satisfied.
    Err(last_err.unwrap_or_else(|| NseError::Data("retry loop ran zero attempts".into())))
}
