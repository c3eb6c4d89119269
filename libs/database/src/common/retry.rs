use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff policy for startup connection attempts
///
/// Only connection establishment is retried. Once the service is up, store
/// errors go straight back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Scale each delay into 50%..100% so replicas don't reconnect in lockstep
    pub use_jitter: bool,
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Un-jittered delays, one per retry
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(move |retry| {
            let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
            let scaled = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
            Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
        })
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

/// Run `operation` until it succeeds, `should_retry` rejects the error, or
/// the retries in `config` are used up
///
/// # Example
/// ```ignore
/// use database::common::{retry_if, RetryConfig};
///
/// let client = retry_if(
///     || database::mongodb::connect(&url),
///     |e| e.is_transient(),
///     RetryConfig::new().with_max_retries(5),
/// ).await?;
/// ```
pub async fn retry_if<F, Fut, T, E, P>(
    mut operation: F,
    should_retry: P,
    config: RetryConfig,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut delays = config.delays();
    let mut attempt: u32 = 1;

    loop {
        let e = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Connected after retrying");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !should_retry(&e) {
            warn!(attempt, error = %e, "Permanent failure, not retrying");
            return Err(e);
        }

        let Some(delay) = delays.next() else {
            warn!(attempts = attempt, error = %e, "Giving up after exhausting retries");
            return Err(e);
        };

        let delay = if config.use_jitter {
            jitter(delay)
        } else {
            delay
        };

        debug!(
            attempt,
            max_retries = config.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %e,
            "Transient failure, retrying"
        );

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

fn jitter(delay: Duration) -> Duration {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let seed = RandomState::new().hash_one(std::time::SystemTime::now());
    let factor = 0.5 + (seed % 50) as f64 / 100.0;
    delay.mul_f64(factor)
}
