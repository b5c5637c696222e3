//! Retry policy and the retrying call helper.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, warn};

/// Attempt budget and base backoff delay for one kind of call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub attempts: u32,
    /// Delay after the first failure; doubles after each subsequent one
    #[serde(rename = "base_delay_ms", with = "millis")]
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Policy with the given attempt budget and base delay.
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// The sleeps between attempts, in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use explodeit_retry::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let delays: Vec<_> = RetryPolicy::new(4, Duration::from_millis(500)).delays().collect();
    /// assert_eq!(
    ///     delays,
    ///     vec![Duration::from_millis(500), Duration::from_millis(1000), Duration::from_millis(2000)]
    /// );
    /// ```
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let base = self.base_delay;
        (0..self.attempts.saturating_sub(1)).map(move |i| base.saturating_mul(2u32.saturating_pow(i)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// Run `op`, retrying every failure according to `policy`.
///
/// `context` labels the warning logged for each failed attempt. When every
/// attempt fails the error of the final attempt is returned.
pub async fn call_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    context: &str,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0u32;

    Retry::spawn(policy.delays(), || {
        attempt += 1;
        let current = attempt;
        let fut = op();
        async move {
            match fut.await {
                Ok(value) => {
                    if current > 1 {
                        debug!(context, attempt = current, "Succeeded after retry");
                    }
                    Ok(value)
                }
                Err(err) => {
                    warn!(
                        context,
                        attempt = current,
                        max_attempts = attempts,
                        error = %err,
                        "Attempt failed"
                    );
                    Err(RetryError::Transient {
                        err,
                        retry_after: None,
                    })
                }
            }
        }
    })
    .await
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
