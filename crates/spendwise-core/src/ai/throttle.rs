//! Outbound request throttling for LLM calls
//!
//! A `RequestGate` bounds how hard we hit the provider:
//! - at most `max_concurrent` calls in flight
//! - at most `requests_per_minute` calls started per rate window
//! - retryable failures (429/500/503, timeouts) are retried with exponential
//!   backoff plus random jitter

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::AiLimits;

pub struct RequestGate {
    permits: Arc<Semaphore>,
    started: Mutex<VecDeque<Instant>>,
    limits: AiLimits,
}

impl RequestGate {
    pub fn new(limits: AiLimits) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limits.max_concurrent.max(1))),
            started: Mutex::new(VecDeque::new()),
            limits,
        }
    }

    /// Delay before retry number `attempt` (0-based), jitter included
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .limits
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.limits.max_delay);
        let jitter_ms = self.limits.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        } else {
            Duration::ZERO
        };
        exponential + jitter
    }

    /// Wait for a concurrency slot and room in the rate window
    async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::InvalidData("request gate closed".into()))?;

        loop {
            let wait = {
                let mut started = self.started.lock().await;
                let now = Instant::now();
                while started
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= self.limits.rate_window)
                {
                    started.pop_front();
                }

                if started.len() < self.limits.requests_per_minute.max(1) {
                    started.push_back(now);
                    return Ok(permit);
                }

                // Oldest call leaves the window first
                started
                    .front()
                    .map(|t| self.limits.rate_window.saturating_sub(now.duration_since(*t)))
                    .unwrap_or(self.limits.rate_window)
            };

            debug!(wait_ms = wait.as_millis() as u64, "Rate window full, waiting");
            sleep(wait).await;
        }
    }

    /// Run `operation` under the gate, retrying retryable failures
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            let permit = self.acquire().await?;
            let result = operation().await;
            drop(permit);

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.limits.max_retries => {
                    let mut delay = self.backoff_delay(attempt);
                    if let Error::RateLimited { retry_after_ms } = &e {
                        delay = delay.max(Duration::from_millis(*retry_after_ms));
                    }
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "LLM call failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_limits() -> AiLimits {
        AiLimits {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            max_jitter: Duration::ZERO,
            ..AiLimits::default()
        }
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let gate = RequestGate::new(AiLimits {
            max_jitter: Duration::ZERO,
            ..AiLimits::default()
        });
        assert_eq!(gate.backoff_delay(0), Duration::from_millis(1000));
        assert_eq!(gate.backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(gate.backoff_delay(3), Duration::from_millis(8000));
        assert_eq!(gate.backoff_delay(10), Duration::from_millis(30_000));
    }

    #[test]
    fn test_backoff_jitter_bounds() {
        let gate = RequestGate::new(AiLimits::default());
        for _ in 0..20 {
            let delay = gate.backoff_delay(0);
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(2000));
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let gate = RequestGate::new(fast_limits());
        let calls = AtomicUsize::new(0);

        let result = gate
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(Error::Ai {
                        status: 503,
                        message: "busy".into(),
                    })
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let gate = RequestGate::new(fast_limits());
        let calls = AtomicUsize::new(0);

        let result: Result<()> = gate
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Ai {
                    status: 429,
                    message: "slow down".into(),
                })
            })
            .await;

        assert!(result.is_err());
        // First try plus three retries
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_fast() {
        let gate = RequestGate::new(fast_limits());
        let calls = AtomicUsize::new(0);

        let result: Result<()> = gate
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Ai {
                    status: 401,
                    message: "bad key".into(),
                })
            })
            .await;

        assert!(matches!(result, Err(Error::Ai { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_window_delays_excess_calls() {
        let gate = RequestGate::new(AiLimits {
            requests_per_minute: 2,
            rate_window: Duration::from_millis(150),
            ..fast_limits()
        });

        let start = Instant::now();
        for _ in 0..3 {
            gate.run(|| async { Ok(()) }).await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let gate = Arc::new(RequestGate::new(AiLimits {
            max_concurrent: 2,
            requests_per_minute: 100,
            ..fast_limits()
        }));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let gate = gate.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                gate.run(|| {
                    let in_flight = in_flight.clone();
                    let peak = peak.clone();
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        sleep(Duration::from_millis(20)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
