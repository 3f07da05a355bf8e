//! Retry Engine with Model Fallback
//!
//! One stage invocation gets a fixed budget: the primary model is tried
//! `max_retries` times, then each configured fallback model once, in order.
//! The first success wins. If the whole budget burns, every attempt is
//! aggregated into a single `Error::StageExhausted`.
//!
//! Jittered exponential backoff applies between primary retries only;
//! switching to a fallback model is itself the recovery action.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::constants::retry;
use crate::types::{AttemptRecord, Error, Result, StageName};

/// Backoff and budget knobs for one stage invocation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts on the primary model before fallbacks are consulted
    pub max_retries: u32,
    /// Delay before the second primary attempt
    pub base_delay: Duration,
    /// Cap on any single delay
    pub max_delay: Duration,
    /// Multiplier applied per retry
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: retry::DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(retry::BASE_DELAY_MS),
            max_delay: Duration::from_secs(retry::MAX_DELAY_SECS),
            backoff_factor: retry::BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Policy that never sleeps. Used by tests and health probes.
    pub fn no_backoff(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_factor: 1.0,
        }
    }

    /// Delay before primary attempt `attempt` (1-based; no delay before the first).
    fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 || self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exp = self.backoff_factor.powi(attempt as i32 - 2);
        let raw = self.base_delay.as_millis() as f64 * exp;
        let capped = raw.min(self.max_delay.as_millis() as f64);
        // Full jitter keeps concurrent stages from probing in lockstep
        let jittered = rand::rng().random_range(0.0..=capped);
        Duration::from_millis(jittered as u64)
    }
}

/// Run `call` for `stage` against the primary model, retrying and then
/// walking the fallback chain. Returns the first success, or
/// `Error::StageExhausted` carrying every failed attempt.
///
/// `Config` and `InvalidPrompt` failures abort immediately without
/// consuming the remaining budget.
pub async fn invoke_with_fallback<F, Fut, T>(
    policy: &RetryPolicy,
    stage: StageName,
    primary: &str,
    fallbacks: &[String],
    mut call: F,
) -> Result<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts: Vec<AttemptRecord> = Vec::new();

    for attempt in 1..=policy.max_retries.max(1) {
        let delay = policy.delay_before(attempt);
        if !delay.is_zero() {
            sleep(delay).await;
        }

        match call(primary.to_string()).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(stage = %stage, model = primary, attempt, error = %e, "Model call failed");
                attempts.push(AttemptRecord {
                    model: primary.to_string(),
                    attempt,
                    error: e.to_string(),
                });
            }
        }
    }

    for fallback in fallbacks {
        info!(stage = %stage, model = %fallback, "Trying fallback model");
        match call(fallback.clone()).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(stage = %stage, model = %fallback, error = %e, "Fallback model failed");
                attempts.push(AttemptRecord {
                    model: fallback.clone(),
                    attempt: 1,
                    error: e.to_string(),
                });
            }
        }
    }

    Err(Error::StageExhausted { stage, attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn policy() -> RetryPolicy {
        RetryPolicy::no_backoff(2)
    }

    fn chain(models: &[&str]) -> Vec<String> {
        models.iter().map(|m| m.to_string()).collect()
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let calls = Mutex::new(Vec::new());
        let result = invoke_with_fallback(
            &policy(),
            StageName::Analysis,
            "primary",
            &chain(&["fb1"]),
            |model| {
                calls.lock().unwrap().push(model);
                async { Ok::<_, Error>("ok") }
            },
        )
        .await
        .unwrap();

        assert_eq!(result, "ok");
        assert_eq!(*calls.lock().unwrap(), vec!["primary"]);
    }

    #[tokio::test]
    async fn test_succeeds_after_primary_retry() {
        let count = Mutex::new(0u32);
        let result = invoke_with_fallback(
            &policy(),
            StageName::Generation,
            "primary",
            &chain(&["fb1"]),
            |model| {
                let mut n = count.lock().unwrap();
                *n += 1;
                let attempt = *n;
                async move {
                    if attempt < 2 {
                        Err(Error::model(model, "flaky"))
                    } else {
                        Ok(attempt)
                    }
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(result, 2);
    }

    #[tokio::test]
    async fn test_exhaustion_order_and_aggregation() {
        let calls = Mutex::new(Vec::new());
        let err = invoke_with_fallback(
            &policy(),
            StageName::Vetting,
            "primary",
            &chain(&["fb1", "fb2"]),
            |model| {
                calls.lock().unwrap().push(model.clone());
                async move { Err::<(), _>(Error::model(model, "down")) }
            },
        )
        .await
        .unwrap_err();

        // Primary twice, then each fallback once, in configured order
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["primary", "primary", "fb1", "fb2"]
        );

        match err {
            Error::StageExhausted { stage, attempts } => {
                assert_eq!(stage, StageName::Vetting);
                assert_eq!(attempts.len(), 4);
                assert_eq!(attempts[0].model, "primary");
                assert_eq!(attempts[0].attempt, 1);
                assert_eq!(attempts[1].attempt, 2);
                assert_eq!(attempts[2].model, "fb1");
                assert_eq!(attempts[3].model, "fb2");
            }
            other => panic!("expected StageExhausted, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_fallback_success_stops_chain() {
        let calls = Mutex::new(Vec::new());
        let result = invoke_with_fallback(
            &policy(),
            StageName::Enhancement,
            "primary",
            &chain(&["fb1", "fb2"]),
            |model| {
                calls.lock().unwrap().push(model.clone());
                async move {
                    if model == "fb1" {
                        Ok(model)
                    } else {
                        Err(Error::model(model, "nope"))
                    }
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(result, "fb1");
        assert_eq!(*calls.lock().unwrap(), vec!["primary", "primary", "fb1"]);
    }

    #[tokio::test]
    async fn test_empty_fallback_chain() {
        let err = invoke_with_fallback(
            &policy(),
            StageName::Finalization,
            "only",
            &[],
            |model| async move { Err::<(), _>(Error::model(model, "down")) },
        )
        .await
        .unwrap_err();

        match err {
            Error::StageExhausted { attempts, .. } => assert_eq!(attempts.len(), 2),
            other => panic!("expected StageExhausted, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_fatal_error_short_circuits() {
        let calls = Mutex::new(0u32);
        let err = invoke_with_fallback(
            &policy(),
            StageName::Analysis,
            "primary",
            &chain(&["fb1"]),
            |_| {
                *calls.lock().unwrap() += 1;
                async { Err::<(), _>(Error::Config("bad".into())) }
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(250),
            backoff_factor: 2.0,
        };
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        // Jittered, so only upper bounds are checkable
        assert!(policy.delay_before(2) <= Duration::from_millis(100));
        assert!(policy.delay_before(4) <= Duration::from_millis(250));
    }
}
