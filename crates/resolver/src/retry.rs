use std::future::Future;
use std::time::Duration;

/// Bounded, fixed-backoff retry for sources that may not be populated yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn once() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// Runs `probe` until it yields a value or the attempts are used up.
///
/// Absence is never an error here: exhausting the policy returns `None` and
/// the caller simply tries again on its next trigger.
pub async fn retry_until_some<T, F, Fut>(policy: RetryPolicy, mut probe: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=policy.attempts.max(1) {
        if let Some(value) = probe(attempt).await {
            if attempt > 1 {
                log::debug!("Probe succeeded on attempt {attempt}");
            }
            return Some(value);
        }
        if attempt < policy.attempts {
            tokio::time::sleep(policy.backoff).await;
        }
    }
    log::debug!("Probe gave up after {} attempts", policy.attempts.max(1));
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn returns_first_success_after_backoff() {
        let calls = Cell::new(0u32);
        let started = Instant::now();
        let value = retry_until_some(RetryPolicy::default(), |attempt| {
            calls.set(calls.get() + 1);
            async move { (attempt == 3).then_some("pano") }
        })
        .await;

        assert_eq!(value, Some("pano"));
        assert_eq!(calls.get(), 3);
        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_bounded_attempts() {
        let calls = Cell::new(0u32);
        let started = Instant::now();
        let value: Option<()> = retry_until_some(RetryPolicy::default(), |_| {
            calls.set(calls.get() + 1);
            async { None }
        })
        .await;

        assert_eq!(value, None);
        assert_eq!(calls.get(), 10);
        assert!(started.elapsed() >= Duration::from_millis(4500));
        assert!(started.elapsed() < Duration::from_millis(5000));
    }
}
