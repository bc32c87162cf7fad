//! Bounded condition polling.
//!
//! Every dynamic wait in the harness goes through [`until`]: poll an async
//! predicate with a growing interval until it holds or the policy's timeout
//! elapses. There are no fixed sleeps anywhere in step execution.

use std::future::Future;
use std::time::{Duration, Instant};

/// Wait bounds applied to every condition poll within a scenario.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_millis(500),
        }
    }
}

impl WaitPolicy {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Poll interval growth: half again as long each round, capped.
    pub fn next_interval(&self, current: Duration) -> Duration {
        (current * 3 / 2).min(self.max_interval)
    }
}

/// Poll `probe` until it returns true or the timeout elapses.
/// Returns whether the condition was met.
pub async fn until<F, Fut>(policy: &WaitPolicy, probe: F) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let mut interval = policy.initial_interval;

    loop {
        if probe().await {
            return true;
        }
        if start.elapsed() >= policy.timeout {
            return false;
        }
        tokio::time::sleep(interval).await;
        interval = policy.next_interval(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy() -> WaitPolicy {
        WaitPolicy {
            timeout: Duration::from_millis(80),
            initial_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn satisfied_condition_returns_immediately() {
        let start = Instant::now();
        assert!(until(&quick_policy(), || async { true }).await);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn unsatisfied_condition_times_out_bounded() {
        let start = Instant::now();
        assert!(!until(&quick_policy(), || async { false }).await);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(80));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn condition_met_mid_poll_succeeds() {
        let calls = AtomicU32::new(0);
        let met = until(&quick_policy(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { n >= 2 }
        })
        .await;
        assert!(met);
        assert!(calls.load(Ordering::SeqCst) >= 3);
    }

    #[test]
    fn interval_growth_is_capped() {
        let policy = WaitPolicy::default();
        let mut interval = policy.initial_interval;
        for _ in 0..10 {
            interval = policy.next_interval(interval);
            assert!(interval <= policy.max_interval);
        }
        assert_eq!(interval, policy.max_interval);
        assert_eq!(
            policy.next_interval(Duration::from_millis(100)),
            Duration::from_millis(150)
        );
    }
}
