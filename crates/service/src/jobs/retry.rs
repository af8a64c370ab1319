use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::JobError;

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Vec<Duration>,
    timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Vec<Duration>, timeout: Duration) -> Self {
        Self { max_attempts, backoff, timeout }
    }

    /// Bulk jobs: 3 attempts, 30s/60s/120s backoff, 300s per attempt.
    pub fn bulk() -> Self {
        Self::new(3, secs(&[30, 60, 120]), Duration::from_secs(300))
    }

    /// Single-item jobs: 3 attempts, 10s/30s/60s backoff, 60s per attempt.
    pub fn single_item() -> Self {
        Self::new(3, secs(&[10, 30, 60]), Duration::from_secs(60))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delay after failed attempt number `attempt` (1-based). The last step
    /// repeats when there are more attempts than steps.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let idx = attempt.saturating_sub(1) as usize;
        self.backoff.get(idx).or(self.backoff.last()).copied().unwrap_or_default()
    }

    pub async fn wait_before_retry(&self, attempt: u32) {
        if attempt == 0 {
            return;
        }
        let delay = self.backoff_for(attempt);
        debug!("Retrying in {:?} (attempt {})", delay, attempt);
        sleep(delay).await;
    }
}

fn secs(steps: &[u64]) -> Vec<Duration> {
    steps.iter().map(|s| Duration::from_secs(*s)).collect()
}

/// Run `operation` under `policy`: each attempt is bounded by the policy
/// timeout and followed by the policy backoff when it fails.
/// `on_attempt` sees the 1-based attempt number before each try.
pub async fn run_with_policy<T, F, Fut>(
    policy: &RetryPolicy,
    mut on_attempt: impl FnMut(u32),
    mut operation: F,
) -> Result<T, JobError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, JobError>>,
{
    let max = policy.max_attempts();
    let mut attempt = 1;
    loop {
        on_attempt(attempt);
        let outcome = match timeout(policy.timeout(), operation()).await {
            Ok(result) => result,
            Err(_) => Err(JobError::Timeout(policy.timeout())),
        };
        match outcome {
            Ok(value) => return Ok(value),
            Err(JobError::QueueClosed) => return Err(JobError::QueueClosed),
            Err(e) if attempt < max => {
                warn!(attempt, max, error = %e, "attempt failed; will retry");
                policy.wait_before_retry(attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn policies_match_job_classes() {
        let bulk = RetryPolicy::bulk();
        assert_eq!(bulk.max_attempts(), 3);
        assert_eq!(bulk.backoff_for(1), Duration::from_secs(30));
        assert_eq!(bulk.backoff_for(2), Duration::from_secs(60));
        assert_eq!(bulk.backoff_for(3), Duration::from_secs(120));
        assert_eq!(bulk.timeout(), Duration::from_secs(300));

        let single = RetryPolicy::single_item();
        assert_eq!(single.backoff_for(1), Duration::from_secs(10));
        assert_eq!(single.backoff_for(9), Duration::from_secs(60));
        assert_eq!(single.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let p = RetryPolicy::new(0, vec![], Duration::from_secs(1));
        assert_eq!(p.max_attempts(), 1);
        assert_eq!(p.backoff_for(1), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_with_backoff_then_succeeds() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        let mut seen = Vec::new();
        let result = run_with_policy(&RetryPolicy::single_item(), |a| seen.push(a), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(JobError::Systemic("db down".into()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(seen, vec![1, 2, 3]);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(40) && waited < Duration::from_secs(41), "{waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_time_out() {
        let policy = RetryPolicy::single_item();
        let mut attempts = 0;
        let result: Result<(), JobError> = run_with_policy(&policy, |_| attempts += 1, || async {
            sleep(Duration::from_secs(120)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(JobError::Timeout(Duration::from_secs(60))));
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn queue_closed_is_not_retried() {
        let mut attempts = 0;
        let result: Result<(), JobError> =
            run_with_policy(&RetryPolicy::bulk(), |_| attempts += 1, || async { Err(JobError::QueueClosed) }).await;
        assert_eq!(result, Err(JobError::QueueClosed));
        assert_eq!(attempts, 1);
    }
}
