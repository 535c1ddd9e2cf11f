//! Receipt submission protocol
//!
//! Reports a completed checkout to the entitlement service. One submission is
//! a small state machine, `Pending -> Succeeded | Failed`, driven by a bounded
//! loop:
//!
//! - disabled submission skips straight to `Succeeded` with no network call
//! - an optional fixed delay runs before the first attempt
//! - retryable failures (see [`Error::is_retryable`]) back off exponentially
//!   with jitter, capped per attempt, for at most `max_retries` retries
//! - anything else, or exhausted retries, ends in `Failed` with the last error

use crate::cancel::{run_cancellable, sleep_cancellable};
use crate::config::{RetrySettings, Session};
use crate::entitlement::EntitlementApi;
use crate::error::{Error, Result};
use crate::model::ReceiptConfirmation;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Backoff policy for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound on any single backoff, jitter included
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            max_jitter: Duration::from_millis(settings.max_jitter_ms),
        }
    }
}

impl RetryPolicy {
    /// `min(base * 2^attempt + jitter, max_delay)`
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32, jitter: Duration) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        self.base_delay
            .saturating_mul(multiplier)
            .saturating_add(jitter.min(self.max_jitter))
            .min(self.max_delay)
    }

    /// Delay before retry number `attempt + 1`, with random jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        } else {
            Duration::ZERO
        };
        self.delay_for_attempt(attempt, jitter)
    }

    #[must_use]
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Worst-case time spent in backoff across all retries.
    #[must_use]
    pub fn max_total_backoff(&self) -> Duration {
        (0..self.max_retries)
            .map(|attempt| self.delay_for_attempt(attempt, self.max_jitter))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

/// Where a submission ended up when it succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// The service accepted the receipt
    Confirmed(ReceiptConfirmation),
    /// Submission is disabled for this integration
    Skipped,
}

#[derive(Debug)]
pub enum SubmissionState {
    /// Attempt `attempt` (0-based) is next
    Pending { attempt: u32 },
    Succeeded(SubmissionOutcome),
    Failed(Error),
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionState::Pending { .. })
    }
}

/// The finished submission and how many network attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReport {
    pub outcome: SubmissionOutcome,
    pub attempts: u32,
}

/// A completed checkout waiting to be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseCompletion {
    pub transaction_id: String,
    pub offering_id: String,
}

/// One receipt submission, driven to a terminal state by [`ReceiptSubmission::run`].
pub struct ReceiptSubmission<'a, E: EntitlementApi + ?Sized> {
    api: &'a E,
    session: &'a Session,
    completion: &'a PurchaseCompletion,
    policy: RetryPolicy,
    state: SubmissionState,
    attempts: u32,
}

impl<'a, E: EntitlementApi + ?Sized> ReceiptSubmission<'a, E> {
    pub fn new(api: &'a E, session: &'a Session, completion: &'a PurchaseCompletion) -> Self {
        Self {
            api,
            session,
            completion,
            policy: RetryPolicy::from(&session.config.retry),
            state: SubmissionState::Pending { attempt: 0 },
            attempts: 0,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Network attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Runs the protocol to completion.
    #[instrument(skip_all, fields(transaction_id = %self.completion.transaction_id))]
    pub async fn run(mut self, cancel: &CancellationToken) -> Result<SubmissionReport> {
        let session = self.session;
        let config = &session.config;

        if config.disable_receipt_submission {
            info!("receipt submission disabled; skipping");
            self.state = SubmissionState::Succeeded(SubmissionOutcome::Skipped);
            return self.finish();
        }

        if let Some(delay) = config.submission_delay() {
            if let Err(err) = sleep_cancellable(cancel, delay).await {
                self.state = SubmissionState::Failed(err);
                return self.finish();
            }
        }

        while let SubmissionState::Pending { attempt } = self.state {
            self.state = self.step(attempt, cancel).await;
        }

        self.finish()
    }

    async fn step(&mut self, attempt: u32, cancel: &CancellationToken) -> SubmissionState {
        self.attempts += 1;
        let result = run_cancellable(
            cancel,
            self.api.submit_receipt(
                self.session.entitlement_key(),
                self.session.user_id(),
                &self.completion.transaction_id,
                &self.completion.offering_id,
            ),
        )
        .await;

        let err = match result {
            Ok(confirmation) => {
                info!(attempts = self.attempts, "receipt accepted");
                return SubmissionState::Succeeded(SubmissionOutcome::Confirmed(confirmation));
            }
            Err(err) => err,
        };

        if !err.is_retryable() || !self.policy.can_retry(attempt) {
            warn!(attempts = self.attempts, error = %err, "receipt submission failed");
            return SubmissionState::Failed(err);
        }

        let delay = self.policy.backoff(attempt);
        warn!(
            attempt = attempt + 1,
            max_retries = self.policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "retrying receipt submission"
        );
        match sleep_cancellable(cancel, delay).await {
            Ok(()) => SubmissionState::Pending {
                attempt: attempt + 1,
            },
            Err(cancelled) => SubmissionState::Failed(cancelled),
        }
    }

    fn finish(self) -> Result<SubmissionReport> {
        match self.state {
            SubmissionState::Succeeded(outcome) => Ok(SubmissionReport {
                outcome,
                attempts: self.attempts,
            }),
            SubmissionState::Failed(err) => Err(err),
            // run() only returns once the loop leaves Pending
            SubmissionState::Pending { .. } => Err(Error::Cancelled),
        }
    }
}

/// Submits a receipt for `completion` using the session's retry settings.
pub async fn submit_receipt<E: EntitlementApi + ?Sized>(
    api: &E,
    session: &Session,
    completion: &PurchaseCompletion,
    cancel: &CancellationToken,
) -> Result<SubmissionReport> {
    ReceiptSubmission::new(api, session, completion)
        .run(cancel)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            max_jitter: Duration::from_millis(1000),
        }
    }

    #[test]
    fn default_policy_matches_settings() {
        let p = RetryPolicy::default();
        assert_eq!(p, policy());
    }

    #[test]
    fn exponential_backoff_without_jitter() {
        let p = policy();
        assert_eq!(p.delay_for_attempt(0, Duration::ZERO), Duration::from_secs(1));
        assert_eq!(p.delay_for_attempt(1, Duration::ZERO), Duration::from_secs(2));
        assert_eq!(p.delay_for_attempt(2, Duration::ZERO), Duration::from_secs(4));
        assert_eq!(p.delay_for_attempt(3, Duration::ZERO), Duration::from_secs(8));
    }

    #[test]
    fn delay_is_capped_including_jitter() {
        let p = policy();
        assert_eq!(
            p.delay_for_attempt(3, Duration::from_millis(1000)),
            Duration::from_secs(9)
        );
        assert_eq!(
            p.delay_for_attempt(4, Duration::from_millis(500)),
            Duration::from_secs(10)
        );
        assert_eq!(p.delay_for_attempt(40, Duration::ZERO), Duration::from_secs(10));
    }

    #[test]
    fn jitter_is_clamped() {
        let p = policy();
        assert_eq!(
            p.delay_for_attempt(0, Duration::from_secs(30)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn random_backoff_stays_in_range() {
        let p = policy();
        for attempt in 0..6 {
            for _ in 0..50 {
                let d = p.backoff(attempt);
                assert!(d >= p.delay_for_attempt(attempt, Duration::ZERO));
                assert!(d <= p.max_delay);
            }
        }
    }

    #[test]
    fn can_retry_bound() {
        let p = policy();
        assert!(p.can_retry(0));
        assert!(p.can_retry(2));
        assert!(!p.can_retry(3));
    }

    #[test]
    fn total_backoff_bound() {
        // 2s + 3s + 5s worst case
        assert_eq!(policy().max_total_backoff(), Duration::from_secs(10));
    }
}
