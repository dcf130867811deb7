use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ReconcileError, Result};

/// Lifecycle of a single poll session.
///
/// `Running` is the only non-final state. `Cancelled` is the sentinel set by
/// the owning handle; a cancelled session never reports an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl SessionState {
    pub fn is_final(self) -> bool {
        !matches!(self, SessionState::Running)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Running => write!(f, "running"),
            SessionState::Succeeded => write!(f, "succeeded"),
            SessionState::Failed => write!(f, "failed"),
            SessionState::TimedOut => write!(f, "timedOut"),
            SessionState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Spacing between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Every tick waits exactly `interval`.
    Fixed,
    /// delay = interval * 2^(attempt - 1), capped at `max_interval`.
    Exponential { max_interval: Duration },
}

/// Timing and budget configuration for a poll session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    /// Stop after this many non-terminal observations. `None` means unbounded by count.
    pub attempt_budget: Option<u32>,
    /// Stop once this much time has elapsed since start. `None` means unbounded by time.
    pub time_budget: Option<Duration>,
    pub backoff: Backoff,
}

impl PollOptions {
    /// Fixed-interval options with no budget yet; add at least one before starting.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            attempt_budget: None,
            time_budget: None,
            backoff: Backoff::Fixed,
        }
    }

    pub fn with_attempt_budget(mut self, attempts: u32) -> Self {
        self.attempt_budget = Some(attempts);
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Rejects options that would poll in a tight loop or never terminate.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ReconcileError::InvalidOptions(
                "interval must be positive".into(),
            ));
        }
        if self.attempt_budget.is_none() && self.time_budget.is_none() {
            return Err(ReconcileError::InvalidOptions(
                "at least one of attempt_budget or time_budget must be set".into(),
            ));
        }
        if self.attempt_budget == Some(0) {
            return Err(ReconcileError::InvalidOptions(
                "attempt_budget must be positive".into(),
            ));
        }
        if self.time_budget.is_some_and(|b| b.is_zero()) {
            return Err(ReconcileError::InvalidOptions(
                "time_budget must be positive".into(),
            ));
        }
        if let Backoff::Exponential { max_interval } = self.backoff
            && max_interval < self.interval
        {
            return Err(ReconcileError::InvalidOptions(
                "max_interval must not be shorter than interval".into(),
            ));
        }
        Ok(())
    }

    /// Delay before the given tick (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential { max_interval } => 2u32
                .checked_pow(attempt.saturating_sub(1))
                .and_then(|factor| self.interval.checked_mul(factor))
                .map_or(max_interval, |delay| delay.min(max_interval)),
        }
    }
}

/// One in-flight reconciliation. Mutated only by its own tick loop.
#[derive(Debug, Clone)]
pub struct PollSession {
    pub id: Uuid,
    pub job_id: String,
    pub attempts_made: u32,
    pub started_at: Instant,
    pub options: PollOptions,
    pub state: SessionState,
}

impl PollSession {
    pub fn new(job_id: String, options: PollOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            attempts_made: 0,
            started_at: Instant::now(),
            options,
            state: SessionState::Running,
        }
    }

    /// Restart the time budget. Called when the tick loop begins, so time
    /// spent between construction and `run` is not charged to the session.
    pub fn restart_clock(&mut self) {
        self.started_at = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn next_delay(&self) -> Duration {
        self.options.delay_for_attempt(self.attempts_made + 1)
    }

    /// Count one non-terminal observation and return the new total.
    pub fn record_attempt(&mut self) -> u32 {
        self.attempts_made += 1;
        self.attempts_made
    }

    /// True once either budget has been reached. Checked only at tick boundaries.
    pub fn budget_exhausted(&self) -> bool {
        let by_count = self
            .options
            .attempt_budget
            .is_some_and(|budget| self.attempts_made >= budget);
        let by_time = self
            .options
            .time_budget
            .is_some_and(|budget| self.elapsed() >= budget);
        by_count || by_time
    }

    /// Move into a final state. Final states are never left.
    pub fn settle(&mut self, state: SessionState) {
        if self.state.is_final() {
            return;
        }
        self.state = state;
        debug!(
            session = %self.id,
            job_id = %self.job_id,
            state = %self.state,
            attempts = self.attempts_made,
            "poll session settled"
        );
    }
}
