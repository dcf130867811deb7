use std::fmt;
use std::future::Future;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::handle::PollHandle;
use super::outcome::{Classification, FailureReason, Outcome, PollUpdate};
use super::session::{PollOptions, PollSession, SessionState};
use crate::error::{ReconcileError, Result};

type UpdateFn<S> = Box<dyn FnMut(&PollUpdate<S>) + Send>;
type SettledFn<P> = Box<dyn FnOnce(Outcome<P>) + Send>;

/// Caller-supplied notifications for a spawned session.
///
/// `on_update` fires once per non-terminal tick, in tick order.
/// `on_settled` fires at most once, never after cancellation.
pub struct PollCallbacks<S, P> {
    on_update: Option<UpdateFn<S>>,
    on_settled: Option<SettledFn<P>>,
}

impl<S, P> Default for PollCallbacks<S, P> {
    fn default() -> Self {
        Self {
            on_update: None,
            on_settled: None,
        }
    }
}

impl<S, P> PollCallbacks<S, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_update(mut self, f: impl FnMut(&PollUpdate<S>) + Send + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_settled(mut self, f: impl FnOnce(Outcome<P>) + Send + 'static) -> Self {
        self.on_settled = Some(Box::new(f));
        self
    }

    pub(crate) fn into_parts(self) -> (Option<UpdateFn<S>>, Option<SettledFn<P>>) {
        (self.on_update, self.on_settled)
    }
}

/// Bounded status-polling loop over an injected fetch and classifier.
///
/// The first status query happens one interval after start, never
/// synchronously. Ticks are strictly serialized: the next delay starts only
/// after the previous query resolved. Each call to [`JobPoller::new`] yields
/// an independent session; there is no deduplication by job id.
pub struct JobPoller<F, C> {
    session: PollSession,
    fetch: F,
    classify: C,
}

impl<F, C> JobPoller<F, C> {
    /// Validate inputs and create the session. Fails before anything is scheduled.
    pub fn new(job_id: impl Into<String>, options: PollOptions, fetch: F, classify: C) -> Result<Self> {
        let job_id = job_id.into();
        if job_id.trim().is_empty() {
            return Err(ReconcileError::MissingJobId);
        }
        options.validate()?;
        Ok(Self {
            session: PollSession::new(job_id, options),
            fetch,
            classify,
        })
    }

    pub fn session(&self) -> &PollSession {
        &self.session
    }

    /// Drive the tick loop on the current task.
    ///
    /// Returns `None` if `cancel` fired before an outcome was reached.
    pub async fn run<S, P, E, Fut, U>(
        self,
        cancel: &CancellationToken,
        mut on_update: U,
    ) -> Option<Outcome<P>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<S, E>>,
        E: fmt::Display,
        C: Fn(&S) -> Classification<P>,
        U: FnMut(&PollUpdate<S>),
    {
        let Self {
            mut session,
            mut fetch,
            classify,
        } = self;
        session.restart_clock();

        debug!(
            session = %session.id,
            job_id = %session.job_id,
            interval_ms = session.options.interval.as_millis() as u64,
            "poll session started"
        );

        loop {
            let delay = session.next_delay();
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    session.settle(SessionState::Cancelled);
                    debug!(session = %session.id, "poll session cancelled");
                    return None;
                }
                () = sleep(delay) => {}
            }

            let fetched = fetch().await;
            if cancel.is_cancelled() {
                session.settle(SessionState::Cancelled);
                debug!(session = %session.id, "status discarded after cancellation");
                return None;
            }

            let status = match fetched {
                Ok(status) => status,
                Err(err) => {
                    session.settle(SessionState::Failed);
                    warn!(
                        session = %session.id,
                        job_id = %session.job_id,
                        error = %err,
                        "status fetch failed"
                    );
                    return Some(Outcome::Failed {
                        reason: FailureReason::FetchError(err.to_string()),
                    });
                }
            };

            match classify(&status) {
                Classification::Succeeded(payload) => {
                    session.settle(SessionState::Succeeded);
                    info!(session = %session.id, job_id = %session.job_id, "job succeeded");
                    return Some(Outcome::Succeeded { payload });
                }
                Classification::Failed(reason) => {
                    session.settle(SessionState::Failed);
                    info!(
                        session = %session.id,
                        job_id = %session.job_id,
                        reason = %reason,
                        "job failed remotely"
                    );
                    return Some(Outcome::Failed {
                        reason: FailureReason::Remote(reason),
                    });
                }
                Classification::Pending => {}
            }

            let attempts_made = session.record_attempt();
            if session.budget_exhausted() {
                session.settle(SessionState::TimedOut);
                let elapsed_ms = u64::try_from(session.elapsed().as_millis()).unwrap_or(u64::MAX);
                info!(
                    session = %session.id,
                    job_id = %session.job_id,
                    attempts_made,
                    elapsed_ms,
                    "poll budget exhausted"
                );
                return Some(Outcome::TimedOut {
                    attempts_made,
                    elapsed_ms,
                });
            }

            debug!(session = %session.id, attempt = attempts_made, "status still pending");
            on_update(&PollUpdate {
                status,
                attempts_made,
            });
        }
    }

    /// Spawn the tick loop onto the tokio runtime and report through callbacks.
    pub fn start<S, P, E, Fut>(self, callbacks: PollCallbacks<S, P>) -> PollHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<S, E>> + Send + 'static,
        S: Send + 'static,
        P: Send + 'static,
        E: fmt::Display + Send + 'static,
        C: Fn(&S) -> Classification<P> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let session_id = self.session.id;
        let (mut on_update, on_settled) = callbacks.into_parts();

        let task = tokio::spawn(async move {
            let outcome = self
                .run(&token, |update: &PollUpdate<S>| {
                    if let Some(cb) = on_update.as_mut() {
                        cb(update);
                    }
                })
                .await;

            let Some(outcome) = outcome else { return };
            if token.is_cancelled() {
                return;
            }
            if let Some(cb) = on_settled {
                cb(outcome);
            }
        });

        PollHandle::new(session_id, cancel, task)
    }
}
