use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ReconciliationPolicy;
use crate::api::{CheckoutStatus, PaymentState, PaymentStatus, ReportsApi, UserSnapshot};
use crate::error::Result;
use crate::poller::{
    Classification, JobPoller, Outcome, PollCallbacks, PollHandle, PollOptions, PollUpdate,
};
use crate::store::SessionStore;

pub const PAYMENT_INTERVAL: Duration = Duration::from_millis(2_000);
pub const PAYMENT_ATTEMPT_BUDGET: u32 = 5;

/// Settled payload of a confirmed payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentReceipt {
    /// Reports the backend says it credited for this checkout.
    pub credited_reports: u32,
    /// Fresh user snapshot fetched after confirmation. `None` if that read failed.
    pub snapshot: Option<UserSnapshot>,
}

/// Confirms an out-of-band checkout and reconciles the credit balance.
///
/// Bounded by attempt count only. On `paid` the user snapshot is re-read
/// once and replaces the cached one; the credited count is never added
/// to the cached balance locally.
#[derive(Debug, Clone)]
pub struct PaymentReconciliation {
    options: PollOptions,
}

impl Default for PaymentReconciliation {
    fn default() -> Self {
        Self {
            options: PollOptions::every(PAYMENT_INTERVAL).with_attempt_budget(PAYMENT_ATTEMPT_BUDGET),
        }
    }
}

impl ReconciliationPolicy for PaymentReconciliation {
    type Status = PaymentStatus;
    type Payload = u32;

    fn name(&self) -> &'static str {
        "payment"
    }

    fn options(&self) -> &PollOptions {
        &self.options
    }

    fn classify(&self, status: &PaymentStatus) -> Classification<u32> {
        if status.payment_status == PaymentState::Paid {
            return Classification::Succeeded(status.reports_credited.unwrap_or(0));
        }
        if status.status == Some(CheckoutStatus::Expired) {
            return Classification::Failed("checkout session expired".to_string());
        }
        Classification::Pending
    }
}

impl PaymentReconciliation {
    pub fn with_options(options: PollOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Start polling a checkout session.
    ///
    /// `on_settled` receives the receipt only after the snapshot refresh
    /// has been attempted and, on success, written to `store`.
    pub fn track<A>(
        &self,
        api: Arc<A>,
        store: SessionStore,
        session_id: &str,
        callbacks: PollCallbacks<PaymentStatus, PaymentReceipt>,
    ) -> Result<PollHandle>
    where
        A: ReportsApi + 'static,
    {
        let id = session_id.to_string();
        let fetch_api = api.clone();
        let fetch = move || {
            let api = fetch_api.clone();
            let id = id.clone();
            async move { api.get_payment_status(&id).await }
        };
        let policy = self.clone();
        let poller = JobPoller::new(session_id, self.options.clone(), fetch, move |s: &PaymentStatus| {
            policy.classify(s)
        })?;

        let poll_session = poller.session().id;
        debug!(
            policy = self.name(),
            job_id = session_id,
            session = %poll_session,
            "tracking job"
        );
        let (mut on_update, on_settled) = callbacks.into_parts();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let outcome = poller
                .run(&token, |update: &PollUpdate<PaymentStatus>| {
                    if let Some(cb) = on_update.as_mut() {
                        cb(update);
                    }
                })
                .await;
            let Some(outcome) = outcome else { return };

            let outcome = match outcome {
                Outcome::Succeeded { payload: credited } => {
                    let snapshot = match api.get_current_user_snapshot().await {
                        Ok(snapshot) => Some(snapshot),
                        Err(err) => {
                            warn!(
                                session = %poll_session,
                                error = %err,
                                "payment confirmed but user snapshot refresh failed"
                            );
                            None
                        }
                    };
                    if token.is_cancelled() {
                        return;
                    }
                    if let Some(snapshot) = &snapshot {
                        store.replace(snapshot.clone());
                        info!(
                            session = %poll_session,
                            credited_reports = credited,
                            available_reports = snapshot.available_reports,
                            "credit balance reconciled"
                        );
                    }
                    Outcome::Succeeded {
                        payload: PaymentReceipt {
                            credited_reports: credited,
                            snapshot,
                        },
                    }
                }
                other => other.map(|credited| PaymentReceipt {
                    credited_reports: credited,
                    snapshot: None,
                }),
            };

            if token.is_cancelled() {
                return;
            }
            if let Some(cb) = on_settled {
                cb(outcome);
            }
        });

        Ok(PollHandle::new(poll_session, cancel, task))
    }
}
