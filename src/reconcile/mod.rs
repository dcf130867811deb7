//! Resource-specific polling policies built on [`JobPoller`](crate::poller::JobPoller).

mod analysis;
mod payment;

#[cfg(test)]
pub(crate) mod fake;

pub use analysis::{ANALYSIS_INTERVAL, ANALYSIS_TIME_BUDGET, AnalysisReconciliation};
pub use payment::{PAYMENT_ATTEMPT_BUDGET, PAYMENT_INTERVAL, PaymentReceipt, PaymentReconciliation};

use crate::poller::{Classification, PollOptions};

/// Timing plus terminal-state classification for one kind of remote job.
///
/// The status enumeration must split cleanly into pending and terminal
/// states; `classify` returns [`Classification::Pending`] for every
/// non-terminal status, including ones it does not recognise.
pub trait ReconciliationPolicy: Clone + Send + Sync + 'static {
    type Status: Send + 'static;
    type Payload: Send + 'static;

    fn name(&self) -> &'static str;

    fn options(&self) -> &PollOptions;

    fn classify(&self, status: &Self::Status) -> Classification<Self::Payload>;
}
