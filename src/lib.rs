//! Client-side reconciliation of asynchronous report jobs and payments.
//!
//! [`poller::JobPoller`] is the generic bounded polling loop. The policies in
//! [`reconcile`] configure it for report generation and payment confirmation.

pub mod api;
pub mod config;
pub mod error;
pub mod poller;
pub mod reconcile;
pub mod store;

pub use error::{ReconcileError, Result};
