pub mod client;
pub mod error;
pub mod types;

use std::future::Future;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{
    AnalysisRecord, AnalysisStatus, CheckoutStatus, PaymentState, PaymentStatus, StartedAnalysis,
    UserSnapshot,
};

/// The status-query surface the reconciliation policies depend on.
///
/// Implemented by [`ApiClient`]; tests plug in scripted fakes.
pub trait ReportsApi: Send + Sync {
    fn start_analysis_job(
        &self,
        property_id: &str,
    ) -> impl Future<Output = Result<StartedAnalysis, ApiError>> + Send;

    fn get_analysis_status(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<AnalysisRecord, ApiError>> + Send;

    fn get_payment_status(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<PaymentStatus, ApiError>> + Send;

    /// Reads the authoritative user snapshot. Has no side effects.
    fn get_current_user_snapshot(
        &self,
    ) -> impl Future<Output = Result<UserSnapshot, ApiError>> + Send;
}
