//! Scripted in-memory backend for policy tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::api::{
    AnalysisRecord, AnalysisStatus, ApiError, CheckoutStatus, PaymentState, PaymentStatus,
    ReportsApi, StartedAnalysis, UserSnapshot,
};

/// One scripted response. `Err` becomes an HTTP 500 from the fake.
#[derive(Debug, Clone)]
pub enum Step<T> {
    Ok(T),
    Err(String),
}

/// Replays its steps in order, repeating the last one forever.
#[derive(Debug)]
struct Script<T> {
    steps: Vec<Step<T>>,
    next: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new(steps: Vec<Step<T>>) -> Self {
        Self {
            steps,
            next: AtomicUsize::new(0),
        }
    }

    fn take(&self) -> Result<T, ApiError> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .get(n.min(self.steps.len().saturating_sub(1)))
            .cloned()
            .unwrap_or(Step::Err("no scripted response".into()));
        match step {
            Step::Ok(value) => Ok(value),
            Step::Err(message) => Err(ApiError::ApiError {
                status: 500,
                message,
            }),
        }
    }
}

#[derive(Debug)]
pub struct FakeApi {
    started: Step<String>,
    analysis: Script<AnalysisRecord>,
    payment: Script<PaymentStatus>,
    user: Script<UserSnapshot>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            started: Step::Ok("analysis-1".into()),
            analysis: Script::new(vec![]),
            payment: Script::new(vec![]),
            user: Script::new(vec![Step::Ok(user(0))]),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_started(mut self, step: Step<String>) -> Self {
        self.started = step;
        self
    }

    pub fn with_analysis(mut self, statuses: &[AnalysisStatus]) -> Self {
        let steps = statuses.iter().map(|s| Step::Ok(record(*s))).collect();
        self.analysis = Script::new(steps);
        self
    }

    pub fn with_payment_steps(mut self, steps: Vec<Step<PaymentStatus>>) -> Self {
        self.payment = Script::new(steps);
        self
    }

    pub fn with_payments(self, statuses: &[PaymentStatus]) -> Self {
        let steps = statuses.iter().cloned().map(Step::Ok).collect();
        self.with_payment_steps(steps)
    }

    pub fn with_user(mut self, snapshot: UserSnapshot) -> Self {
        self.user = Script::new(vec![Step::Ok(snapshot)]);
        self
    }

    pub fn with_user_steps(mut self, steps: Vec<Step<UserSnapshot>>) -> Self {
        self.user = Script::new(steps);
        self
    }

    /// Names of the backend operations invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ReportsApi for FakeApi {
    async fn start_analysis_job(&self, _property_id: &str) -> Result<StartedAnalysis, ApiError> {
        self.log("start");
        match &self.started {
            Step::Ok(id) => Ok(StartedAnalysis {
                analysis_id: id.clone(),
                status: AnalysisStatus::Generating,
            }),
            Step::Err(message) => Err(ApiError::Forbidden(message.clone())),
        }
    }

    async fn get_analysis_status(&self, _job_id: &str) -> Result<AnalysisRecord, ApiError> {
        self.log("analysis");
        self.analysis.take()
    }

    async fn get_payment_status(&self, _session_id: &str) -> Result<PaymentStatus, ApiError> {
        self.log("payment");
        self.payment.take()
    }

    async fn get_current_user_snapshot(&self) -> Result<UserSnapshot, ApiError> {
        self.log("me");
        self.user.take()
    }
}

pub fn user(available_reports: i64) -> UserSnapshot {
    UserSnapshot {
        id: "user-1".into(),
        email: "investor@example.com".into(),
        name: "Investor".into(),
        available_reports,
        created_at: None,
    }
}

pub fn record(status: AnalysisStatus) -> AnalysisRecord {
    AnalysisRecord {
        id: "analysis-1".into(),
        property_id: "property-1".into(),
        property_name: "12 Harbour St".into(),
        status,
        analysis_data: serde_json::Value::Null,
        pdf_path: None,
        created_at: None,
    }
}

pub fn pending() -> PaymentStatus {
    PaymentStatus {
        status: Some(CheckoutStatus::Open),
        payment_status: PaymentState::Unpaid,
        reports_credited: None,
    }
}

pub fn paid(credited: u32) -> PaymentStatus {
    PaymentStatus {
        status: Some(CheckoutStatus::Complete),
        payment_status: PaymentState::Paid,
        reports_credited: Some(credited),
    }
}

pub fn expired() -> PaymentStatus {
    PaymentStatus {
        status: Some(CheckoutStatus::Expired),
        payment_status: PaymentState::Unpaid,
        reports_credited: None,
    }
}
