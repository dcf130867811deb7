use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::ReconciliationPolicy;
use crate::api::{AnalysisRecord, AnalysisStatus, ReportsApi, StartedAnalysis};
use crate::error::{ReconcileError, Result};
use crate::poller::{Classification, JobPoller, PollCallbacks, PollHandle, PollOptions};

pub const ANALYSIS_INTERVAL: Duration = Duration::from_millis(3_000);
pub const ANALYSIS_TIME_BUDGET: Duration = Duration::from_millis(120_000);

/// Tracks a report-generation job until `completed` or `failed`.
///
/// Bounded by wall clock only. A timeout does not mean the job failed; the
/// caller offers [`AnalysisReconciliation::refresh`] for a later manual check.
#[derive(Debug, Clone)]
pub struct AnalysisReconciliation {
    options: PollOptions,
}

impl Default for AnalysisReconciliation {
    fn default() -> Self {
        Self {
            options: PollOptions::every(ANALYSIS_INTERVAL).with_time_budget(ANALYSIS_TIME_BUDGET),
        }
    }
}

impl ReconciliationPolicy for AnalysisReconciliation {
    type Status = AnalysisRecord;
    type Payload = AnalysisRecord;

    fn name(&self) -> &'static str {
        "analysis"
    }

    fn options(&self) -> &PollOptions {
        &self.options
    }

    fn classify(&self, record: &AnalysisRecord) -> Classification<AnalysisRecord> {
        match record.status {
            AnalysisStatus::Completed => Classification::Succeeded(record.clone()),
            AnalysisStatus::Failed => {
                Classification::Failed("analysis generation failed".to_string())
            }
            AnalysisStatus::Queued | AnalysisStatus::Generating | AnalysisStatus::Unknown => {
                Classification::Pending
            }
        }
    }
}

impl AnalysisReconciliation {
    pub fn with_options(options: PollOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Start polling an existing analysis job.
    pub fn track<A>(
        &self,
        api: Arc<A>,
        job_id: &str,
        callbacks: PollCallbacks<AnalysisRecord, AnalysisRecord>,
    ) -> Result<PollHandle>
    where
        A: ReportsApi + 'static,
    {
        let id = job_id.to_string();
        let fetch = move || {
            let api = api.clone();
            let id = id.clone();
            async move { api.get_analysis_status(&id).await }
        };
        let policy = self.clone();
        let poller = JobPoller::new(job_id, self.options.clone(), fetch, move |r: &AnalysisRecord| {
            policy.classify(r)
        })?;
        debug!(
            policy = self.name(),
            job_id,
            session = %poller.session().id,
            "tracking job"
        );
        Ok(poller.start(callbacks))
    }

    /// Ask the backend to generate a report, then track the returned job.
    ///
    /// The backend refuses when the user has no report credits; that
    /// surfaces here as an API error and nothing is scheduled.
    pub async fn submit<A>(
        &self,
        api: Arc<A>,
        property_id: &str,
        callbacks: PollCallbacks<AnalysisRecord, AnalysisRecord>,
    ) -> Result<(StartedAnalysis, PollHandle)>
    where
        A: ReportsApi + 'static,
    {
        if property_id.trim().is_empty() {
            return Err(ReconcileError::MissingPropertyId);
        }
        let started = api.start_analysis_job(property_id).await?;
        info!(
            property_id,
            analysis_id = %started.analysis_id,
            status = %started.status,
            "analysis submitted"
        );
        let handle = self.track(api, &started.analysis_id, callbacks)?;
        Ok((started, handle))
    }

    /// Read the job status once, outside any poll session.
    pub async fn refresh<A: ReportsApi>(api: &A, job_id: &str) -> Result<AnalysisRecord> {
        if job_id.trim().is_empty() {
            return Err(ReconcileError::MissingJobId);
        }
        Ok(api.get_analysis_status(job_id).await?)
    }
}
