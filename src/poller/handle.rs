use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

/// Owned handle to a running poll session.
///
/// Cancellation is soft: a sleeping session stops immediately, an in-flight
/// status query runs to completion and its result is discarded. Dropping the
/// handle cancels the session.
#[derive(Debug)]
pub struct PollHandle {
    session_id: Uuid,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub(crate) fn new(session_id: Uuid, cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            session_id,
            cancel,
            task: Some(task),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Idempotent. No outcome is reported after this returns.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Wait until the session task exits, whether settled or cancelled.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take()
            && let Err(err) = task.await
        {
            warn!(session = %self.session_id, error = %err, "poll task ended abnormally");
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
