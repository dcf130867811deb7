mod engine;
mod handle;
mod outcome;
mod session;

pub use engine::{JobPoller, PollCallbacks};
pub use handle::PollHandle;
pub use outcome::{Classification, FailureReason, Outcome, PollUpdate};
pub use session::{Backoff, PollOptions, PollSession, SessionState};
