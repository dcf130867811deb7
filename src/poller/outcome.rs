use std::fmt;

use serde::{Deserialize, Serialize};

use super::session::SessionState;

/// What a policy makes of one observed status.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification<P> {
    /// Not terminal; keep polling.
    Pending,
    /// Terminal success carrying the policy's payload.
    Succeeded(P),
    /// Terminal failure reported by the remote side.
    Failed(String),
}

/// Why a session settled as failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "kebab-case")]
pub enum FailureReason {
    /// The status query itself failed (transport or lookup error). Not retried.
    FetchError(String),
    /// The remote job reported a terminal failure.
    Remote(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::FetchError(msg) => write!(f, "status check failed: {msg}"),
            FailureReason::Remote(msg) => write!(f, "{msg}"),
        }
    }
}

/// The single final report of a poll session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Outcome<P> {
    Succeeded { payload: P },
    Failed { reason: FailureReason },
    /// Budget exhausted. The job may still be progressing remotely.
    TimedOut { attempts_made: u32, elapsed_ms: u64 },
}

impl<P> Outcome<P> {
    pub fn state(&self) -> SessionState {
        match self {
            Outcome::Succeeded { .. } => SessionState::Succeeded,
            Outcome::Failed { .. } => SessionState::Failed,
            Outcome::TimedOut { .. } => SessionState::TimedOut,
        }
    }

    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> Outcome<Q> {
        match self {
            Outcome::Succeeded { payload } => Outcome::Succeeded {
                payload: f(payload),
            },
            Outcome::Failed { reason } => Outcome::Failed { reason },
            Outcome::TimedOut {
                attempts_made,
                elapsed_ms,
            } => Outcome::TimedOut {
                attempts_made,
                elapsed_ms,
            },
        }
    }
}

/// Progress notification for one non-terminal tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PollUpdate<S> {
    pub status: S,
    pub attempts_made: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_state_tag() {
        let ok: Outcome<u32> = Outcome::Succeeded { payload: 3 };
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["state"], "succeeded");
        assert_eq!(json["payload"], 3);

        let timed_out: Outcome<u32> = Outcome::TimedOut {
            attempts_made: 5,
            elapsed_ms: 10_000,
        };
        let json = serde_json::to_value(&timed_out).unwrap();
        assert_eq!(json["state"], "timedOut");
        assert_eq!(json["attempts_made"], 5);
    }

    #[test]
    fn fetch_error_serializes_kebab_case() {
        let failed: Outcome<()> = Outcome::Failed {
            reason: FailureReason::FetchError("connection refused".into()),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"]["kind"], "fetch-error");
        assert_eq!(json["reason"]["message"], "connection refused");
    }

    #[test]
    fn map_only_touches_payload() {
        let ok: Outcome<u32> = Outcome::Succeeded { payload: 2 };
        assert_eq!(ok.map(|n| n * 10), Outcome::Succeeded { payload: 20 });

        let failed: Outcome<u32> = Outcome::Failed {
            reason: FailureReason::Remote("expired".into()),
        };
        let mapped = failed.map(|n| n.to_string());
        assert_eq!(mapped.state(), SessionState::Failed);
    }

    #[test]
    fn failure_reason_display() {
        assert_eq!(
            FailureReason::FetchError("timeout".into()).to_string(),
            "status check failed: timeout"
        );
        assert_eq!(
            FailureReason::Remote("analysis generation failed".into()).to_string(),
            "analysis generation failed"
        );
    }
}
