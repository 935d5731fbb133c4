//! Execution domain types
//!
//! An [`Execution`] is the persisted record of one dispatched run. Its
//! [`ExecutionResult`] is folded in place as the backend reports progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::script::ScriptSpec;
use crate::dto::execution::RunParameters;

/// Execution record
///
/// Structure shared between orchestrator (persists), agent (relays) and
/// client tooling (renders).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub name: String,
    pub script_id: String,
    pub namespace: String,
    /// Identifier the executor backend assigned to this run
    pub backend_id: String,
    /// Snapshot of the script definition at dispatch time
    pub spec: ScriptSpec,
    pub parameters: RunParameters,
    pub created_at: DateTime<Utc>,
    pub result: ExecutionResult,
}

impl Execution {
    /// Builds the initial record for a freshly dispatched run
    pub fn new(
        script_id: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
        backend_id: impl Into<String>,
        spec: ScriptSpec,
        parameters: RunParameters,
        result: ExecutionResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            script_id: script_id.into(),
            namespace: namespace.into(),
            backend_id: backend_id.into(),
            spec,
            parameters,
            created_at: Utc::now(),
            result,
        }
    }
}

/// Execution status
///
/// `Queued` and `Running` are non-terminal, `Success` and `Failed` are
/// terminal. Anything the backend reports that we do not recognise decodes to
/// `Unknown`, which is never terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Queued,
    #[serde(alias = "pending")]
    Running,
    #[serde(alias = "passed")]
    Success,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Success | ExecutionStatus::Failed)
    }

    /// Position in the lifecycle; `None` for statuses we cannot place
    pub fn rank(self) -> Option<u8> {
        match self {
            ExecutionStatus::Queued => Some(0),
            ExecutionStatus::Running => Some(1),
            ExecutionStatus::Success | ExecutionStatus::Failed => Some(2),
            ExecutionStatus::Unknown => None,
        }
    }

    /// The further along of `self` and `reached`
    ///
    /// `Unknown` never displaces a placed status.
    pub fn furthest(self, reached: Option<ExecutionStatus>) -> Option<ExecutionStatus> {
        match reached {
            Some(reached) if reached.rank() >= self.rank() => Some(reached),
            _ if self.rank().is_some() => Some(self),
            _ => reached,
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Queued => write!(f, "queued"),
            ExecutionStatus::Running => write!(f, "running"),
            ExecutionStatus::Success => write!(f, "success"),
            ExecutionStatus::Failed => write!(f, "failed"),
            ExecutionStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Observed outcome of a run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub status: ExecutionStatus,
    #[serde(default)]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl ExecutionResult {
    /// A result in the queued state, stamped with the current time
    pub fn queued() -> Self {
        Self {
            status: ExecutionStatus::Queued,
            start_time: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn is_queued(&self) -> bool {
        self.status == ExecutionStatus::Queued
    }

    pub fn is_running(&self) -> bool {
        self.status == ExecutionStatus::Running
    }

    /// Alias of [`ExecutionResult::is_running`]
    pub fn is_pending(&self) -> bool {
        self.is_running()
    }

    pub fn is_successful(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Alias of [`ExecutionResult::is_successful`]
    pub fn is_passed(&self) -> bool {
        self.is_successful()
    }

    pub fn is_failed(&self) -> bool {
        self.status == ExecutionStatus::Failed
    }

    /// True once the run reached a terminal state
    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Wall time of the run
    ///
    /// Only defined for terminal results with both timestamps set.
    pub fn duration(&self) -> Option<chrono::Duration> {
        if !self.is_completed() {
            return None;
        }
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end.signed_duration_since(start)),
            _ => None,
        }
    }

    /// Whether this snapshot may replace `previous` in the record
    ///
    /// Nothing replaces a terminal result, and a known status never moves
    /// backwards in the lifecycle. Unknown statuses are recorded as long as the
    /// previous snapshot was not terminal.
    pub fn supersedes(&self, previous: &ExecutionResult) -> bool {
        self.advances(previous, None)
    }

    /// Like [`ExecutionResult::supersedes`], also refusing to fall behind
    /// `reached`, the furthest status observed so far
    ///
    /// Keeps an `Unknown` snapshot from opening the way back to an earlier
    /// status.
    pub fn advances(&self, previous: &ExecutionResult, reached: Option<ExecutionStatus>) -> bool {
        if previous.is_completed() {
            return false;
        }
        let floor = previous.status.furthest(reached).and_then(ExecutionStatus::rank);
        match (self.status.rank(), floor) {
            (Some(next), Some(floor)) => next >= floor,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn result(status: ExecutionStatus) -> ExecutionResult {
        ExecutionResult {
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_predicates_are_mutually_exclusive() {
        let statuses = [
            ExecutionStatus::Queued,
            ExecutionStatus::Running,
            ExecutionStatus::Success,
            ExecutionStatus::Failed,
        ];

        for status in statuses {
            let r = result(status);
            let hits = [r.is_queued(), r.is_running(), r.is_successful(), r.is_failed()]
                .iter()
                .filter(|hit| **hit)
                .count();
            assert_eq!(hits, 1, "{status} should match exactly one predicate");
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!result(ExecutionStatus::Queued).is_completed());
        assert!(!result(ExecutionStatus::Running).is_completed());
        assert!(result(ExecutionStatus::Success).is_completed());
        assert!(result(ExecutionStatus::Failed).is_completed());
        assert!(!result(ExecutionStatus::Unknown).is_completed());
    }

    #[test]
    fn test_unrecognized_status_decodes_as_unknown() {
        let r: ExecutionResult = serde_json::from_str(r#"{"status":"exploded"}"#).unwrap();
        assert_eq!(r.status, ExecutionStatus::Unknown);
        assert!(!r.is_completed());

        let r: ExecutionResult = serde_json::from_str(r#"{"output":"x"}"#).unwrap();
        assert_eq!(r.status, ExecutionStatus::Unknown);
    }

    #[test]
    fn test_status_aliases() {
        let r: ExecutionResult = serde_json::from_str(r#"{"status":"pending"}"#).unwrap();
        assert!(r.is_pending());
        let r: ExecutionResult = serde_json::from_str(r#"{"status":"passed"}"#).unwrap();
        assert!(r.is_passed());
    }

    #[test]
    fn test_duration_only_when_terminal() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 42).unwrap();

        let mut r = ExecutionResult {
            status: ExecutionStatus::Running,
            start_time: Some(start),
            end_time: Some(end),
            ..Default::default()
        };
        assert_eq!(r.duration(), None);

        r.status = ExecutionStatus::Success;
        assert_eq!(r.duration(), Some(chrono::Duration::seconds(42)));
    }

    #[test]
    fn test_supersedes_never_moves_backwards() {
        let queued = result(ExecutionStatus::Queued);
        let running = result(ExecutionStatus::Running);
        let success = result(ExecutionStatus::Success);
        let unknown = result(ExecutionStatus::Unknown);

        assert!(running.supersedes(&queued));
        assert!(running.supersedes(&running));
        assert!(!queued.supersedes(&running));
        assert!(success.supersedes(&running));
        assert!(!running.supersedes(&success));
        assert!(!success.supersedes(&success));
        assert!(unknown.supersedes(&running));
        assert!(!unknown.supersedes(&success));
    }

    #[test]
    fn test_unknown_does_not_reopen_earlier_statuses() {
        let queued = result(ExecutionStatus::Queued);
        let running = result(ExecutionStatus::Running);
        let unknown = result(ExecutionStatus::Unknown);
        let reached = ExecutionStatus::Running.furthest(Some(ExecutionStatus::Queued));
        assert_eq!(reached, Some(ExecutionStatus::Running));

        assert!(unknown.advances(&running, reached));
        let reached = ExecutionStatus::Unknown.furthest(reached);
        assert_eq!(reached, Some(ExecutionStatus::Running));

        assert!(!queued.advances(&unknown, reached));
        assert!(running.advances(&unknown, reached));
        assert!(queued.advances(&unknown, None));
    }
}
