//! Lifecycle event and control types for the streaming case runner.
//!
//! The runner emits [`CaseRunEvent`]s over a Tokio channel while a run is in
//! flight; the owning service holds the receiver and may issue
//! [`CaseRunControl`] commands through the paired control channel. Cancellation
//! takes effect between steps; an in-flight HTTP call is never interrupted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RunReport, StepResult, TestCase};

/// Everything the runner needs to drive one case to completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseRunRequest {
    /// Identifier assigned by the caller; echoed in persistence and logs.
    pub run_id: String,
    /// The case to execute.
    pub case: TestCase,
}

/// Terminal and in-flight states of one run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseRunStatus {
    /// Steps are executing.
    Running,
    /// Cancellation was requested; the current step will finish first.
    CancelRequested,
    /// Every step ran and succeeded.
    Succeeded,
    /// A step failed or a fatal error aborted the run.
    Failed,
    /// The run stopped early at the caller's request.
    Canceled,
}

/// Commands the owning service can issue while a run is in flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseRunControl {
    /// Stop the run before the next step starts.
    Cancel,
}

/// Lifecycle notifications streamed while a case executes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CaseRunEvent {
    /// The run has begun; no step has started yet.
    RunStarted {
        /// Wall-clock start time.
        at: DateTime<Utc>,
    },
    /// A step is about to dispatch.
    StepStarted {
        /// Zero-based position in the step list.
        index: usize,
        /// The step's declared order.
        step_order: u32,
        /// The step's identifier.
        step_id: String,
        /// Authoring-side description, when present.
        description: Option<String>,
        /// Wall-clock start time of the step.
        started_at: DateTime<Utc>,
    },
    /// A step finished (successfully or not).
    StepFinished {
        /// The step's declared order.
        step_order: u32,
        /// The full per-step record.
        result: StepResult,
    },
    /// The run's coarse status changed.
    RunStatusChanged {
        /// New status.
        status: CaseRunStatus,
        /// Optional operator-facing note.
        message: Option<String>,
    },
    /// The run reached a terminal state.
    RunCompleted {
        /// Terminal status.
        status: CaseRunStatus,
        /// Full report over the steps that executed.
        report: RunReport,
        /// Wall-clock completion time.
        finished_at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_their_variant_on_the_wire() {
        let event = CaseRunEvent::RunStatusChanged {
            status: CaseRunStatus::Running,
            message: None,
        };
        let value = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(value["event"], "run_status_changed");
        assert_eq!(value["status"], "running");
    }
}
