//! Asynchronous case runner that streams lifecycle events and responds to a
//! cancel control.
//!
//! This module wraps the orchestrator primitives in a cooperative task that
//! emits [`CaseRunEvent`]s over a Tokio channel. The caller owns the event
//! receiver and may issue [`CaseRunControl`] commands through the paired
//! control channel; cancellation takes effect between steps.

use std::{sync::Arc, time::Instant};

use anyhow::{Result, anyhow};
use chrono::Utc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tracing::info;

use casewire_types::{CaseRunControl, CaseRunEvent, CaseRunRequest, CaseRunStatus, RunReport, RunSummary};

use crate::{
    context::ExecutionContext,
    dispatch::StepDispatcher,
    executor::execute_step,
};

/// Drives one case run to completion while emitting lifecycle events.
pub async fn drive_case_run(
    request: CaseRunRequest,
    dispatcher: Arc<dyn StepDispatcher>,
    mut control_rx: UnboundedReceiver<CaseRunControl>,
    event_tx: UnboundedSender<CaseRunEvent>,
) -> Result<()> {
    info!(run_id = %request.run_id, case = %request.case.name, "case run starting");
    if event_tx.send(CaseRunEvent::RunStarted { at: Utc::now() }).is_err() {
        return Ok(());
    }

    let mut control_state = ControlState::new();
    control_state.emit_status(&event_tx, CaseRunStatus::Running, None)?;

    let started = Instant::now();
    let mut context = ExecutionContext::new();
    let mut results = Vec::with_capacity(request.case.steps.len());
    let mut run_error = None;
    let mut any_failed = false;

    for (index, step) in request.case.steps.iter().enumerate() {
        drain_pending_commands(&mut control_state, &mut control_rx, &event_tx)?;
        if control_state.cancel_requested {
            break;
        }

        let _ = event_tx.send(CaseRunEvent::StepStarted {
            index,
            step_order: step.step_order,
            step_id: step.id.clone(),
            description: step.description.clone(),
            started_at: Utc::now(),
        });

        let outcome = execute_step(step, &context, dispatcher.as_ref()).await;
        if let Some(body) = outcome.response_body {
            context.record_response(step.step_order, body);
        }

        let stop = outcome.fatal.is_some() || !outcome.result.success;
        if !outcome.result.success {
            any_failed = true;
        }
        if let Some(error) = outcome.fatal {
            run_error = Some(error.to_string());
        }

        let event = CaseRunEvent::StepFinished {
            step_order: step.step_order,
            result: outcome.result.clone(),
        };
        results.push(outcome.result);
        event_tx.send(event).map_err(|err| anyhow!("failed to emit step finished event: {}", err))?;

        if stop {
            break;
        }
    }

    let completed_status = if control_state.cancel_requested {
        CaseRunStatus::Canceled
    } else if any_failed {
        CaseRunStatus::Failed
    } else {
        CaseRunStatus::Succeeded
    };

    let summary = RunSummary::from_step_results(&results);
    let report = RunReport {
        steps: results,
        summary,
        elapsed_ms: started.elapsed().as_millis().try_into().unwrap_or(u64::MAX),
        error: run_error,
    };

    info!(run_id = %request.run_id, status = ?completed_status, "case run finished");
    let _ = event_tx.send(CaseRunEvent::RunCompleted {
        status: completed_status,
        report,
        finished_at: Utc::now(),
    });
    Ok(())
}

fn drain_pending_commands(
    control_state: &mut ControlState,
    control_rx: &mut UnboundedReceiver<CaseRunControl>,
    event_tx: &UnboundedSender<CaseRunEvent>,
) -> Result<()> {
    loop {
        match control_rx.try_recv() {
            Ok(command) => control_state.process_command(command, event_tx)?,
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => break,
        }
    }
    Ok(())
}

struct ControlState {
    cancel_requested: bool,
}

impl ControlState {
    fn new() -> Self {
        Self { cancel_requested: false }
    }

    fn process_command(&mut self, command: CaseRunControl, event_tx: &UnboundedSender<CaseRunEvent>) -> Result<()> {
        match command {
            CaseRunControl::Cancel => {
                if !self.cancel_requested {
                    self.cancel_requested = true;
                    self.emit_status(event_tx, CaseRunStatus::CancelRequested, Some("stopping before the next step".to_string()))?;
                }
            }
        }
        Ok(())
    }

    fn emit_status(&mut self, event_tx: &UnboundedSender<CaseRunEvent>, status: CaseRunStatus, message: Option<String>) -> Result<()> {
        event_tx
            .send(CaseRunEvent::RunStatusChanged { status, message })
            .map_err(|err| anyhow!("failed to emit run status change: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ScriptedDispatcher;
    use casewire_types::{TestCase, TestStep};
    use serde_json::{Map as JsonMap, json};
    use tokio::sync::mpsc::unbounded_channel;

    fn step(order: u32) -> TestStep {
        TestStep {
            id: format!("step-{order}"),
            step_order: order,
            api_id: None,
            api_name: None,
            api_path: format!("/steps/{order}"),
            api_method: "GET".into(),
            description: None,
            params: JsonMap::new(),
            headers: Default::default(),
            param_mappings: Vec::new(),
            assertions: Vec::new(),
            expected_status: 200,
            timeout_ms: None,
        }
    }

    fn request(steps: Vec<TestStep>) -> CaseRunRequest {
        CaseRunRequest {
            run_id: "run-1".into(),
            case: TestCase {
                id: "case-1".into(),
                name: "smoke".into(),
                description: None,
                steps,
                tags: Vec::new(),
                enabled: true,
            },
        }
    }

    #[tokio::test]
    async fn streams_step_events_and_completes_with_a_report() {
        let (control_tx, control_rx) = unbounded_channel();
        drop(control_tx);
        let (event_tx, mut event_rx) = unbounded_channel();

        let dispatcher: Arc<dyn StepDispatcher> =
            Arc::new(ScriptedDispatcher::new().respond(200, json!({})).respond(200, json!({})));

        drive_case_run(request(vec![step(1), step(2)]), dispatcher, control_rx, event_tx)
            .await
            .expect("drive case run");

        let mut finished_orders = Vec::new();
        let mut completed = None;
        while let Ok(event) = event_rx.try_recv() {
            match event {
                CaseRunEvent::StepFinished { step_order, .. } => finished_orders.push(step_order),
                CaseRunEvent::RunCompleted { status, report, .. } => completed = Some((status, report)),
                _ => {}
            }
        }

        assert_eq!(finished_orders, vec![1, 2]);
        let (status, report) = completed.expect("run completed event");
        assert_eq!(status, CaseRunStatus::Succeeded);
        assert!(report.is_success());
        assert_eq!(report.summary.total_steps, 2);
    }

    #[tokio::test]
    async fn cancel_before_start_skips_every_step() {
        let (control_tx, control_rx) = unbounded_channel();
        control_tx.send(CaseRunControl::Cancel).expect("queue cancel");
        let (event_tx, mut event_rx) = unbounded_channel();

        let dispatcher: Arc<dyn StepDispatcher> = Arc::new(ScriptedDispatcher::new().respond(200, json!({})));

        drive_case_run(request(vec![step(1)]), dispatcher, control_rx, event_tx)
            .await
            .expect("drive case run");

        let mut saw_step = false;
        let mut completed_status = None;
        while let Ok(event) = event_rx.try_recv() {
            match event {
                CaseRunEvent::StepStarted { .. } => saw_step = true,
                CaseRunEvent::RunCompleted { status, .. } => completed_status = Some(status),
                _ => {}
            }
        }

        assert!(!saw_step, "no step should start after a queued cancel");
        assert_eq!(completed_status, Some(CaseRunStatus::Canceled));
    }

    #[tokio::test]
    async fn failed_step_completes_the_run_as_failed() {
        let (control_tx, control_rx) = unbounded_channel();
        drop(control_tx);
        let (event_tx, mut event_rx) = unbounded_channel();

        let dispatcher: Arc<dyn StepDispatcher> = Arc::new(ScriptedDispatcher::new().respond(500, json!({"error": "boom"})));

        drive_case_run(request(vec![step(1), step(2)]), dispatcher, control_rx, event_tx)
            .await
            .expect("drive case run");

        let mut completed = None;
        while let Ok(event) = event_rx.try_recv() {
            if let CaseRunEvent::RunCompleted { status, report, .. } = event {
                completed = Some((status, report));
            }
        }

        let (status, report) = completed.expect("run completed event");
        assert_eq!(status, CaseRunStatus::Failed);
        assert_eq!(report.steps.len(), 1, "second step never runs");
        assert!(report.error.is_none(), "status mismatch is not run-fatal");
    }
}
