//! Step orchestration.
//!
//! Drives a case's steps strictly in order against one [`ExecutionContext`],
//! stopping at the first failed step. Resolution and dispatch failures are
//! fatal and surface as the run-level error; a status mismatch or failed
//! assertion ends the run too, but only marks the step.

use std::time::Instant;

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, info, warn};

use casewire_api::CasewireClient;
use casewire_types::{RunReport, RunSummary, StepResult, TestStep};

use crate::{
    assertions::evaluate_assertions,
    context::ExecutionContext,
    dispatch::{HttpStepDispatcher, StepDispatcher},
    error::ExecutionError,
    resolve::resolve_step_params,
};

/// What a single step execution produced, from the orchestrator's view.
pub(crate) struct StepOutcome {
    /// The per-step record to append to the report.
    pub result: StepResult,
    /// Set when resolution or dispatch failed; ends the run with an error.
    pub fatal: Option<ExecutionError>,
    /// The parsed body to record in the context, when a response arrived.
    pub response_body: Option<JsonValue>,
}

/// Resolves, dispatches, and asserts one step.
pub(crate) async fn execute_step(step: &TestStep, context: &ExecutionContext, dispatcher: &dyn StepDispatcher) -> StepOutcome {
    let mut result = StepResult {
        id: step.id.clone(),
        step_order: step.step_order,
        success: false,
        status_code: 0,
        resolved_params: JsonMap::new(),
        response_body: JsonValue::Null,
        response_headers: Default::default(),
        latency_ms: 0,
        assertions: Vec::new(),
        extractions: Vec::new(),
        error: None,
    };

    let resolved = match resolve_step_params(step, context) {
        Ok(resolved) => resolved,
        Err(failure) => {
            warn!(step_order = step.step_order, error = %failure.error, "parameter resolution failed");
            result.extractions = failure.extractions;
            result.error = Some(failure.error.to_string());
            return StepOutcome {
                result,
                fatal: Some(failure.error),
                response_body: None,
            };
        }
    };
    result.resolved_params = resolved.params.clone();
    result.extractions = resolved.extractions;

    let response = match dispatcher.dispatch(step, &resolved.params).await {
        Ok(response) => response,
        Err(error) => {
            result.error = Some(error.to_string());
            return StepOutcome {
                result,
                fatal: Some(error),
                response_body: None,
            };
        }
    };

    result.status_code = response.status;
    result.response_headers = response.headers;
    result.latency_ms = response.latency_ms;
    result.response_body = response.body.clone();

    result.assertions = evaluate_assertions(response.status, &step.assertions, &response.body);
    let assertions_passed = result.assertions.iter().all(|check| check.passed);
    result.success = response.status == step.expected_status && assertions_passed;

    if !result.success {
        debug!(
            step_order = step.step_order,
            status = response.status,
            expected_status = step.expected_status,
            assertions_passed,
            "step failed its checks"
        );
    }

    StepOutcome {
        result,
        fatal: None,
        response_body: Some(response.body),
    }
}

/// Executes a case's steps in order, stopping at the first failure.
///
/// The returned report covers exactly the steps that started, in position; a
/// fatal resolution/dispatch error sets the report's `error`, while a status
/// mismatch or assertion failure only ends the run.
pub async fn run_case(steps: &[TestStep], dispatcher: &dyn StepDispatcher) -> RunReport {
    let started = Instant::now();
    let mut context = ExecutionContext::new();
    let mut results = Vec::with_capacity(steps.len());
    let mut run_error = None;

    for step in steps {
        let outcome = execute_step(step, &context, dispatcher).await;
        if let Some(body) = outcome.response_body {
            context.record_response(step.step_order, body);
        }

        let stop = outcome.fatal.is_some() || !outcome.result.success;
        results.push(outcome.result);

        if let Some(error) = outcome.fatal {
            run_error = Some(error.to_string());
        }
        if stop {
            break;
        }
    }

    let summary = RunSummary::from_step_results(&results);
    info!(
        total_steps = summary.total_steps,
        succeeded_steps = summary.succeeded_steps,
        failed_steps = summary.failed_steps,
        fatal = run_error.is_some(),
        "case run finished"
    );

    RunReport {
        steps: results,
        summary,
        elapsed_ms: started.elapsed().as_millis().try_into().unwrap_or(u64::MAX),
        error: run_error,
    }
}

/// Convenience entry point: runs the steps over HTTP against `base_url`.
pub async fn run_case_against(base_url: &str, steps: &[TestStep]) -> anyhow::Result<RunReport> {
    let client = CasewireClient::new(base_url)?;
    let dispatcher = HttpStepDispatcher::new(client);
    Ok(run_case(steps, &dispatcher).await)
}
