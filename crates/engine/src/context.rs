//! Per-run execution context.
//!
//! The context accumulates parsed response bodies keyed by the synthetic
//! `step_<order>` convention so later steps can extract fields from them. One
//! context belongs to exactly one run and is discarded when the run ends; the
//! orchestrator serializes the derived step results instead of the context.

use std::collections::HashMap;

use serde_json::Value;

/// Write-once-per-step store of recorded responses.
///
/// Single-threaded by ownership: only the orchestrator driving the run holds
/// a mutable reference, so no locking is involved.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    responses: HashMap<String, Value>,
}

impl ExecutionContext {
    /// Creates an empty context for a new run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a step's parsed response body.
    ///
    /// Callers use one key per step; an entry is never overwritten once its
    /// step has executed.
    pub fn record_response(&mut self, step_order: u32, body: Value) {
        self.responses.insert(step_key(step_order), body);
    }

    /// Returns the recorded response for a step, if it produced one.
    pub fn response_for(&self, step_order: u32) -> Option<&Value> {
        self.responses.get(&step_key(step_order))
    }
}

fn step_key(step_order: u32) -> String {
    format!("step_{step_order}")
}
