//! Execution report types: per-step results, the extraction audit trail, and
//! the aggregate run summary returned to the caller alongside the step list.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::{Assertion, ParamMapping};

/// Audit trail entry for one applied [`ParamMapping`].
///
/// One record is produced per mapping, in declaration order, up to and
/// including the first failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionRecord {
    /// `step_order` of the source step.
    pub from_step: u32,
    /// Dotted path read from the source response.
    pub from_field: String,
    /// Dotted path written into the resolved parameters.
    pub to_field: String,
    /// The value moved, present only on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_value: Option<JsonValue>,
    /// Whether the mapping applied cleanly.
    pub success: bool,
    /// Why the mapping failed, when it did.
    #[serde(rename = "error_msg", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionRecord {
    /// A successful record carrying the moved value.
    pub fn succeeded(mapping: &ParamMapping, value: JsonValue) -> Self {
        Self {
            from_step: mapping.from_step,
            from_field: mapping.from_field.clone(),
            to_field: mapping.to_field.clone(),
            extracted_value: Some(value),
            success: true,
            error: None,
        }
    }

    /// A failed record carrying the diagnostic message.
    pub fn failed(mapping: &ParamMapping, error: impl Into<String>) -> Self {
        Self {
            from_step: mapping.from_step,
            from_field: mapping.from_field.clone(),
            to_field: mapping.to_field.clone(),
            extracted_value: None,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Outcome of evaluating one [`Assertion`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssertionResult {
    /// The originating assertion, echoed for self-contained reports.
    pub assertion: Assertion,
    /// Whether the check passed.
    pub passed: bool,
    /// The value actually observed; null when the field did not resolve.
    #[serde(default)]
    pub actual_value: JsonValue,
    /// Diagnostic set on failure or when the assertion is unsupported.
    #[serde(rename = "error_msg", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything recorded about one executed (or aborted) step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepResult {
    /// Step identifier.
    #[serde(rename = "step_id")]
    pub id: String,
    /// 1-based position within the case.
    pub step_order: u32,
    /// True iff the status code matched `expected_status` and every
    /// assertion passed.
    pub success: bool,
    /// Observed HTTP status; 0 when the step never produced a response.
    pub status_code: u16,
    /// The resolved parameters actually sent.
    #[serde(rename = "request", default)]
    pub resolved_params: JsonMap<String, JsonValue>,
    /// Parsed response body; unparseable bodies arrive as `{"raw": text}`.
    #[serde(rename = "response", default)]
    pub response_body: JsonValue,
    /// Response headers, multi-valued.
    #[serde(default)]
    pub response_headers: IndexMap<String, Vec<String>>,
    /// Round-trip latency of the HTTP call in milliseconds.
    #[serde(rename = "response_time_ms")]
    pub latency_ms: u64,
    /// One result per declared assertion, in declaration order.
    #[serde(default)]
    pub assertions: Vec<AssertionResult>,
    /// Extraction audit trail for this step's mappings.
    #[serde(default)]
    pub extractions: Vec<ExtractionRecord>,
    /// Step-fatal diagnostic (resolution, dispatch, or method error).
    #[serde(rename = "error_msg", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate counters computed over one run's (possibly partial) step list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RunSummary {
    /// Steps that produced a result before the run ended.
    pub total_steps: usize,
    /// Steps with `success == true`.
    pub succeeded_steps: usize,
    /// Steps with `success == false`.
    pub failed_steps: usize,
    /// Assertions evaluated across all reported steps.
    pub total_assertions: usize,
    /// Assertions that passed.
    pub passed_assertions: usize,
    /// Assertions that failed.
    pub failed_assertions: usize,
    /// Passed assertions as a percentage of the total; 0 when none ran.
    pub success_rate: f64,
}

impl RunSummary {
    /// Computes the summary over a full or partial result list.
    pub fn from_step_results(results: &[StepResult]) -> Self {
        let mut summary = Self {
            total_steps: results.len(),
            ..Self::default()
        };

        for step in results {
            if step.success {
                summary.succeeded_steps += 1;
            } else {
                summary.failed_steps += 1;
            }
            for assertion in &step.assertions {
                summary.total_assertions += 1;
                if assertion.passed {
                    summary.passed_assertions += 1;
                } else {
                    summary.failed_assertions += 1;
                }
            }
        }

        if summary.total_assertions > 0 {
            summary.success_rate = summary.passed_assertions as f64 / summary.total_assertions as f64 * 100.0;
        }

        summary
    }
}

/// The full deliverable of one run: ordered step results, the summary, and
/// the run-level error when the run was aborted by a fatal failure.
///
/// A step that merely missed its expected status or failed an assertion ends
/// the run without setting `error`; unresolved dependencies, unsupported
/// methods, and transport failures do set it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    /// Step results in strict `step_order`, ending at the first failure.
    pub steps: Vec<StepResult>,
    /// Counters over `steps`.
    pub summary: RunSummary,
    /// Wall-clock duration of the whole run in milliseconds.
    pub elapsed_ms: u64,
    /// Fatal run-level diagnostic, distinct from per-step failures.
    #[serde(rename = "error_msg", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    /// True when every reported step succeeded and no fatal error occurred.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.steps.iter().all(|step| step.success)
    }
}
