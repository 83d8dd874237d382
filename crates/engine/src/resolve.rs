//! Per-step parameter resolution.
//!
//! A step's outbound parameters are its literal `params` bag merged with
//! values pulled from earlier responses through its `param_mappings`.
//! Resolution is fail-fast per mapping: the first mapping that cannot be
//! applied stops the whole step before any request is sent, but every
//! extraction record produced up to and including the failure is preserved
//! for diagnostics.

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;

use casewire_types::{ExtractionRecord, TestStep};
use casewire_util::{assign_path, lookup_path};

use crate::{context::ExecutionContext, error::ExecutionError};

/// The fully resolved parameter bag plus the extraction audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    /// Literal params with all mapped values written in.
    pub params: JsonMap<String, JsonValue>,
    /// One record per applied mapping, in declaration order.
    pub extractions: Vec<ExtractionRecord>,
}

/// A resolution failure carrying the partial extraction trail.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionFailure {
    /// Which mapping failed and why.
    pub error: ExecutionError,
    /// Records up to and including the failing mapping.
    pub extractions: Vec<ExtractionRecord>,
}

/// Builds the parameter bag a step will actually send.
///
/// Mappings apply in declaration order against `context`; resolving the same
/// step twice against an unmodified context yields identical records.
pub fn resolve_step_params(step: &TestStep, context: &ExecutionContext) -> Result<ResolvedParams, ResolutionFailure> {
    let mut params = step.params.clone();
    let mut extractions = Vec::with_capacity(step.param_mappings.len());

    for mapping in &step.param_mappings {
        let Some(source) = context.response_for(mapping.from_step) else {
            let error = ExecutionError::UnresolvedDependency {
                from_step: mapping.from_step,
            };
            extractions.push(ExtractionRecord::failed(mapping, error.to_string()));
            return Err(ResolutionFailure { error, extractions });
        };

        let Some(value) = lookup_path(source, &mapping.from_field) else {
            let error = ExecutionError::FieldExtraction {
                path: mapping.from_field.clone(),
                detail: format!("not found in step {} response", mapping.from_step),
            };
            extractions.push(ExtractionRecord::failed(mapping, error.to_string()));
            return Err(ResolutionFailure { error, extractions });
        };
        let value = value.clone();

        if let Err(assign_error) = assign_path(&mut params, &mapping.to_field, value.clone()) {
            let error = ExecutionError::FieldExtraction {
                path: mapping.to_field.clone(),
                detail: assign_error.to_string(),
            };
            extractions.push(ExtractionRecord::failed(mapping, error.to_string()));
            return Err(ResolutionFailure { error, extractions });
        }

        debug!(
            from_step = mapping.from_step,
            from_field = %mapping.from_field,
            to_field = %mapping.to_field,
            "mapping applied"
        );
        extractions.push(ExtractionRecord::succeeded(mapping, value));
    }

    Ok(ResolvedParams { params, extractions })
}
