//! Run-fatal error taxonomy.
//!
//! Resolution and dispatch failures abort the step and the whole run;
//! assertion-level problems never surface here — they are recorded on the
//! individual `AssertionResult` and only affect that step's success flag.

use thiserror::Error;

/// Errors that end a run at the step where they occur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A mapping references a step with no recorded response — the source
    /// step has not run yet, has a later order, or failed before producing one.
    #[error("no recorded response for step {from_step}")]
    UnresolvedDependency {
        /// `step_order` the mapping points at.
        from_step: u32,
    },

    /// A dotted path did not resolve inside a prior response, or the
    /// extracted value could not be written at its destination.
    #[error("field extraction failed at '{path}': {detail}")]
    FieldExtraction {
        /// The path that failed (source or destination).
        path: String,
        /// What went wrong.
        detail: String,
    },

    /// The step's HTTP method is not one of GET/POST/PUT/PATCH/DELETE.
    #[error("unsupported HTTP method '{method}'")]
    UnsupportedMethod {
        /// The method as declared on the step.
        method: String,
    },

    /// Network-level failure during dispatch: connection, timeout, DNS, TLS.
    #[error("request failed: {message}")]
    Transport {
        /// The underlying transport error, stringified.
        message: String,
    },
}
