//! # Casewire Engine
//!
//! The Casewire Engine loads, validates, and executes API test cases: ordered
//! step lists that call HTTP endpoints, thread values from earlier responses
//! into later requests, and assert on what comes back.
//!
//! ## Key Features
//!
//! - **Case Loading**: Parses YAML/JSON case files (full cases or bare step lists)
//! - **Parameter Threading**: Dotted-path extraction from prior responses with
//!   a per-mapping audit trail
//! - **Typed Assertions**: Status, schema, and business-logic checks with loose
//!   stringified equality
//! - **Streaming Runs**: An async runner that emits lifecycle events and honors
//!   between-step cancellation
//!
//! ## Usage
//!
//! ```rust
//! use casewire_engine::parse_case_file;
//!
//! // Create a temporary case file for testing
//! let temp_dir = tempfile::tempdir()?;
//! let case_path = temp_dir.path().join("smoke.yaml");
//! std::fs::write(&case_path, r#"
//! id: "smoke"
//! name: "smoke"
//! steps: []
//! "#)?;
//!
//! let case = parse_case_file(&case_path)?;
//! println!("Loaded case '{}' with {} steps", case.name, case.steps.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`context`**: Per-run store of recorded response bodies
//! - **`resolve`**: Parameter resolution and the extraction audit trail
//! - **`dispatch`**: The HTTP seam ([`StepDispatcher`]) and its real and
//!   scripted implementations
//! - **`assertions`**: Pure assertion evaluation
//! - **`executor`**: The in-order, fail-fast step orchestrator
//! - **`runner`**: The event-streaming async runner

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};

pub mod assertions;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod resolve;
pub mod runner;

// Re-export commonly used types for convenience
pub use assertions::evaluate_assertions;
pub use context::ExecutionContext;
pub use dispatch::{DispatchedResponse, HttpStepDispatcher, ScriptedDispatcher, StepDispatcher};
pub use error::ExecutionError;
pub use executor::{run_case, run_case_against};
pub use resolve::{ResolutionFailure, ResolvedParams, resolve_step_params};
pub use runner::drive_case_run;

use casewire_types::{TestCase, TestStep};

/// Loads a test case file from the filesystem with automatic format detection.
///
/// The file may contain a full case document or a bare step list; a bare list
/// is wrapped into an anonymous case named after the file. YAML and JSON are
/// both accepted regardless of extension (JSON is a YAML subset).
///
/// # Errors
///
/// Returns an error when the file cannot be read, or when its content is
/// neither a case document nor a step list in YAML or JSON.
pub fn parse_case_file(file_path: impl AsRef<Path>) -> Result<TestCase> {
    let file_path = file_path.as_ref();
    let file_content = fs::read(file_path).with_context(|| format!("Failed to read case file: {}", file_path.display()))?;
    let content_string = String::from_utf8_lossy(&file_content);

    // Shape-gate on the raw document before the typed parse: the case model
    // defaults every field, so an arbitrary mapping would otherwise parse as
    // an empty enabled case instead of being rejected.
    let document: serde_yaml::Value = serde_yaml::from_str(&content_string)
        .with_context(|| format!("File '{}' is not valid YAML or JSON", file_path.display()))?;

    if document.is_mapping() && document.get("steps").is_some() {
        return serde_yaml::from_value(document)
            .with_context(|| format!("File '{}' is not a valid test case document", file_path.display()));
    }

    if document.is_sequence() {
        let steps: Vec<TestStep> = serde_yaml::from_value(document)
            .with_context(|| format!("File '{}' is not a valid step list", file_path.display()))?;
        let stem = file_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "case".to_string());
        return Ok(TestCase {
            id: stem.clone(),
            name: stem,
            description: None,
            steps,
            tags: Vec::new(),
            enabled: true,
        });
    }

    bail!(
        "File '{}' is neither a test case document with a 'steps' list nor a bare step list",
        file_path.display()
    )
}

/// Checks that a case's steps are executable in declaration order.
///
/// Orders must start at 1 and increase strictly; mappings may only reference
/// strictly earlier orders.
pub fn validate_steps(steps: &[TestStep]) -> Result<()> {
    let mut previous = 0u32;
    for step in steps {
        if step.step_order <= previous {
            bail!(
                "step '{}' has order {} but must come after order {}",
                step.id,
                step.step_order,
                previous
            );
        }
        for mapping in &step.param_mappings {
            if mapping.from_step >= step.step_order {
                bail!(
                    "step '{}' maps from step {} which does not run before it",
                    step.id,
                    mapping.from_step
                );
            }
        }
        previous = step.step_order;
    }
    Ok(())
}
