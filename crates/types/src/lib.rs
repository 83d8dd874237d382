//! Shared type definitions for the Casewire test execution engine.
//!
//! The case model defined here mirrors the wire format produced by the
//! scenario authoring side: an ordered list of [`TestStep`]s, each carrying
//! literal parameters, static headers, cross-step [`ParamMapping`]s, and a
//! list of typed [`Assertion`]s. The engine consumes these records verbatim
//! and never mutates them once a run has started.
//!
//! Result-side types live in [`report`]; event/control types for the
//! streaming runner live in [`run`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

pub mod report;
pub mod run;

pub use report::{AssertionResult, ExtractionRecord, RunReport, RunSummary, StepResult};
pub use run::{CaseRunControl, CaseRunEvent, CaseRunRequest, CaseRunStatus};

/// A named, ordered collection of steps executed as one unit.
///
/// Persistence concerns (scenario ids, execution records) are handled by the
/// surrounding services; the engine only needs the step list, but the
/// authoring metadata travels with it so reports stay self-describing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    /// Stable identifier assigned by the authoring side.
    #[serde(default)]
    pub id: String,
    /// Human-readable case name.
    #[serde(default)]
    pub name: String,
    /// Optional descriptive copy.
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered steps; `step_order` must be strictly increasing from 1.
    #[serde(default)]
    pub steps: Vec<TestStep>,
    /// Free-form labels attached by the authoring side.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Disabled cases are loadable but should not be executed.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// One HTTP call within a test case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestStep {
    /// Stable step identifier.
    #[serde(default)]
    pub id: String,
    /// 1-based position within the case; also the key other steps use to
    /// reference this step's response.
    pub step_order: u32,
    /// Identifier of the target API in the authoring catalog, when known.
    #[serde(default)]
    pub api_id: Option<String>,
    /// Display name of the target API.
    #[serde(default)]
    pub api_name: Option<String>,
    /// Request path relative to the run's base URL.
    pub api_path: String,
    /// HTTP method; GET/POST/PUT/PATCH/DELETE are dispatchable.
    pub api_method: String,
    /// Human description surfaced in reports and run events.
    #[serde(default)]
    pub description: Option<String>,
    /// Literal parameter bag, merged with mapped values at resolution time.
    #[serde(default)]
    pub params: JsonMap<String, JsonValue>,
    /// Static headers applied verbatim to the outbound request.
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Data dependencies on earlier steps, applied in declaration order.
    #[serde(default)]
    pub param_mappings: Vec<ParamMapping>,
    /// Checks evaluated against the response.
    #[serde(default)]
    pub assertions: Vec<Assertion>,
    /// Status code the response must carry for the step to succeed.
    pub expected_status: u16,
    /// Per-call timeout in milliseconds; the engine default applies when unset.
    #[serde(rename = "timeout", default)]
    pub timeout_ms: Option<u64>,
}

/// Copies a field out of an earlier step's response into this step's
/// resolved parameters.
///
/// Both paths are dotted; `from_field` may carry a leading `response.` (or
/// `request.`) segment and `to_field` a leading `request.` segment, which are
/// stripped before traversal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamMapping {
    /// `step_order` of the source step.
    pub from_step: u32,
    /// Dotted path into the source step's recorded response.
    pub from_field: String,
    /// Dotted path into this step's parameter bag.
    pub to_field: String,
}

/// A single pass/fail check against a step's status code or response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assertion {
    /// What the assertion inspects.
    #[serde(rename = "type")]
    pub kind: AssertionKind,
    /// Dotted path into the response body; ignored for status-code
    /// assertions, and an empty path resolves to the whole body.
    #[serde(default)]
    pub field: Option<String>,
    /// Comparison applied between actual and expected.
    pub operator: AssertionOperator,
    /// Right-hand operand of the comparison.
    #[serde(default)]
    pub expected_value: JsonValue,
    /// Authoring-side description of the check.
    #[serde(default)]
    pub description: Option<String>,
}

/// Assertion categories understood by the engine.
///
/// Unknown categories deserialize into [`AssertionKind::Other`] so a single
/// bad assertion fails its own check instead of rejecting the whole case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssertionKind {
    /// Compare against the HTTP status code.
    StatusCode,
    /// Compare a body field; shape checks share the value-comparison logic.
    ResponseSchema,
    /// Compare a body field against a business expectation.
    BusinessLogic,
    /// Any category this engine version does not evaluate.
    #[serde(untagged)]
    Other(String),
}

impl AssertionKind {
    /// Wire-format name of the kind.
    pub fn as_str(&self) -> &str {
        match self {
            AssertionKind::StatusCode => "status_code",
            AssertionKind::ResponseSchema => "response_schema",
            AssertionKind::BusinessLogic => "business_logic",
            AssertionKind::Other(name) => name,
        }
    }
}

/// Comparison operators supported by the assertion engine.
///
/// Unknown operators deserialize into [`AssertionOperator::Other`] and
/// evaluate to a failed assertion rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssertionOperator {
    /// Stringified equality; `42` and `"42"` compare equal by design.
    #[serde(rename = "==")]
    Equal,
    /// Stringified inequality.
    #[serde(rename = "!=")]
    NotEqual,
    /// Numeric greater-than; false when either operand is non-numeric.
    #[serde(rename = ">")]
    GreaterThan,
    /// Numeric less-than.
    #[serde(rename = "<")]
    LessThan,
    /// Numeric greater-or-equal.
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// Numeric less-or-equal.
    #[serde(rename = "<=")]
    LessOrEqual,
    /// Textual substring test over both operands' string forms.
    Contains,
    /// Expected value treated as a regular expression over the actual value's
    /// string form; malformed patterns degrade to false.
    Matches,
    /// True when the actual value is non-null; expected value is ignored.
    Exists,
    /// Any operator this engine version does not evaluate.
    #[serde(untagged)]
    Other(String),
}

impl AssertionOperator {
    /// Wire-format symbol of the operator, used in diagnostics.
    pub fn symbol(&self) -> &str {
        match self {
            AssertionOperator::Equal => "==",
            AssertionOperator::NotEqual => "!=",
            AssertionOperator::GreaterThan => ">",
            AssertionOperator::LessThan => "<",
            AssertionOperator::GreaterOrEqual => ">=",
            AssertionOperator::LessOrEqual => "<=",
            AssertionOperator::Contains => "contains",
            AssertionOperator::Matches => "matches",
            AssertionOperator::Exists => "exists",
            AssertionOperator::Other(symbol) => symbol,
        }
    }
}

const fn default_enabled() -> bool {
    true
}
