//! Utility helpers shared across the Casewire crates.
//!
//! - [`paths`]: dotted field-path traversal and in-place nested assignment
//! - [`json`]: canonical text rendering, numeric coercion, query-pair
//!   building, and lenient response-body parsing

pub mod json;
pub mod paths;

pub use json::{canonical_text, numeric_value, parse_lenient_body, query_pairs};
pub use paths::{PathAssignError, assign_path, lookup_path, strip_payload_prefix};
