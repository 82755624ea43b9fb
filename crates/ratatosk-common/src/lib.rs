//! Shared utilities for ratatosk crates.
//!
//! Polars `AnyValue` conversion plus the value canonicalization used when
//! configured parameter values are compared against reference targets.

pub mod polars;
pub mod text;

pub use polars::{any_to_f64, any_to_string, any_to_text, format_numeric};
pub use text::{canonical_text, parse_f64, parse_i64, strip_whitespace};
