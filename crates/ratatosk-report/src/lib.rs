//! Report generation for audit results.
//!
//! - **Simple report**: one row per (record, parameter), written as CSV
//! - **Group summary**: OK/NOK/NA tallies per indicator, group and parameter, written as JSON

mod simple;
mod summary;

pub use simple::{SimpleReportRow, simple_report, write_simple_report, write_simple_report_to};
pub use summary::{
    AuditSummary, GroupSummary, IndicatorSummary, ParameterSummary, summarize_groups,
    write_summary_json,
};
