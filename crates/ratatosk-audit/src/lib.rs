//! Rule evaluation over loaded record sets.
//!
//! [`Auditor::audit`] walks every audited object type of a [`RuleSet`],
//! partitions its records by band, resolves dependencies against the
//! [`RecordStore`] and writes `<param>_ref`, `<param>_check` and
//! `<param>_eq` columns into an [`AuditResult`].
//!
//! [`RuleSet`]: ratatosk_model::RuleSet
//! [`RecordStore`]: ratatosk_ingest::RecordStore

pub mod auditor;
pub mod band;
pub mod dependency;
pub mod error;
pub mod evaluate;
pub mod result;

pub use auditor::{Auditor, DUPLEX_PLACEHOLDER};
pub use band::{BAND_COLUMN, BandResolver};
pub use dependency::{DependencyResolver, apply_arithmetic};
pub use error::AuditError;
pub use evaluate::{Evaluation, evaluate, resolve_target};
pub use result::{AuditResult, summarize};
