//! Data model for reference-driven configuration audits.
//!
//! A reference table compiles into [`Rule`]s. Each rule carries per-band
//! [`TargetExpression`]s and an optional [`DependencySpec`]. Evaluating a rule
//! against a record yields a [`Verdict`].

pub mod config;
pub mod dependency;
pub mod error;
pub mod rule;
pub mod schema;
pub mod target;
pub mod verdict;

pub use config::{BandConfig, GlobalConfig, SchemaConfig};
pub use dependency::{ArithmeticOp, DependencySpec, DependencyTerm};
pub use error::{ConfigError, DependencyParseError, TargetParseError};
pub use rule::{
    AS_INFO_ACTION, BandTargets, DEFAULT_GROUP, DEFAULT_INDICATOR, ObjectRequirement, Rule,
    RuleIndex, RuleSet, check_column, eq_column, ref_column, subject_name,
};
pub use schema::{ObjectSchema, duplex_of_column, instance_column};
pub use target::{
    Inequality, InequalityOp, Operand, PiecewiseEntry, PiecewiseKey, PiecewiseMap,
    TargetExpression,
};
pub use verdict::{Verdict, VerdictTally};
