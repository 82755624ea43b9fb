//! Reference table loading and rule compilation.

pub mod compiler;
pub mod groups;
pub mod query;
pub mod table;

pub use compiler::{CompiledReference, compile_reference, load_reference};
pub use groups::{GroupMember, IndicatorGroups, ParameterGroup, ParameterGroups};
pub use query::cmedit_query;
pub use table::ReferenceTable;
