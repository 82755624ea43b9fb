//! Join-key conventions of an object type's record set.

use crate::config::SchemaConfig;

/// Column holding the instance key of `object_type` (`EUtranCellFDD` -> `eutrancellfddid`).
pub fn instance_column(object_type: &str) -> String {
    format!("{}id", object_type.to_lowercase())
}

/// Declared key columns of one object type, derived once from its record set.
///
/// The dependency resolver joins two record sets on the columns both
/// schemas declare, so a join never depends on whatever else happens to be
/// in the frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSchema {
    pub object_type: String,
    pub node_column: Option<String>,
    /// Cell identifier columns present, in configured priority order.
    pub cell_columns: Vec<String>,
    pub instance_column: Option<String>,
    /// Set when the object type is itself a cell type (its instance column is a cell column).
    pub duplex: Option<String>,
}

impl ObjectSchema {
    pub fn infer<S: AsRef<str>>(object_type: &str, columns: &[S], conventions: &SchemaConfig) -> Self {
        let has = |name: &str| columns.iter().any(|c| c.as_ref() == name);
        let own_instance = instance_column(object_type);
        let duplex = conventions
            .cell_id_columns
            .iter()
            .any(|c| *c == own_instance)
            .then(|| object_type.to_lowercase());
        Self {
            object_type: object_type.to_string(),
            node_column: has(&conventions.node_column).then(|| conventions.node_column.clone()),
            cell_columns: conventions
                .cell_id_columns
                .iter()
                .filter(|c| has(c))
                .cloned()
                .collect(),
            instance_column: has(&own_instance).then_some(own_instance),
            duplex,
        }
    }

    pub fn is_cell_level(&self) -> bool {
        !self.cell_columns.is_empty()
    }

    /// Columns to join `self` against `other`: the node column plus every
    /// cell column both carry. Node only when they share no cell column.
    pub fn join_columns(&self, other: &ObjectSchema) -> Vec<String> {
        let mut columns = Vec::new();
        if let (Some(mine), Some(theirs)) = (&self.node_column, &other.node_column)
            && mine == theirs
        {
            columns.push(mine.clone());
        }
        columns.extend(
            self.cell_columns
                .iter()
                .filter(|c| other.cell_columns.contains(c))
                .cloned(),
        );
        columns
    }

    /// Node, cell and instance columns, in that order.
    pub fn identifier_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self.node_column.iter().cloned().collect();
        columns.extend(self.cell_columns.iter().cloned());
        if let Some(instance) = &self.instance_column
            && !columns.contains(instance)
        {
            columns.push(instance.clone());
        }
        columns
    }
}

/// Duplex label carried by a cell column (`eutrancelltddid` -> `eutrancelltdd`).
pub fn duplex_of_column(column: &str) -> &str {
    column.strip_suffix("id").unwrap_or(column)
}
