//! Node, site and cell restrictions for loaded records.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use polars::prelude::{CsvReadOptions, SerReader};
use ratatosk_model::SchemaConfig;
use serde::{Deserialize, Serialize};

use crate::collector::SITE_COLUMN;
use crate::error::IngestError;
use crate::frame::{normalize_frame, text_column};
use crate::record_set::RecordSet;

/// What an object list restricts records by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterBy {
    #[default]
    Node,
    Site,
    Cell,
}

/// Allowed values per dimension; an unset dimension allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub nodes: Option<BTreeSet<String>>,
    pub sites: Option<BTreeSet<String>>,
    pub cells: Option<BTreeSet<String>>,
    /// Extra `column -> allowed values` restrictions.
    pub columns: BTreeMap<String, BTreeSet<String>>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_none() && self.sites.is_none() && self.cells.is_none() && self.columns.is_empty()
    }

    pub fn with_column(mut self, column: &str, values: impl IntoIterator<Item = String>) -> Self {
        self.columns
            .insert(column.to_lowercase(), values.into_iter().collect());
        self
    }

    /// Per-record keep mask.
    ///
    /// The cell dimension applies to record sets with cell columns; other
    /// object types fall back to the node dimension. A dimension whose
    /// column is missing from the record set keeps nothing.
    pub fn keep_mask(&self, records: &RecordSet) -> Vec<bool> {
        let mut keep = vec![true; records.height()];
        let schema = records.schema();

        if let Some(nodes) = &self.nodes {
            let values = schema.node_column.as_deref().and_then(|c| records.text_column(c));
            restrict(&mut keep, values, nodes);
        }
        if let Some(sites) = &self.sites {
            restrict(&mut keep, records.text_column(SITE_COLUMN), sites);
        }
        if let Some(cells) = &self.cells
            && schema.is_cell_level()
        {
            let cell_values: Vec<Vec<Option<String>>> = schema
                .cell_columns
                .iter()
                .filter_map(|c| records.text_column(c))
                .collect();
            for (idx, slot) in keep.iter_mut().enumerate() {
                *slot &= cell_values
                    .iter()
                    .any(|values| values[idx].as_ref().is_some_and(|v| cells.contains(v)));
            }
        }
        for (column, allowed) in &self.columns {
            restrict(&mut keep, records.text_column(column), allowed);
        }
        keep
    }
}

fn restrict(keep: &mut [bool], values: Option<Vec<Option<String>>>, allowed: &BTreeSet<String>) {
    match values {
        Some(values) => {
            for (slot, value) in keep.iter_mut().zip(values) {
                *slot &= value.is_some_and(|v| allowed.contains(&v));
            }
        }
        None => keep.iter_mut().for_each(|slot| *slot = false),
    }
}

/// Reads a cell or site inventory CSV into a filter.
///
/// Filtering by cell also records the owning nodes so that node-level object
/// types are restricted to the same nodes.
pub fn load_object_list(
    path: &Path,
    filter_by: FilterBy,
    conventions: &SchemaConfig,
) -> Result<RecordFilter, IngestError> {
    if !path.is_file() {
        return Err(IngestError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "object list not found"),
        });
    }
    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .finish()
        .map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    let df = normalize_frame(&raw)?;
    let has = |column: &str| df.column(column).is_ok();
    let collect = |column: &str| -> Result<BTreeSet<String>, IngestError> {
        if !has(column) {
            return Err(IngestError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
        Ok(text_column(&df, column)?.into_iter().flatten().collect())
    };

    let mut filter = RecordFilter::default();
    match filter_by {
        FilterBy::Node => filter.nodes = Some(collect(&conventions.node_column)?),
        FilterBy::Site => filter.sites = Some(collect(SITE_COLUMN)?),
        FilterBy::Cell => {
            let mut cells = BTreeSet::new();
            let mut found = false;
            let mut candidates = conventions.cell_id_columns.clone();
            candidates.push("cell".to_string());
            for column in &candidates {
                if has(column) {
                    found = true;
                    cells.extend(collect(column)?);
                }
            }
            if !found {
                return Err(IngestError::MissingColumn {
                    path: path.to_path_buf(),
                    column: "cell".to_string(),
                });
            }
            filter.cells = Some(cells);
            if has(&conventions.node_column) {
                filter.nodes = Some(collect(&conventions.node_column)?);
            }
        }
    }
    Ok(filter)
}
