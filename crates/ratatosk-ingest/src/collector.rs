//! Collects configuration exports laid out as
//! `<cm_folder>/<subfolder>/<date>/<ObjectType>.csv`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Instant;

use polars::prelude::{CsvReadOptions, DataFrame, SerReader};
use ratatosk_model::SchemaConfig;
use regex::Regex;
use tracing::{debug, info, info_span, warn};

use crate::error::IngestError;
use crate::frame::{normalize_frame, text_column, text_frame};
use crate::record_set::RecordSet;
use crate::store::{LoadRequest, RecordSource};

pub const FOLDER_COLUMN: &str = "folder";
pub const SITE_COLUMN: &str = "siteid";

static SITE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{3}\d{3}").expect("Invalid site id regex"));

/// Site identifier embedded in a node name (`ERBS_JKT123_X` -> `JKT123`).
pub fn site_id(node: &str) -> Option<&str> {
    SITE_ID.find(node).map(|m| m.as_str())
}

#[derive(Debug, Clone)]
pub struct CmCollector {
    cm_folder: PathBuf,
    date: String,
    sub_folders: Vec<String>,
    conventions: SchemaConfig,
}

impl CmCollector {
    pub fn new(
        cm_folder: impl Into<PathBuf>,
        date: impl Into<String>,
        sub_folders: Vec<String>,
        conventions: SchemaConfig,
    ) -> Self {
        Self {
            cm_folder: cm_folder.into(),
            date: date.into(),
            sub_folders,
            conventions,
        }
    }

    pub fn conventions(&self) -> &SchemaConfig {
        &self.conventions
    }

    /// Candidate files for an object type, tagged with their sub folder.
    pub fn file_paths(&self, object_type: &str) -> Vec<(Option<String>, PathBuf)> {
        let file_name = format!("{object_type}.csv");
        if self.sub_folders.is_empty() {
            return vec![(None, self.cm_folder.join(&self.date).join(file_name))];
        }
        self.sub_folders
            .iter()
            .map(|sub| {
                (
                    Some(sub.clone()),
                    self.cm_folder.join(sub).join(&self.date).join(&file_name),
                )
            })
            .collect()
    }

    fn read_file(path: &Path) -> Result<DataFrame, IngestError> {
        let csv_error = |source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let raw = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(csv_error)?
            .finish()
            .map_err(csv_error)?;
        Ok(normalize_frame(&raw)?)
    }

    /// Columns kept from a file: identifiers plus the requested parameters,
    /// or everything when no parameter was requested.
    fn keep_column(&self, name: &str, parameters: &[String]) -> bool {
        parameters.is_empty()
            || name == self.conventions.node_column
            || name == SITE_COLUMN
            || name == FOLDER_COLUMN
            || name.ends_with("id")
            || parameters.iter().any(|p| p.eq_ignore_ascii_case(name))
    }

    fn read_columns(
        &self,
        path: &Path,
        folder: Option<&str>,
        parameters: &[String],
    ) -> Result<Vec<(String, Vec<Option<String>>)>, IngestError> {
        let df = Self::read_file(path)?;
        let height = df.height();
        let mut columns = Vec::new();
        for name in df.get_column_names_owned() {
            let name = name.to_string();
            if self.keep_column(&name, parameters) {
                let values = text_column(&df, &name)?;
                columns.push((name, values));
            }
        }
        if let Some(folder) = folder {
            columns.push((FOLDER_COLUMN.to_string(), vec![Some(folder.to_string()); height]));
        }
        let node_values = columns
            .iter()
            .find(|(name, _)| *name == self.conventions.node_column)
            .map(|(_, values)| values.clone());
        if let Some(nodes) = node_values
            && !columns.iter().any(|(name, _)| name == SITE_COLUMN)
        {
            let sites = nodes
                .iter()
                .map(|node| node.as_deref().and_then(site_id).map(str::to_string))
                .collect();
            columns.push((SITE_COLUMN.to_string(), sites));
        }
        Ok(columns)
    }
}

impl RecordSource for CmCollector {
    fn load_records(&self, request: &LoadRequest<'_>) -> Result<RecordSet, IngestError> {
        let span = info_span!("load_records", object_type = %request.object_type);
        let _guard = span.enter();
        let start = Instant::now();

        let mut parts = Vec::new();
        for (folder, path) in self.file_paths(request.object_type) {
            if !path.is_file() {
                warn!(path = %path.display(), "configuration export not found");
                continue;
            }
            debug!(path = %path.display(), "reading configuration export");
            parts.push(self.read_columns(&path, folder.as_deref(), request.parameters)?);
        }
        if parts.is_empty() {
            return Ok(RecordSet::empty(request.object_type, &self.conventions));
        }

        let frame = text_frame(union_columns(parts))?;
        let mut records = RecordSet::new(request.object_type, &frame, &self.conventions)?;
        if !request.filter.is_empty() {
            let keep = request.filter.keep_mask(&records);
            records.filter_rows(&keep)?;
        }
        if let Some(instances) = request.instances {
            records = records.restrict_to_instances(instances)?;
        }
        let duplicates = records.deduplicate()?;
        info!(
            records = records.height(),
            duplicates,
            duration_ms = start.elapsed().as_millis(),
            "loaded records"
        );
        Ok(records)
    }
}

/// Stacks column sets from several files; columns missing from a file are null.
fn union_columns(parts: Vec<Vec<(String, Vec<Option<String>>)>>) -> Vec<(String, Vec<Option<String>>)> {
    let mut names: Vec<String> = Vec::new();
    for part in &parts {
        for (name, _) in part {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    let mut merged: Vec<(String, Vec<Option<String>>)> =
        names.into_iter().map(|name| (name, Vec::new())).collect();
    for part in parts {
        let height = part.first().map_or(0, |(_, values)| values.len());
        for (name, values) in merged.iter_mut() {
            match part.iter().find(|(candidate, _)| candidate == name) {
                Some((_, part_values)) => values.extend(part_values.iter().cloned()),
                None => values.extend(std::iter::repeat_n(None, height)),
            }
        }
    }
    merged
}
