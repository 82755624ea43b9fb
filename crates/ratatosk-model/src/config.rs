//! Global configuration, read from a JSON file and passed explicitly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_BASELINE_BAND: &str = "L900";
pub const DEFAULT_NODE_COLUMN: &str = "mecontext";
pub const DEFAULT_CELL_ID_COLUMNS: [&str; 3] = ["eutrancellfddid", "eutrancelltddid", "nrcellduid"];

fn default_band_map() -> BTreeMap<String, String> {
    [
        ("T", "L900"),
        ("L", "L1800"),
        ("R", "L2100"),
        ("E", "L2300_20"),
        ("F", "L2300_20"),
        ("V", "L2300_10"),
    ]
    .into_iter()
    .map(|(code, label)| (code.to_string(), label.to_string()))
    .collect()
}

/// Band code to label map for the band resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandConfig {
    pub code_to_label: BTreeMap<char, String>,
    /// Label given to records of site-level object types.
    pub baseline_label: String,
}

impl Default for BandConfig {
    fn default() -> Self {
        GlobalConfig::default().band_config()
    }
}

impl BandConfig {
    pub fn label_for(&self, code: char) -> Option<&str> {
        self.code_to_label
            .get(&code)
            .or_else(|| self.code_to_label.get(&code.to_ascii_uppercase()))
            .map(String::as_str)
    }

    /// Distinct labels, baseline included, in sorted order.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.code_to_label.values().cloned().collect();
        labels.push(self.baseline_label.clone());
        labels.sort();
        labels.dedup();
        labels
    }
}

/// Column naming conventions of loaded record sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaConfig {
    pub node_column: String,
    pub cell_id_columns: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        GlobalConfig::default().schema_config()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub dict_band: BTreeMap<String, String>,
    pub baseline_band: String,
    pub node_column: String,
    pub cell_id_columns: Vec<String>,
    pub cm_folder: Option<PathBuf>,
    pub enm_list: Vec<String>,
    pub output_folder: Option<PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            dict_band: default_band_map(),
            baseline_band: DEFAULT_BASELINE_BAND.to_string(),
            node_column: DEFAULT_NODE_COLUMN.to_string(),
            cell_id_columns: Vec::from(DEFAULT_CELL_ID_COLUMNS.map(str::to_string)),
            cm_folder: None,
            enm_list: Vec::new(),
            output_folder: None,
        }
    }
}

impl GlobalConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Reads `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    pub fn band_config(&self) -> BandConfig {
        let mut code_to_label = BTreeMap::new();
        for (code, label) in &self.dict_band {
            let mut chars = code.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    code_to_label.insert(c, label.clone());
                }
                _ => warn!(code = %code, "ignoring band code that is not a single character"),
            }
        }
        BandConfig {
            code_to_label,
            baseline_label: self.baseline_band.clone(),
        }
    }

    pub fn schema_config(&self) -> SchemaConfig {
        SchemaConfig {
            node_column: self.node_column.to_lowercase(),
            cell_id_columns: self
                .cell_id_columns
                .iter()
                .map(|column| column.to_lowercase())
                .collect(),
        }
    }
}
