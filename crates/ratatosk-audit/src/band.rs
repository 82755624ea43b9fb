//! Band labels derived from cell identifiers.

use std::sync::LazyLock;

use ratatosk_ingest::RecordSet;
use ratatosk_model::BandConfig;
use regex::Regex;

/// Derived column holding each record's band label.
pub const BAND_COLUMN: &str = "band";

// Site code (three letters, three digits), one sector letter, then the band code.
static BAND_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{3}\d{3}[A-Za-z](.)").expect("Invalid band code regex"));

#[derive(Debug, Clone, Default)]
pub struct BandResolver {
    config: BandConfig,
}

impl BandResolver {
    pub fn new(config: BandConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BandConfig {
        &self.config
    }

    /// Band code character embedded in a cell identifier (`JKT001AT1` -> `T`).
    pub fn band_code(cell_id: &str) -> Option<char> {
        BAND_CODE
            .captures(cell_id)?
            .get(1)?
            .as_str()
            .chars()
            .next()
    }

    pub fn label_for_cell(&self, cell_id: &str) -> Option<&str> {
        self.config.label_for(Self::band_code(cell_id)?)
    }

    /// Band label per record.
    ///
    /// Site-level record sets get the baseline label. For cell-level sets the
    /// code is taken from the first cell column, in configured order, whose
    /// value carries one; records without a code or with an unmapped code
    /// get `None`.
    pub fn resolve(&self, records: &RecordSet) -> Vec<Option<String>> {
        let schema = records.schema();
        if !schema.is_cell_level() {
            return vec![Some(self.config.baseline_label.clone()); records.height()];
        }
        let cell_values: Vec<Vec<Option<String>>> = schema
            .cell_columns
            .iter()
            .filter_map(|column| records.text_column(column))
            .collect();
        (0..records.height())
            .map(|row| {
                let code = cell_values
                    .iter()
                    .find_map(|values| values[row].as_deref().and_then(Self::band_code))?;
                self.config.label_for(code).map(str::to_string)
            })
            .collect()
    }
}
