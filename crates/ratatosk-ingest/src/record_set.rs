use polars::prelude::{DataFrame, PolarsResult};
use ratatosk_common::{any_to_text, canonical_text};
use ratatosk_model::{ObjectSchema, SchemaConfig, duplex_of_column};
use tracing::warn;

use crate::frame::{deduplicate, filter_rows, normalize_frame, set_text_column, text_column};

/// Records of one object type with lower-case text columns and a declared
/// join-key schema.
#[derive(Debug, Clone)]
pub struct RecordSet {
    object_type: String,
    schema: ObjectSchema,
    data: DataFrame,
}

impl RecordSet {
    /// Normalizes `data` (lower-case names, text values) and infers the schema.
    pub fn new(object_type: &str, data: &DataFrame, conventions: &SchemaConfig) -> PolarsResult<Self> {
        let data = normalize_frame(data)?;
        let names = column_names(&data);
        Ok(Self {
            object_type: object_type.to_string(),
            schema: ObjectSchema::infer(object_type, &names, conventions),
            data,
        })
    }

    pub fn empty(object_type: &str, conventions: &SchemaConfig) -> Self {
        Self {
            object_type: object_type.to_string(),
            schema: ObjectSchema::infer::<String>(object_type, &[], conventions),
            data: DataFrame::empty(),
        }
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn schema(&self) -> &ObjectSchema {
        &self.schema
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn into_data(self) -> DataFrame {
        self.data
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        column_names(&self.data)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.data.column(name).is_ok()
    }

    /// Text values of `name`, `None` when the column does not exist.
    pub fn text_column(&self, name: &str) -> Option<Vec<Option<String>>> {
        if !self.has_column(name) {
            return None;
        }
        text_column(&self.data, name).ok()
    }

    /// Adds or replaces a text column. Values must match the record count.
    pub fn set_text_column(&mut self, name: &str, values: Vec<Option<String>>) -> PolarsResult<()> {
        set_text_column(&mut self.data, name, values)
    }

    pub fn drop_columns<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&str) -> bool,
    {
        let doomed: Vec<String> = self
            .column_names()
            .into_iter()
            .filter(|name| predicate(name))
            .collect();
        for name in doomed {
            if let Err(error) = self.data.drop_in_place(&name) {
                warn!(column = %name, %error, "failed to drop column");
            }
        }
    }

    pub fn filter_rows(&mut self, keep: &[bool]) -> PolarsResult<()> {
        filter_rows(&mut self.data, keep)
    }

    /// Copy restricted to rows whose instance column equals `instance`.
    ///
    /// Without an instance column nothing can match and the copy is empty.
    pub fn restrict_to_instance(&self, instance: &str) -> PolarsResult<RecordSet> {
        self.restrict_to_instances(&[instance.to_string()])
    }

    pub fn restrict_to_instances(&self, instances: &[String]) -> PolarsResult<RecordSet> {
        let mut restricted = self.clone();
        let Some(column) = self.schema.instance_column.as_deref() else {
            warn!(
                object_type = %self.object_type,
                "records have no instance column; instance-scoped rules match nothing"
            );
            let keep = vec![false; self.height()];
            restricted.filter_rows(&keep)?;
            return Ok(restricted);
        };
        let wanted: Vec<String> = instances.iter().map(|i| canonical_text(i)).collect();
        let keep: Vec<bool> = text_column(&self.data, column)?
            .iter()
            .map(|value| {
                value
                    .as_deref()
                    .is_some_and(|v| wanted.contains(&canonical_text(v)))
            })
            .collect();
        restricted.filter_rows(&keep)?;
        Ok(restricted)
    }

    /// Drops repeated records on the identifier columns, keeping the first.
    pub fn deduplicate(&mut self) -> PolarsResult<usize> {
        let keys = self.schema.identifier_columns();
        deduplicate(&mut self.data, &keys)
    }

    /// `type=id` path of a record built from its cell columns and its own
    /// instance column, e.g. `eutrancellfdd=JKT001L1` or `qciprofilepredefined=qci1`.
    pub fn mo_path(&self, row: usize) -> String {
        let mut columns: Vec<&str> = self.schema.cell_columns.iter().map(String::as_str).collect();
        if let Some(instance) = self.schema.instance_column.as_deref()
            && !columns.contains(&instance)
        {
            columns.push(instance);
        }
        let mut parts = Vec::new();
        for name in columns {
            let value = self
                .data
                .column(name)
                .ok()
                .and_then(|c| c.get(row).ok())
                .and_then(any_to_text);
            if let Some(value) = value {
                parts.push(format!("{}={}", duplex_of_column(name), canonical_text(&value)));
            }
        }
        parts.join(",")
    }
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(ToString::to_string)
        .collect()
}
