use std::collections::BTreeMap;

use ratatosk_model::RuleIndex;
use tracing::{info, info_span};

use crate::error::IngestError;
use crate::filter::RecordFilter;
use crate::record_set::RecordSet;

/// What to load for one object type.
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest<'a> {
    pub object_type: &'a str,
    /// `None` loads every instance.
    pub instances: Option<&'a [String]>,
    /// Lower-cased parameters; empty keeps every column.
    pub parameters: &'a [String],
    pub filter: &'a RecordFilter,
}

/// Supplies record sets to the audit.
pub trait RecordSource {
    fn load_records(&self, request: &LoadRequest<'_>) -> Result<RecordSet, IngestError>;
}

/// Object type to loaded records. Read-only once the audit starts.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    sets: BTreeMap<String, RecordSet>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every object type of the index, dependency-only ones included,
    /// so that all joins see fully loaded record sets.
    pub fn load_all<S>(source: &S, index: &RuleIndex, filter: &RecordFilter) -> Result<Self, IngestError>
    where
        S: RecordSource + ?Sized,
    {
        let span = info_span!("load_all", object_types = index.len());
        let _guard = span.enter();
        let mut store = Self::new();
        for (object_type, requirement) in index.iter() {
            let request = LoadRequest {
                object_type,
                instances: requirement.instance_filter(),
                parameters: &requirement.parameters,
                filter,
            };
            store.insert(source.load_records(&request)?);
        }
        info!(
            object_types = store.len(),
            records = store.iter().map(|(_, set)| set.height()).sum::<usize>(),
            "record store ready"
        );
        Ok(store)
    }

    /// Replaces any record set already held for the same object type.
    pub fn insert(&mut self, records: RecordSet) {
        self.sets.insert(records.object_type().to_string(), records);
    }

    pub fn get(&self, object_type: &str) -> Option<&RecordSet> {
        self.sets.get(object_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordSet)> {
        self.sets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
