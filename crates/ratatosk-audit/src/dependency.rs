//! Cross-object dependency joins.

use std::collections::HashMap;

use ratatosk_common::{canonical_text, parse_f64};
use ratatosk_ingest::{RecordSet, RecordStore};
use ratatosk_model::{ArithmeticOp, DependencyTerm, Rule};
use tracing::{debug, warn};

use crate::error::AuditError;

/// Resolves dependency terms against the loaded record store.
#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver<'a> {
    store: &'a RecordStore,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Value of `term` for every record of `records`.
    ///
    /// A term on the records' own object type reads the record's own column.
    /// Other object types are joined on the node column plus every cell
    /// column both sides carry; the first matching dependency record wins.
    /// Anything that prevents the join (unloaded object type, missing
    /// parameter column, no shared key) resolves every record to `None`.
    pub fn resolve_term(
        &self,
        records: &RecordSet,
        term: &DependencyTerm,
    ) -> Vec<Option<String>> {
        let unresolved = || vec![None; records.height()];

        if term.object_type == records.object_type()
            && term.instance.is_none()
            && let Some(own) = records.text_column(&term.parameter)
        {
            return own;
        }

        let Some(dependency) = self.store.get(&term.object_type) else {
            warn!(dependency = %term, "dependency object type is not loaded");
            return unresolved();
        };
        let Some(values) = dependency.text_column(&term.parameter) else {
            warn!(dependency = %term, "dependency parameter column is missing");
            return unresolved();
        };
        let keys = records.schema().join_columns(dependency.schema());
        if keys.is_empty() {
            warn!(
                dependency = %term,
                object_type = %records.object_type(),
                "no join key shared with the dependency object type"
            );
            return unresolved();
        }

        let wanted_instance = term.instance.as_deref().map(canonical_text);
        let instances = match (&wanted_instance, dependency.schema().instance_column.as_deref()) {
            (None, _) => None,
            (Some(_), Some(column)) => dependency.text_column(column),
            (Some(_), None) => {
                warn!(dependency = %term, "dependency object type has no instance column");
                return unresolved();
            }
        };

        let dependency_keys = join_keys(dependency, &keys);
        let mut lookup: HashMap<Vec<String>, Option<String>> = HashMap::new();
        for (row, key) in dependency_keys.into_iter().enumerate() {
            let Some(key) = key else {
                continue;
            };
            if let (Some(wanted), Some(instances)) = (&wanted_instance, &instances)
                && instances[row].as_deref().map(canonical_text).as_ref() != Some(wanted)
            {
                continue;
            }
            lookup.entry(key).or_insert_with(|| values[row].clone());
        }
        debug!(dependency = %term, keys = ?keys, entries = lookup.len(), "dependency lookup built");

        join_keys(records, &keys)
            .into_iter()
            .map(|key| key.and_then(|key| lookup.get(&key).cloned().flatten()))
            .collect()
    }
}

/// Composite join key per record. A record without a node value has no key;
/// an absent cell value is an empty key component.
fn join_keys(records: &RecordSet, keys: &[String]) -> Vec<Option<Vec<String>>> {
    let node_column = records.schema().node_column.as_deref();
    let columns: Vec<(bool, Vec<Option<String>>)> = keys
        .iter()
        .map(|key| {
            let values = records
                .text_column(key)
                .unwrap_or_else(|| vec![None; records.height()]);
            (Some(key.as_str()) == node_column, values)
        })
        .collect();
    (0..records.height())
        .map(|row| {
            columns
                .iter()
                .map(|(is_node, values)| match &values[row] {
                    Some(value) => Some(canonical_text(value)),
                    None if *is_node => None,
                    None => Some(String::new()),
                })
                .collect()
        })
        .collect()
}

/// `value op dependency` per record. A missing side gives `None`, as does a
/// non-finite result; a present but non-numeric side is an error naming the rule.
pub fn apply_arithmetic(
    rule: &Rule,
    op: ArithmeticOp,
    values: &[Option<String>],
    dependency: &[Option<String>],
) -> Result<Vec<Option<String>>, AuditError> {
    values
        .iter()
        .zip(dependency)
        .map(|(value, dependency)| {
            let (Some(value), Some(dependency)) = (value, dependency) else {
                return Ok(None);
            };
            match (parse_f64(value), parse_f64(dependency)) {
                (Some(lhs), Some(rhs)) => Ok(op.apply_text(lhs, rhs)),
                _ => Err(AuditError::NonNumericOperand {
                    subject: rule.subject(),
                    parameter: rule.parameter.clone(),
                    op: op.symbol().to_string(),
                    value: value.clone(),
                    dependency: dependency.clone(),
                }),
            }
        })
        .collect()
}
