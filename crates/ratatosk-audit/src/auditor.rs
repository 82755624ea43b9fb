//! Audit orchestration: object type, then instance selector, then band.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use ratatosk_ingest::{RecordSet, RecordStore};
use ratatosk_model::{
    DependencyTerm, Rule, RuleSet, TargetExpression, Verdict, check_column, duplex_of_column,
    eq_column, ref_column, subject_name,
};
use tracing::{debug, info, info_span, warn};

use crate::band::{BAND_COLUMN, BandResolver};
use crate::dependency::{DependencyResolver, apply_arithmetic};
use crate::error::AuditError;
use crate::evaluate::{Evaluation, evaluate, resolve_target};
use crate::result::AuditResult;

/// Target recorded for records of another duplex type.
pub const DUPLEX_PLACEHOLDER: &str = "-";

/// Applies a rule set to a record store.
#[derive(Debug, Clone, Default)]
pub struct Auditor {
    bands: BandResolver,
}

impl Auditor {
    pub fn new(bands: BandResolver) -> Self {
        Self { bands }
    }

    /// Evaluates every rule and returns one verdict table per subject
    /// (`Type` or `Type=instance`).
    ///
    /// The store is only read; tables in the result are copies, so repeated
    /// runs over the same inputs give identical results.
    pub fn audit(&self, rules: &RuleSet, store: &RecordStore) -> Result<AuditResult, AuditError> {
        let span = info_span!("audit", rules = rules.len());
        let _guard = span.enter();
        let start = Instant::now();
        let resolver = DependencyResolver::new(store);

        let mut tables = BTreeMap::new();
        for object_type in rules.index().object_types() {
            let selectors = rules.selectors(object_type);
            if selectors.is_empty() {
                continue;
            }
            let Some(records) = store.get(object_type) else {
                warn!(object_type, "no records loaded for audited object type");
                continue;
            };
            for selector in selectors {
                let subject = subject_name(object_type, selector);
                let mut table = match selector {
                    Some(instance) => records.restrict_to_instance(instance)?,
                    None => records.clone(),
                };
                let subject_rules: Vec<&Rule> = rules.rules_for(object_type, selector).collect();
                debug!(
                    subject = %subject,
                    records = table.height(),
                    rules = subject_rules.len(),
                    "auditing"
                );
                self.audit_table(&mut table, &subject_rules, &resolver)?;
                tables.insert(subject, table);
            }
        }

        info!(
            tables = tables.len(),
            duration_ms = start.elapsed().as_millis(),
            "audit complete"
        );
        Ok(AuditResult::new(tables, rules.clone()))
    }

    fn audit_table(
        &self,
        table: &mut RecordSet,
        rules: &[&Rule],
        resolver: &DependencyResolver<'_>,
    ) -> Result<(), AuditError> {
        let bands = self.bands.resolve(table);
        let partitions = partition_by_band(&bands);
        let unbanded = bands.iter().filter(|band| band.is_none()).count();
        if unbanded > 0 {
            warn!(
                object_type = %table.object_type(),
                records = unbanded,
                "records without a band label are not applicable"
            );
        }
        let duplex = row_duplex(table);

        for rule in rules {
            let raw = table.text_column(&rule.parameter).unwrap_or_else(|| {
                warn!(
                    subject = %rule.subject(),
                    parameter = %rule.parameter,
                    "parameter column missing from records"
                );
                vec![None; table.height()]
            });
            let mut outcome = RuleOutcome::new(raw);
            let mut dependency_cache = HashMap::new();
            for (band, rows) in &partitions {
                evaluate_partition(
                    table,
                    rule,
                    band,
                    rows,
                    resolver,
                    &mut dependency_cache,
                    &mut outcome,
                )?;
            }
            if let Some(own_duplex) = table.schema().duplex.as_deref() {
                outcome.mark_other_duplex(own_duplex, &duplex);
            }
            outcome.write(table, &rule.parameter)?;
        }
        table.set_text_column(BAND_COLUMN, bands)?;
        Ok(())
    }
}

fn evaluate_partition(
    table: &RecordSet,
    rule: &Rule,
    band: &str,
    rows: &[usize],
    resolver: &DependencyResolver<'_>,
    cache: &mut HashMap<String, Vec<Option<String>>>,
    outcome: &mut RuleOutcome,
) -> Result<(), AuditError> {
    if rule.is_informational() {
        let reference = rule.informational_reference();
        for &row in rows {
            let verdict = if outcome.raw[row].is_some() { Verdict::Ok } else { Verdict::Na };
            outcome.assign(row, Some(reference.clone()), verdict, None);
        }
        return Ok(());
    }

    let Some(target) = rule.target_for_band(band) else {
        for &row in rows {
            outcome.assign(row, None, Verdict::Na, None);
        }
        return Ok(());
    };
    if matches!(target, TargetExpression::Wildcard) {
        for &row in rows {
            let evaluation = evaluate(target, outcome.raw[row].as_deref());
            outcome.assign(row, evaluation.reference, evaluation.verdict, None);
        }
        return Ok(());
    }

    // Every arithmetic term combines with the raw value; the last one sets
    // the effective value. The last plain term selects the target.
    let terms = rule.dependency.terms_for_band(band);
    let raw: Vec<Option<String>> = rows.iter().map(|&row| outcome.raw[row].clone()).collect();
    let mut effective: Option<Vec<Option<String>>> = None;
    let mut selector: Option<Vec<Option<String>>> = None;
    for term in terms {
        let values = resolve_cached(resolver, table, term, cache);
        let partition_values: Vec<Option<String>> =
            rows.iter().map(|&row| values[row].clone()).collect();
        match term.op {
            Some(op) => effective = Some(apply_arithmetic(rule, op, &raw, &partition_values)?),
            None => selector = Some(partition_values),
        }
    }
    let transformed = effective.is_some();
    let effective = effective.unwrap_or(raw);
    if target.needs_dependency() && selector.is_none() {
        warn!(
            subject = %rule.subject(),
            parameter = %rule.parameter,
            band,
            "no dependency selects the target for this band"
        );
    }

    for (idx, &row) in rows.iter().enumerate() {
        let dependency_value = selector.as_ref().and_then(|values| values[idx].as_deref());
        let value = effective[idx].as_deref();
        let evaluation = match resolve_target(target, dependency_value) {
            Some(resolved) => {
                let mut evaluation = evaluate(&resolved, value);
                if matches!(resolved.as_ref(), TargetExpression::Wildcard) {
                    evaluation.reference = outcome.raw[row].clone();
                }
                evaluation
            }
            None => Evaluation::not_applicable(None),
        };
        let eq = transformed.then(|| effective[idx].clone()).flatten();
        outcome.assign(row, evaluation.reference, evaluation.verdict, eq);
    }
    Ok(())
}

fn resolve_cached<'c>(
    resolver: &DependencyResolver<'_>,
    table: &RecordSet,
    term: &DependencyTerm,
    cache: &'c mut HashMap<String, Vec<Option<String>>>,
) -> &'c [Option<String>] {
    cache
        .entry(term.column_key())
        .or_insert_with(|| resolver.resolve_term(table, term))
}

/// Row indices per band label. Each record lands in at most one partition;
/// records without a band are left out.
fn partition_by_band(bands: &[Option<String>]) -> BTreeMap<String, Vec<usize>> {
    let mut partitions: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (row, band) in bands.iter().enumerate() {
        if let Some(band) = band {
            partitions.entry(band.clone()).or_default().push(row);
        }
    }
    partitions
}

/// Duplex type of each record: the first cell column holding a value.
fn row_duplex(table: &RecordSet) -> Vec<Option<String>> {
    let columns: Vec<(&str, Vec<Option<String>>)> = table
        .schema()
        .cell_columns
        .iter()
        .filter_map(|column| table.text_column(column).map(|values| (column.as_str(), values)))
        .collect();
    (0..table.height())
        .map(|row| {
            columns
                .iter()
                .find(|(_, values)| values[row].is_some())
                .map(|(column, _)| duplex_of_column(column).to_string())
        })
        .collect()
}

/// Per-record results of one rule, filled partition by partition.
struct RuleOutcome {
    raw: Vec<Option<String>>,
    references: Vec<Option<String>>,
    verdicts: Vec<Option<Verdict>>,
    effective: Vec<Option<String>>,
}

impl RuleOutcome {
    fn new(raw: Vec<Option<String>>) -> Self {
        let height = raw.len();
        Self {
            raw,
            references: vec![None; height],
            verdicts: vec![None; height],
            effective: vec![None; height],
        }
    }

    /// First assignment wins; a record keeps the verdict it was first given.
    fn assign(
        &mut self,
        row: usize,
        reference: Option<String>,
        verdict: Verdict,
        effective: Option<String>,
    ) {
        debug_assert!(self.verdicts[row].is_none(), "record {row} classified twice");
        if self.verdicts[row].is_some() {
            return;
        }
        self.references[row] = reference;
        self.verdicts[row] = Some(verdict);
        self.effective[row] = effective;
    }

    /// Records with no value that belong to another duplex type than the
    /// audited one are not applicable by construction and pass.
    fn mark_other_duplex(&mut self, own_duplex: &str, duplex: &[Option<String>]) {
        for (row, record_duplex) in duplex.iter().enumerate() {
            let other = record_duplex.as_deref().is_some_and(|d| d != own_duplex);
            if other && self.raw[row].is_none() {
                self.references[row] = Some(DUPLEX_PLACEHOLDER.to_string());
                self.verdicts[row] = Some(Verdict::Ok);
            }
        }
    }

    fn write(self, table: &mut RecordSet, parameter: &str) -> Result<(), AuditError> {
        let verdicts = self
            .verdicts
            .into_iter()
            .map(|verdict| Some(verdict.unwrap_or(Verdict::Na).as_str().to_string()))
            .collect();
        table.set_text_column(&ref_column(parameter), self.references)?;
        table.set_text_column(&check_column(parameter), verdicts)?;
        table.set_text_column(&eq_column(parameter), self.effective)?;
        Ok(())
    }
}
