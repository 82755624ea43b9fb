//! Audit output: one verdict table per subject plus the rules behind it.

use std::collections::BTreeMap;

use ratatosk_ingest::RecordSet;
use ratatosk_model::{RuleSet, Verdict, VerdictTally, check_column, eq_column};

use crate::band::BAND_COLUMN;

/// Counts a verdict column. Anything that is neither `OK` nor `NOK`,
/// including a missing value, counts as `NA`.
pub fn summarize<S: AsRef<str>>(verdicts: &[Option<S>]) -> VerdictTally {
    let mut ok = 0;
    let mut nok = 0;
    for verdict in verdicts.iter().flatten() {
        match verdict.as_ref().parse::<Verdict>() {
            Ok(Verdict::Ok) => ok += 1,
            Ok(Verdict::Nok) => nok += 1,
            _ => {}
        }
    }
    VerdictTally::from_counts(verdicts.len(), ok, nok)
}

#[derive(Debug, Clone, Default)]
pub struct AuditResult {
    tables: BTreeMap<String, RecordSet>,
    rules: RuleSet,
}

impl AuditResult {
    pub fn new(tables: BTreeMap<String, RecordSet>, rules: RuleSet) -> Self {
        Self { tables, rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Verdict table of a subject (`Type` or `Type=instance`).
    pub fn table(&self, subject: &str) -> Option<&RecordSet> {
        self.tables.get(subject)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordSet)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Verdict column of one parameter, `None` when the subject or column is unknown.
    pub fn verdicts(&self, subject: &str, parameter: &str) -> Option<Vec<Option<String>>> {
        self.table(subject)?.text_column(&check_column(parameter))
    }

    pub fn summarize(&self, subject: &str, parameter: &str) -> Option<VerdictTally> {
        self.verdicts(subject, parameter)
            .map(|verdicts| summarize(&verdicts))
    }

    /// Drops the `<param>_eq` and band columns used during evaluation.
    pub fn drop_transient(&mut self) {
        for (subject, table) in &mut self.tables {
            let transient: Vec<String> = self
                .rules
                .rules()
                .iter()
                .filter(|rule| rule.subject() == *subject)
                .map(|rule| eq_column(&rule.parameter))
                .collect();
            table.drop_columns(|name| name == BAND_COLUMN || transient.iter().any(|t| t == name));
        }
    }

    pub fn into_parts(self) -> (BTreeMap<String, RecordSet>, RuleSet) {
        (self.tables, self.rules)
    }
}
