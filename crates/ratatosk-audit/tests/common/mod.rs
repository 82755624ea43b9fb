#![allow(dead_code)]

use polars::prelude::DataFrame;
use ratatosk_audit::{AuditResult, Auditor, BandResolver};
use ratatosk_ingest::{RecordSet, RecordStore, text_frame};
use ratatosk_model::{
    BandConfig, DependencySpec, Rule, RuleSet, SchemaConfig, TargetExpression,
};

pub fn make_df(columns: &[(&str, &[Option<&str>])]) -> DataFrame {
    text_frame(
        columns
            .iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.iter().map(|v| v.map(str::to_string)).collect(),
                )
            })
            .collect(),
    )
    .expect("frame")
}

pub fn records(object_type: &str, columns: &[(&str, &[Option<&str>])]) -> RecordSet {
    RecordSet::new(object_type, &make_df(columns), &SchemaConfig::default()).expect("records")
}

pub fn target(text: &str) -> TargetExpression {
    TargetExpression::parse(text).expect("target")
}

/// Rule with one target for every band.
pub fn rule(object_type: &str, instance: Option<&str>, parameter: &str, target_text: &str, dependency: &str) -> Rule {
    let mut rule = Rule {
        dependency: DependencySpec::parse(dependency).expect("dependency"),
        ..Rule::new(object_type, instance, parameter)
    };
    rule.targets.set_all_bands(target(target_text));
    rule
}

pub fn store(sets: Vec<RecordSet>) -> RecordStore {
    let mut store = RecordStore::new();
    for set in sets {
        store.insert(set);
    }
    store
}

pub fn run(rules: Vec<Rule>, sets: Vec<RecordSet>) -> AuditResult {
    Auditor::new(BandResolver::new(BandConfig::default()))
        .audit(&RuleSet::new(rules), &store(sets))
        .expect("audit")
}

pub fn column(result: &AuditResult, subject: &str, name: &str) -> Vec<Option<String>> {
    result
        .table(subject)
        .expect("subject table")
        .text_column(name)
        .expect("column")
}

pub fn checks(result: &AuditResult, subject: &str, parameter: &str) -> Vec<String> {
    column(result, subject, &format!("{parameter}_check"))
        .into_iter()
        .map(|verdict| verdict.expect("every record has a verdict"))
        .collect()
}
