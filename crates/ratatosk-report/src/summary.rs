use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use ratatosk_audit::{AuditResult, summarize};
use ratatosk_ingest::RecordSet;
use ratatosk_model::{Verdict, VerdictTally, check_column};
use ratatosk_reference::{ParameterGroup, ParameterGroups};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSummary {
    pub subject: String,
    pub parameter: String,
    #[serde(flatten)]
    pub tally: VerdictTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub name: String,
    #[serde(flatten)]
    pub tally: VerdictTally,
    pub parameters: Vec<ParameterSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSummary {
    pub name: String,
    #[serde(flatten)]
    pub tally: VerdictTally,
    pub groups: Vec<GroupSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditSummary {
    pub indicators: Vec<IndicatorSummary>,
}

impl AuditSummary {
    /// Sum of the parameter tallies.
    pub fn parameter_total(&self) -> VerdictTally {
        let mut total = VerdictTally::default();
        for parameter in self.parameters() {
            total.merge(parameter.tally);
        }
        total
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ParameterSummary> {
        self.indicators
            .iter()
            .flat_map(|indicator| indicator.groups.iter())
            .flat_map(|group| group.parameters.iter())
    }
}

/// Record identity used to combine parameters of different subjects:
/// node plus the first cell identifier, empty for node-level records.
type RecordKey = (String, String);

/// Tallies verdicts per parameter, then per group and indicator.
///
/// A record is NOK for a group when any member parameter is NOK, OK when
/// none is NOK and at least one is OK, and NA otherwise. Indicators combine
/// their groups the same way.
pub fn summarize_groups(result: &AuditResult, groups: &ParameterGroups) -> AuditSummary {
    let mut indicators = Vec::new();
    for indicator in &groups.indicators {
        let mut indicator_records: BTreeMap<RecordKey, Verdict> = BTreeMap::new();
        let mut group_summaries = Vec::new();
        for group in &indicator.groups {
            let (summary, records) = summarize_group(result, group);
            for (key, verdict) in records {
                combine(&mut indicator_records, key, verdict);
            }
            group_summaries.push(summary);
        }
        indicators.push(IndicatorSummary {
            name: indicator.name.clone(),
            tally: indicator_records.into_values().collect(),
            groups: group_summaries,
        });
    }
    AuditSummary { indicators }
}

fn summarize_group(result: &AuditResult, group: &ParameterGroup) -> (GroupSummary, BTreeMap<RecordKey, Verdict>) {
    let mut records: BTreeMap<RecordKey, Verdict> = BTreeMap::new();
    let mut parameters = Vec::new();
    for member in &group.members {
        let table = result.table(&member.subject);
        let verdicts = table
            .and_then(|table| table.text_column(&check_column(&member.parameter)))
            .unwrap_or_default();
        if let Some(table) = table {
            let keys = record_keys(table);
            for (key, verdict) in keys.into_iter().zip(&verdicts) {
                let verdict = verdict
                    .as_deref()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(Verdict::Na);
                combine(&mut records, key, verdict);
            }
        }
        parameters.push(ParameterSummary {
            subject: member.subject.clone(),
            parameter: member.parameter.clone(),
            tally: summarize(&verdicts),
        });
    }
    let summary = GroupSummary {
        name: group.name.clone(),
        tally: records.values().copied().collect(),
        parameters,
    };
    (summary, records)
}

/// NOK beats OK beats NA.
fn combine(records: &mut BTreeMap<RecordKey, Verdict>, key: RecordKey, verdict: Verdict) {
    let slot = records.entry(key).or_insert(Verdict::Na);
    *slot = match (*slot, verdict) {
        (Verdict::Nok, _) | (_, Verdict::Nok) => Verdict::Nok,
        (Verdict::Ok, _) | (_, Verdict::Ok) => Verdict::Ok,
        _ => Verdict::Na,
    };
}

fn record_keys(table: &RecordSet) -> Vec<RecordKey> {
    let schema = table.schema();
    let nodes = schema
        .node_column
        .as_deref()
        .and_then(|column| table.text_column(column));
    let cells: Vec<Vec<Option<String>>> = schema
        .cell_columns
        .iter()
        .filter_map(|column| table.text_column(column))
        .collect();
    (0..table.height())
        .map(|row| {
            let node = nodes
                .as_ref()
                .and_then(|values| values[row].clone())
                .unwrap_or_default();
            let cell = cells
                .iter()
                .find_map(|values| values[row].clone())
                .unwrap_or_default();
            (node, cell)
        })
        .collect()
}

pub fn write_summary_json(path: &Path, summary: &AuditSummary) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), indicators = summary.indicators.len(), "wrote summary");
    Ok(())
}
