use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use ratatosk_audit::AuditResult;
use ratatosk_model::{Verdict, check_column, ref_column};
use serde::Serialize;
use tracing::info;

/// One (record, parameter) line of the flat report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleReportRow {
    pub mecontext: String,
    #[serde(rename = "MO Class")]
    pub mo_class: String,
    #[serde(rename = "MO")]
    pub mo: String,
    #[serde(rename = "Parameter")]
    pub parameter: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Recommended Setting")]
    pub recommended: String,
    #[serde(rename = "Status")]
    pub status: String,
}

/// Flattens every verdict table, subjects in order and parameters in rule order.
pub fn simple_report(result: &AuditResult) -> Vec<SimpleReportRow> {
    let mut rows = Vec::new();
    for (subject, table) in result.iter() {
        let node_column = table.schema().node_column.as_deref();
        let nodes = node_column.and_then(|column| table.text_column(column));
        let paths: Vec<String> = (0..table.height()).map(|row| table.mo_path(row)).collect();
        for rule in result.rules().rules().iter().filter(|rule| rule.subject() == subject) {
            let values = table.text_column(&rule.parameter);
            let references = table.text_column(&ref_column(&rule.parameter));
            let verdicts = table.text_column(&check_column(&rule.parameter));
            let cell = |column: &Option<Vec<Option<String>>>, row: usize| {
                column
                    .as_ref()
                    .and_then(|values| values[row].clone())
                    .unwrap_or_default()
            };
            for (row, path) in paths.iter().enumerate() {
                let status = cell(&verdicts, row);
                rows.push(SimpleReportRow {
                    mecontext: cell(&nodes, row),
                    mo_class: rule.object_type.clone(),
                    mo: path.clone(),
                    parameter: rule.parameter.clone(),
                    value: cell(&values, row),
                    recommended: cell(&references, row),
                    status: if status.is_empty() {
                        Verdict::Na.to_string()
                    } else {
                        status
                    },
                });
            }
        }
    }
    rows
}

pub fn write_simple_report_to<W: Write>(writer: W, rows: &[SimpleReportRow]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row).context("serialize report row")?;
    }
    csv.flush().context("flush report")?;
    Ok(())
}

pub fn write_simple_report(path: &Path, rows: &[SimpleReportRow]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_simple_report_to(file, rows).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), rows = rows.len(), "wrote simple report");
    Ok(())
}
