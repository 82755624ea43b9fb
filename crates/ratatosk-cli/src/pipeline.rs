//! Audit, query and export stages shared by the subcommands.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use ratatosk_audit::{Auditor, BandResolver};
use ratatosk_ingest::{
    CmCollector, FOLDER_COLUMN, FilterBy, LoadRequest, RecordFilter, RecordSet, RecordSource,
    RecordStore, SITE_COLUMN, load_object_list,
};
use ratatosk_model::{GlobalConfig, SchemaConfig};
use ratatosk_reference::{cmedit_query, load_reference};
use ratatosk_report::{
    AuditSummary, simple_report, summarize_groups, write_simple_report, write_summary_json,
};
use tracing::{info, info_span};

pub const SIMPLE_REPORT_FILE: &str = "simple_report.csv";
pub const SUMMARY_FILE: &str = "summary.json";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DATE_FORMAT: &str = "%Y%m%d";

/// Today's export folder name.
pub fn today() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// Export location and record restrictions, after defaults from the config.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub cm_folder: PathBuf,
    pub date: String,
    pub sub_folders: Vec<String>,
    pub object_list: Option<PathBuf>,
    pub filter_by: FilterBy,
}

impl CollectorOptions {
    /// Fills unset options from `config`; the date falls back to today.
    pub fn resolve(
        cm_folder: Option<PathBuf>,
        sub_folders: Vec<String>,
        date: Option<String>,
        config: &GlobalConfig,
    ) -> Result<Self> {
        let cm_folder = cm_folder
            .or_else(|| config.cm_folder.clone())
            .ok_or_else(|| {
                anyhow!("no export folder: pass --cm-folder or set cm_folder in the config")
            })?;
        let sub_folders = if sub_folders.is_empty() {
            config.enm_list.clone()
        } else {
            sub_folders
        };
        let date = date.unwrap_or_else(today);
        NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .with_context(|| format!("invalid export date `{date}`, expected YYYYMMDD"))?;
        Ok(Self {
            cm_folder,
            date,
            sub_folders,
            object_list: None,
            filter_by: FilterBy::default(),
        })
    }

    #[must_use]
    pub fn with_object_list(mut self, path: Option<PathBuf>, filter_by: FilterBy) -> Self {
        self.object_list = path;
        self.filter_by = filter_by;
        self
    }

    pub fn collector(&self, conventions: SchemaConfig) -> CmCollector {
        CmCollector::new(
            &self.cm_folder,
            &self.date,
            self.sub_folders.clone(),
            conventions,
        )
    }

    /// Filter from the object list, or an empty filter without one.
    pub fn record_filter(&self, conventions: &SchemaConfig) -> Result<RecordFilter> {
        match &self.object_list {
            Some(path) => load_object_list(path, self.filter_by, conventions)
                .with_context(|| format!("load object list {}", path.display())),
            None => Ok(RecordFilter::default()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub reference: PathBuf,
    pub config: GlobalConfig,
    pub collector: CollectorOptions,
    pub output_dir: PathBuf,
}

/// Output directory from the flag, the config, or `./output`.
pub fn output_dir(flag: Option<PathBuf>, config: &GlobalConfig) -> PathBuf {
    flag.or_else(|| config.output_folder.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub output_dir: PathBuf,
    pub report_path: PathBuf,
    pub summary_path: PathBuf,
    pub rules: usize,
    pub object_types: usize,
    pub report_rows: usize,
    pub summary: AuditSummary,
}

/// Compiles the reference, loads every referenced object type, evaluates and
/// writes the simple report plus the JSON summary.
pub fn run_audit(options: &AuditOptions) -> Result<AuditOutcome> {
    let span = info_span!("audit", reference = %options.reference.display());
    let _guard = span.enter();
    let start = Instant::now();

    let bands = options.config.band_config();
    let compiled = load_reference(&options.reference, &bands)
        .with_context(|| format!("compile reference {}", options.reference.display()))?;

    let conventions = options.config.schema_config();
    let filter = options.collector.record_filter(&conventions)?;
    let collector = options.collector.collector(conventions);
    let store = RecordStore::load_all(&collector, compiled.rules.index(), &filter)
        .context("load configuration records")?;

    let mut result = Auditor::new(BandResolver::new(bands))
        .audit(&compiled.rules, &store)
        .context("evaluate rules")?;
    result.drop_transient();

    fs::create_dir_all(&options.output_dir)
        .with_context(|| format!("create {}", options.output_dir.display()))?;
    let rows = simple_report(&result);
    let report_path = options.output_dir.join(SIMPLE_REPORT_FILE);
    write_simple_report(&report_path, &rows)?;
    let summary = summarize_groups(&result, &compiled.groups);
    let summary_path = options.output_dir.join(SUMMARY_FILE);
    write_summary_json(&summary_path, &summary)?;

    info!(
        rules = compiled.rules.len(),
        object_types = store.len(),
        report_rows = rows.len(),
        duration_ms = start.elapsed().as_millis(),
        "audit complete"
    );
    Ok(AuditOutcome {
        output_dir: options.output_dir.clone(),
        report_path,
        summary_path,
        rules: compiled.rules.len(),
        object_types: store.len(),
        report_rows: rows.len(),
        summary,
    })
}

/// Bulk-export query for every object type and parameter the reference reads.
pub fn build_query(reference: &Path, config: &GlobalConfig, nodes: &[String]) -> Result<String> {
    let compiled = load_reference(reference, &config.band_config())
        .with_context(|| format!("compile reference {}", reference.display()))?;
    Ok(cmedit_query(compiled.rules.index(), nodes))
}

/// Layout of an exported object type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportLayout {
    /// One row per record, one column per parameter.
    #[default]
    Wide,
    /// One row per (record, parameter): node, MO path, parameter, value.
    Long,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub object_type: String,
    pub parameters: Vec<String>,
    pub config: GlobalConfig,
    pub collector: CollectorOptions,
    pub output: PathBuf,
    pub layout: ExportLayout,
}

/// Collects one object type and writes it as CSV. Returns the number of rows written.
pub fn export_object(options: &ExportOptions) -> Result<usize> {
    let conventions = options.config.schema_config();
    let filter = options.collector.record_filter(&conventions)?;
    let collector = options.collector.collector(conventions);
    let parameters: Vec<String> = options
        .parameters
        .iter()
        .map(String::as_str)
        .map(str::to_lowercase)
        .collect();
    let records = collector
        .load_records(&LoadRequest {
            object_type: &options.object_type,
            instances: None,
            parameters: &parameters,
            filter: &filter,
        })
        .with_context(|| format!("collect {}", options.object_type))?;

    if let Some(parent) = options.output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = File::create(&options.output)
        .with_context(|| format!("create {}", options.output.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    let rows = match options.layout {
        ExportLayout::Wide => write_wide(&mut writer, &records)?,
        ExportLayout::Long => write_long(&mut writer, &records, &parameters)?,
    };
    writer
        .flush()
        .with_context(|| format!("write {}", options.output.display()))?;
    info!(
        object_type = %options.object_type,
        path = %options.output.display(),
        rows,
        "exported records"
    );
    Ok(rows)
}

fn write_wide<W: std::io::Write>(writer: &mut csv::Writer<W>, records: &RecordSet) -> Result<usize> {
    let names = records.column_names();
    writer.write_record(&names).context("write header")?;
    let columns: Vec<Vec<Option<String>>> = names
        .iter()
        .map(|name| records.text_column(name).unwrap_or_default())
        .collect();
    for row in 0..records.height() {
        let values = columns
            .iter()
            .map(|column| column.get(row).cloned().flatten().unwrap_or_default());
        writer.write_record(values).context("write record")?;
    }
    Ok(records.height())
}

fn write_long<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    records: &RecordSet,
    parameters: &[String],
) -> Result<usize> {
    let schema = records.schema();
    let node_column = schema.node_column.clone().unwrap_or_default();
    writer
        .write_record([node_column.as_str(), "MO", "parameter", "value"])
        .context("write header")?;

    let skip: BTreeSet<String> = schema
        .identifier_columns()
        .into_iter()
        .chain([SITE_COLUMN.to_string(), FOLDER_COLUMN.to_string()])
        .collect();
    let value_columns: Vec<String> = records
        .column_names()
        .into_iter()
        .filter(|name| !skip.contains(name))
        .filter(|name| parameters.is_empty() || parameters.contains(name))
        .collect();
    let nodes = records.text_column(&node_column).unwrap_or_default();
    let values: Vec<Vec<Option<String>>> = value_columns
        .iter()
        .map(|name| records.text_column(name).unwrap_or_default())
        .collect();

    let mut written = 0;
    for row in 0..records.height() {
        let node = nodes.get(row).cloned().flatten().unwrap_or_default();
        let path = records.mo_path(row);
        for (name, column) in value_columns.iter().zip(&values) {
            let value = column.get(row).cloned().flatten().unwrap_or_default();
            writer
                .write_record([node.as_str(), path.as_str(), name.as_str(), value.as_str()])
                .context("write record")?;
            written += 1;
        }
    }
    Ok(written)
}
