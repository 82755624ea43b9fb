//! CLI argument definitions for the `ratatosk` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use ratatosk_ingest::FilterBy;

#[derive(Parser)]
#[command(
    name = "ratatosk",
    version,
    about = "Audit exported radio network configuration against a reference",
    long_about = "Audit exported radio network configuration against a reference.\n\n\
                  Rules are compiled from a CSV or spreadsheet reference table, configuration \
                  records are read from dated CSV exports and every record gets an OK/NOK/NA verdict."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile the reference, load exports, evaluate and write reports.
    Audit(AuditArgs),

    /// Print the bulk-export query covering every parameter the reference reads.
    Query(QueryArgs),

    /// Collect one object type from the exports and write it as CSV.
    GetCm(GetCmArgs),
}

/// Where configuration exports are read from.
#[derive(Args)]
pub struct CollectorArgs {
    /// Global configuration file (JSON).
    #[arg(long = "config", value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Root folder of the exports (default: `cm_folder` from the config).
    #[arg(long = "cm-folder", value_name = "DIR")]
    pub cm_folder: Option<PathBuf>,

    /// Sub folder to collect from; repeat for several (default: `enm_list`).
    #[arg(long = "subfolder", value_name = "NAME")]
    pub sub_folders: Vec<String>,

    /// Export date folder, YYYYMMDD (default: today).
    #[arg(long = "date", value_name = "YYYYMMDD")]
    pub date: Option<String>,

    /// Inventory CSV restricting which records are read.
    #[arg(long = "object-list", value_name = "CSV")]
    pub object_list: Option<PathBuf>,

    /// Dimension the object list restricts by (default: node).
    #[arg(long = "filter-by", value_enum, requires = "object_list")]
    pub filter_by: Option<FilterByArg>,
}

#[derive(Args)]
pub struct AuditArgs {
    /// Reference table (CSV, or a spreadsheet whose first sheet is read).
    #[arg(long = "reference", value_name = "FILE")]
    pub reference: PathBuf,

    #[command(flatten)]
    pub collector: CollectorArgs,

    /// Output directory (default: `output_folder` from the config, else `./output`).
    #[arg(long = "output", value_name = "DIR")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Reference table (CSV, or a spreadsheet whose first sheet is read).
    #[arg(long = "reference", value_name = "FILE")]
    pub reference: PathBuf,

    /// Global configuration file (JSON).
    #[arg(long = "config", value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Node to query; repeat for several (default: every node).
    #[arg(long = "node", value_name = "NAME")]
    pub nodes: Vec<String>,
}

#[derive(Args)]
pub struct GetCmArgs {
    /// Object type to collect, e.g. EUtranCellFDD.
    #[arg(long = "object-type", value_name = "MO")]
    pub object_type: String,

    #[command(flatten)]
    pub collector: CollectorArgs,

    /// Parameter to keep; repeat for several (default: every column).
    #[arg(long = "param", value_name = "NAME")]
    pub parameters: Vec<String>,

    /// Output CSV path.
    #[arg(long = "output", value_name = "CSV")]
    pub output: PathBuf,

    /// Write one row per (record, parameter) instead of a wide table.
    #[arg(long = "long")]
    pub long: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FilterByArg {
    Node,
    Site,
    Cell,
}

impl From<FilterByArg> for FilterBy {
    fn from(value: FilterByArg) -> Self {
        match value {
            FilterByArg::Node => FilterBy::Node,
            FilterByArg::Site => FilterBy::Site,
            FilterByArg::Cell => FilterBy::Cell,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
