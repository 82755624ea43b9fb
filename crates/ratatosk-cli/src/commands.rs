use anyhow::{Context, Result};
use ratatosk_cli::pipeline::{
    AuditOptions, AuditOutcome, CollectorOptions, ExportLayout, ExportOptions, build_query,
    export_object, output_dir, run_audit,
};
use ratatosk_ingest::FilterBy;
use ratatosk_model::GlobalConfig;
use tracing::info;

use crate::cli::{AuditArgs, CollectorArgs, GetCmArgs, QueryArgs};

pub fn run_audit_command(args: &AuditArgs) -> Result<AuditOutcome> {
    let config = load_config(&args.collector)?;
    let collector = collector_options(&args.collector, &config)?;
    let options = AuditOptions {
        reference: args.reference.clone(),
        output_dir: output_dir(args.output.clone(), &config),
        collector,
        config,
    };
    run_audit(&options)
}

pub fn run_query(args: &QueryArgs) -> Result<()> {
    let config = GlobalConfig::load(args.config.as_deref()).context("load config")?;
    let query = build_query(&args.reference, &config, &args.nodes)?;
    println!("{query}");
    Ok(())
}

pub fn run_get_cm(args: &GetCmArgs) -> Result<()> {
    let config = load_config(&args.collector)?;
    let collector = collector_options(&args.collector, &config)?;
    let options = ExportOptions {
        object_type: args.object_type.clone(),
        parameters: args.parameters.clone(),
        collector,
        config,
        output: args.output.clone(),
        layout: if args.long {
            ExportLayout::Long
        } else {
            ExportLayout::Wide
        },
    };
    let rows = export_object(&options)?;
    info!(rows, "get-cm complete");
    println!("Wrote {rows} rows to {}", options.output.display());
    Ok(())
}

fn load_config(args: &CollectorArgs) -> Result<GlobalConfig> {
    GlobalConfig::load(args.config.as_deref()).context("load config")
}

fn collector_options(args: &CollectorArgs, config: &GlobalConfig) -> Result<CollectorOptions> {
    let options = CollectorOptions::resolve(
        args.cm_folder.clone(),
        args.sub_folders.clone(),
        args.date.clone(),
        config,
    )?;
    let filter_by = args.filter_by.map(FilterBy::from).unwrap_or_default();
    Ok(options.with_object_list(args.object_list.clone(), filter_by))
}
