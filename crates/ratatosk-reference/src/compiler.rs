//! Reference table to [`RuleSet`] compilation.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use ratatosk_common::strip_whitespace;
use ratatosk_model::{
    BandConfig, ConfigError, DEFAULT_GROUP, DEFAULT_INDICATOR, DependencySpec, Rule, RuleSet,
    TargetExpression, subject_name,
};
use tracing::{debug, info, warn};

use crate::groups::ParameterGroups;
use crate::table::{ReferenceTable, field, optional_field};

pub const MO_COLUMN: &str = "MO";
pub const PARAMETER_COLUMN: &str = "Parameter";
pub const TARGET_COLUMN: &str = "Target";
pub const BAND_COLUMN: &str = "Band";
pub const DEPENDENCY_COLUMN: &str = "Dependency";
pub const ACTION_COLUMN: &str = "Action";
pub const REMARK_COLUMN: &str = "Remark";
pub const RULES_COLUMN: &str = "Rules";
pub const INDICATOR_COLUMN: &str = "Parameter Indicator";
pub const GROUP_COLUMN: &str = "Group Parameter";

const MANDATORY_COLUMNS: [&str; 2] = [MO_COLUMN, PARAMETER_COLUMN];

/// Marker used in duplicate-rule errors for the all-band target.
const ALL_BANDS: &str = "*";

/// Output of the rule compiler.
#[derive(Debug, Clone, Default)]
pub struct CompiledReference {
    pub rules: RuleSet,
    pub groups: ParameterGroups,
}

/// Reads and compiles a CSV or spreadsheet reference.
pub fn load_reference(path: &Path, bands: &BandConfig) -> Result<CompiledReference, ConfigError> {
    let table = ReferenceTable::from_path(path)?;
    info!(path = %path.display(), rows = table.rows.len(), "loaded reference table");
    compile_reference(&table, bands)
}

/// Compiles a reference table into rules, merging rows that address the
/// same (object type, instance, parameter) into one rule with per-band targets.
pub fn compile_reference(
    table: &ReferenceTable,
    bands: &BandConfig,
) -> Result<CompiledReference, ConfigError> {
    let missing: Vec<&str> = MANDATORY_COLUMNS
        .iter()
        .copied()
        .filter(|column| !table.has_column(column))
        .collect();
    if !missing.is_empty() {
        return Err(ConfigError::MissingColumns {
            columns: missing.join(", "),
        });
    }

    let band_columns: Vec<String> = bands
        .labels()
        .into_iter()
        .filter(|label| table.has_column(label))
        .collect();
    debug!(band_columns = ?band_columns, "band target columns");

    let mut rules: Vec<Rule> = Vec::new();
    let mut positions: HashMap<(String, Option<String>, String), usize> = HashMap::new();

    for (row_idx, row) in table.rows.iter().enumerate() {
        let (Some(object_cell), Some(parameter_cell)) =
            (field(row, MO_COLUMN), field(row, PARAMETER_COLUMN))
        else {
            warn!(row = row_idx + 2, "skipping reference row without MO or Parameter");
            continue;
        };
        let parameter = strip_whitespace(parameter_cell).to_lowercase();
        let (object_type, instances) = expand_object_cell(object_cell);

        for instance in instances {
            let subject = subject_name(&object_type, instance.as_deref());
            let key = (object_type.clone(), instance.clone(), parameter.clone());
            let position = *positions.entry(key).or_insert_with(|| {
                rules.push(new_rule(&object_type, instance.as_deref(), &parameter, row));
                rules.len() - 1
            });
            let rule = &mut rules[position];

            let dependency_text = optional_field(row, DEPENDENCY_COLUMN).unwrap_or_default();
            let dependency = DependencySpec::parse(dependency_text)
                .map_err(|source| ConfigError::Dependency {
                    subject: subject.clone(),
                    parameter: parameter.clone(),
                    source,
                })?;
            if rule.dependency.is_none() {
                rule.dependency = dependency;
            } else if !dependency.is_none() && dependency != rule.dependency {
                warn!(
                    subject = %subject,
                    parameter = %parameter,
                    kept = %rule.dependency,
                    ignored = %dependency,
                    "conflicting dependencies for the same rule, keeping the first"
                );
            }

            add_row_targets(rule, row, &band_columns, &subject)?;
        }
    }

    for rule in &rules {
        check_dependency_targets(rule)?;
        if rule.targets.is_empty() && !rule.is_informational() {
            warn!(
                subject = %rule.subject(),
                parameter = %rule.parameter,
                "rule has no target for any band; its records will be NA"
            );
        }
    }

    let groups = ParameterGroups::from_rules(&rules);
    let rules = RuleSet::new(rules);
    info!(
        rules = rules.len(),
        object_types = rules.index().len(),
        "compiled reference"
    );
    Ok(CompiledReference { rules, groups })
}

/// `Type=a,b,c` to (`Type`, [a, b, c]); a bare `Type` gives one unscoped entry.
fn expand_object_cell(cell: &str) -> (String, Vec<Option<String>>) {
    let cell = strip_whitespace(cell);
    match cell.split_once('=') {
        Some((object_type, instances)) => {
            let instances: Vec<Option<String>> = instances
                .split(',')
                .filter(|instance| !instance.is_empty())
                .map(|instance| Some(instance.to_string()))
                .collect();
            if instances.is_empty() {
                (object_type.to_string(), vec![None])
            } else {
                (object_type.to_string(), instances)
            }
        }
        None => (cell, vec![None]),
    }
}

fn new_rule(
    object_type: &str,
    instance: Option<&str>,
    parameter: &str,
    row: &BTreeMap<String, String>,
) -> Rule {
    let text = |column: &str| field(row, column).map(str::to_string);
    let note = |column: &str| optional_field(row, column).map(str::to_string);
    Rule {
        action: note(ACTION_COLUMN),
        remark: note(REMARK_COLUMN),
        description: note(RULES_COLUMN),
        indicator: text(INDICATOR_COLUMN).unwrap_or_else(|| DEFAULT_INDICATOR.to_string()),
        group: text(GROUP_COLUMN).unwrap_or_else(|| DEFAULT_GROUP.to_string()),
        ..Rule::new(object_type, instance, parameter)
    }
}

fn add_row_targets(
    rule: &mut Rule,
    row: &BTreeMap<String, String>,
    band_columns: &[String],
    subject: &str,
) -> Result<(), ConfigError> {
    let duplicate = |band: &str| ConfigError::DuplicateRule {
        subject: subject.to_string(),
        parameter: rule.parameter.clone(),
        band: band.to_string(),
    };

    if let Some(text) = field(row, TARGET_COLUMN) {
        let target = parse_target(subject, &rule.parameter, text)?;
        match field(row, BAND_COLUMN) {
            Some(band) => {
                if !rule.targets.insert_band(band, target) {
                    return Err(duplicate(band));
                }
            }
            None => {
                if !rule.targets.set_all_bands(target) {
                    return Err(duplicate(ALL_BANDS));
                }
            }
        }
    }

    for band in band_columns {
        let Some(text) = field(row, band) else {
            continue;
        };
        let target = parse_target(subject, &rule.parameter, text)?;
        if !rule.targets.insert_band(band, target) {
            return Err(duplicate(band));
        }
    }
    Ok(())
}

fn parse_target(subject: &str, parameter: &str, text: &str) -> Result<TargetExpression, ConfigError> {
    TargetExpression::parse(text).map_err(|source| ConfigError::Target {
        subject: subject.to_string(),
        parameter: parameter.to_string(),
        source,
    })
}

/// Piecewise and `=` targets select on a dependency value; without a
/// non-arithmetic dependency term there is nothing to select on.
fn check_dependency_targets(rule: &Rule) -> Result<(), ConfigError> {
    if rule.dependency.has_selector_term() {
        return Ok(());
    }
    match rule.targets.iter().find(|target| target.needs_dependency()) {
        Some(target) => Err(ConfigError::TargetWithoutDependency {
            subject: rule.subject(),
            parameter: rule.parameter.clone(),
            target: target.to_string(),
        }),
        None => Ok(()),
    }
}
