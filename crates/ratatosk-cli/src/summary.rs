//! Console rendering of audit summaries.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use ratatosk_model::VerdictTally;
use ratatosk_report::AuditSummary;

use crate::pipeline::AuditOutcome;

/// One line of the console table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    pub indicator: String,
    pub group: String,
    pub tally: VerdictTally,
}

/// Group-level lines, indicators in summary order.
pub fn summary_lines(summary: &AuditSummary) -> Vec<SummaryLine> {
    summary
        .indicators
        .iter()
        .flat_map(|indicator| {
            indicator.groups.iter().map(|group| SummaryLine {
                indicator: indicator.name.clone(),
                group: group.name.clone(),
                tally: group.tally,
            })
        })
        .collect()
}

pub fn print_summary(outcome: &AuditOutcome) {
    println!("Output: {}", outcome.output_dir.display());
    println!("Report: {}", outcome.report_path.display());
    println!("Summary: {}", outcome.summary_path.display());
    println!(
        "Rules: {}  Object types: {}  Report rows: {}",
        outcome.rules, outcome.object_types, outcome.report_rows
    );
    println!("{}", summary_table(&outcome.summary));
}

pub fn summary_table(summary: &AuditSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Indicator"),
        header_cell("Group"),
        header_cell("OK"),
        header_cell("NOK"),
        header_cell("NA"),
        header_cell("Compliance"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut total = VerdictTally::default();
    for line in summary_lines(summary) {
        total.merge(line.tally);
        table.add_row(vec![
            Cell::new(&line.indicator)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&line.group),
            count_cell(line.tally.ok, Color::Green),
            count_cell(line.tally.nok, Color::Red),
            count_cell(line.tally.na, Color::DarkGrey),
            compliance_cell(line.tally),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new("All groups")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        count_cell(total.ok, Color::Green).add_attribute(Attribute::Bold),
        count_cell(total.nok, Color::Red).add_attribute(Attribute::Bold),
        count_cell(total.na, Color::DarkGrey).add_attribute(Attribute::Bold),
        compliance_cell(total).add_attribute(Attribute::Bold),
    ]);
    table
}

/// `87.5%`, or `-` when nothing was evaluated.
pub fn format_compliance(tally: VerdictTally) -> String {
    match tally.compliance() {
        Some(share) => format!("{:.1}%", share * 100.0),
        None => "-".to_string(),
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}

fn compliance_cell(tally: VerdictTally) -> Cell {
    let text = format_compliance(tally);
    match tally.compliance() {
        Some(share) if share >= 1.0 => Cell::new(text).fg(Color::Green),
        Some(_) => Cell::new(text).fg(Color::Yellow),
        None => Cell::new(text).fg(Color::DarkGrey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compliance_is_ok_share_of_evaluated() {
        assert_eq!(format_compliance(VerdictTally::from_counts(10, 3, 1)), "75.0%");
        assert_eq!(format_compliance(VerdictTally::from_counts(4, 0, 0)), "-");
    }
}
