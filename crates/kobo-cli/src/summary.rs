use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::types::RunSummary;

pub fn print_summary(result: &RunSummary) {
    println!("Config: {}", result.config.display());
    println!("Endpoint: {}", result.endpoint);

    let mut table = Table::new();
    table.set_header(vec![header_cell("Records"), header_cell("Count")]);
    apply_table_style(&mut table);
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table.add_row(vec![Cell::new("Parent rows"), Cell::new(result.rows)]);
    table.add_row(vec![
        Cell::new("Submitted"),
        count_cell(result.succeeded, Color::Green),
    ]);
    table.add_row(vec![Cell::new("Failed"), count_cell(result.failed, Color::Red)]);
    table.add_row(vec![
        Cell::new("Skipped repeat groups"),
        count_cell(result.issues.len(), Color::Yellow),
    ]);
    println!("{table}");

    if !result.issues.is_empty() {
        print_issue_table(&result.issues);
    }
    if let Some(path) = &result.failure_log {
        println!("Failure log: {}", path.display());
    }
    if !result.errors.is_empty() {
        eprintln!("Errors:");
        for error in &result.errors {
            eprintln!("- {error}");
        }
    }
}

fn print_issue_table(issues: &[String]) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Skipped repeat group")]);
    apply_table_style(&mut table);
    for issue in issues {
        table.add_row(vec![Cell::new(issue).fg(Color::Yellow)]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        Cell::new(count).add_attribute(Attribute::Dim)
    } else {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    }
}
