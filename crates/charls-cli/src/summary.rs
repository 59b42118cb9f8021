use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use charls_impute::{FitOutcome, GenerateOutcome};
use charls_model::{Classification, MissingDataSummary, VariableCategory, Vocabulary};

use crate::types::{AnalyzeResult, RunResult};
use charls_cli::scaffold::InitReport;

pub fn print_run_summary(result: &RunResult) {
    println!("Input: {}", result.input.display());
    println!("Output: {}", result.output_dir.display());
    if let Some(classification) = &result.classification {
        print_classification(classification);
    }
    if let Some(missing) = &result.missing {
        print_missing(missing);
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Result"),
        header_cell("Detail"),
    ]);
    apply_table_style(&mut table);
    match &result.fit {
        FitOutcome::Fitted { target, family } => table.add_row(vec![
            Cell::new("fit"),
            ok_cell(),
            Cell::new(format!("{target} ({family})")),
        ]),
        FitOutcome::Failed { target, reason } => table.add_row(vec![
            Cell::new("fit"),
            failed_cell(),
            Cell::new(format!("{target}: {reason}")),
        ]),
    };
    match &result.generate {
        Some(GenerateOutcome::Generated { count }) => table.add_row(vec![
            Cell::new("generate"),
            ok_cell(),
            Cell::new(format!("{count} datasets")),
        ]),
        Some(GenerateOutcome::Failed { reason }) => table.add_row(vec![
            Cell::new("generate"),
            failed_cell(),
            Cell::new(reason),
        ]),
        None => table.add_row(vec![Cell::new("generate"), dim_cell("-"), dim_cell("skipped")]),
    };
    match &result.persisted {
        Some(report) => table.add_row(vec![
            Cell::new("persist"),
            ok_cell(),
            Cell::new(format!(
                "{} datasets, models in {}",
                report.datasets.len(),
                report.models.display()
            )),
        ]),
        None => table.add_row(vec![Cell::new("persist"), dim_cell("-"), dim_cell("skipped")]),
    };
    println!("{table}");

    if let Some(reason) = &result.summary.last_failure {
        eprintln!("Errors:");
        eprintln!("- {reason}");
    }
}

pub fn print_analysis(result: &AnalyzeResult) {
    println!("Input: {}", result.input.display());
    if let Some(table) = &result.summary.table {
        println!("Rows: {}  Columns: {}", table.rows, table.columns);
        if let Some(subjects) = table.subjects {
            println!("Subjects: {subjects}");
        }
        if let Some(waves) = &table.waves {
            println!("Waves: {}", waves.join(", "));
        }
    }
    print_classification(&result.classification);
    print_missing(&result.missing);
}

pub fn print_init(report: &InitReport) {
    for dir in &report.created_dirs {
        println!("created {}", dir.display());
    }
    if report.config_written {
        println!("wrote {}", report.config.display());
    } else {
        println!(
            "kept existing {} (use --force to overwrite)",
            report.config.display()
        );
    }
}

pub fn print_vocabulary(vocabulary: &Vocabulary) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Category"), header_cell("Variables")]);
    apply_table_style(&mut table);
    for category in VariableCategory::ALL {
        table.add_row(vec![
            category_cell(category),
            names_cell(vocabulary.list(category)),
        ]);
    }
    println!("{table}");
    if !vocabulary.ordinal_levels.is_empty() {
        let mut levels = Table::new();
        levels.set_header(vec![header_cell("Ordinal"), header_cell("Levels (low to high)")]);
        apply_table_style(&mut levels);
        for (name, order) in &vocabulary.ordinal_levels {
            levels.add_row(vec![Cell::new(name), Cell::new(order.join(" < "))]);
        }
        println!("{levels}");
    }
}

fn print_classification(classification: &Classification) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Category"),
        header_cell("Count"),
        header_cell("Columns"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for category in VariableCategory::ALL {
        let members = classification.members(category);
        table.add_row(vec![
            category_cell(category),
            count_cell(members.len(), Color::Blue),
            names_cell(members),
        ]);
    }
    println!("{table}");
}

fn print_missing(missing: &MissingDataSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Missing"),
        header_cell("Percent"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for column in &missing.columns {
        table.add_row(vec![
            Cell::new(&column.name),
            count_cell(column.n_missing, Color::Yellow),
            Cell::new(format!("{:.1}%", column.pct_missing)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        count_cell(missing.total_missing, Color::Yellow).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");
    println!(
        "Complete cases: {} of {} rows ({} incomplete)",
        missing.complete_cases,
        missing.row_count,
        missing.incomplete_cases()
    );
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
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

fn category_cell(category: VariableCategory) -> Cell {
    Cell::new(category.as_str())
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn names_cell(names: &[String]) -> Cell {
    if names.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(names.join(", "))
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn ok_cell() -> Cell {
    Cell::new("✓")
        .fg(Color::Green)
        .add_attribute(Attribute::Bold)
}

fn failed_cell() -> Cell {
    Cell::new("✗")
        .fg(Color::Red)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
