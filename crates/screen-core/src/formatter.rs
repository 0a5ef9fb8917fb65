//! Response formatting utilities

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use crate::error::Result;
use crate::evaluator::Tally;
use crate::rules::Category;
use crate::screener::Screening;

pub trait Formatter: Send + Sync {
    fn format_screening(&self, screening: &Screening) -> Result<String>;
    fn format_error(&self, error: &str) -> String;
}

/// Human-readable table for terminals
pub struct TableFormatter;

impl TableFormatter {
    fn table(screening: &Screening) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(
                ["Metric", "Value"]
                    .into_iter()
                    .chain(Category::ALL.map(Category::name))
                    .map(Cell::new),
            );

        for row in &screening.rows {
            let mut cells = vec![
                Cell::new(row.metric.name()),
                Cell::new(row.value.to_string()).set_alignment(CellAlignment::Right),
            ];
            cells.extend(
                row.marks()
                    .map(|mark| Cell::new(mark.symbol()).set_alignment(CellAlignment::Center)),
            );
            table.add_row(cells);
        }

        table
    }

    fn footer(screening: &Screening) -> String {
        Category::ALL
            .iter()
            .map(|&category| {
                let tally = screening.tally(category);
                format!("{}: {}/{} passed", category, tally.passed, tally.evaluated())
            })
            .collect::<Vec<_>>()
            .join("  |  ")
    }
}

impl Formatter for TableFormatter {
    fn format_screening(&self, screening: &Screening) -> Result<String> {
        Ok(format!(
            "Evaluation for {}\n{}\n{}",
            screening.symbol,
            Self::table(screening),
            Self::footer(screening)
        ))
    }

    fn format_error(&self, error: &str) -> String {
        format!("❌ Error: {}", error)
    }
}

/// Machine-readable output
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    screening: &'a Screening,
    tally: JsonTally,
}

#[derive(Serialize)]
struct JsonTally {
    deep_value: Tally,
    value: Tally,
    growth: Tally,
}

impl Formatter for JsonFormatter {
    fn format_screening(&self, screening: &Screening) -> Result<String> {
        let report = JsonReport {
            screening,
            tally: JsonTally {
                deep_value: screening.tally(Category::DeepValue),
                value: screening.tally(Category::Value),
                growth: screening.tally(Category::Growth),
            },
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({ "error": error }).to_string()
    }
}

/// Output style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub struct FormatterFactory;

impl FormatterFactory {
    pub fn create(format: OutputFormat) -> Box<dyn Formatter> {
        match format {
            OutputFormat::Table => Box::new(TableFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
        }
    }
}
