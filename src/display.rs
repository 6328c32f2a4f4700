//! Table and JSON rendering for the report surface.

use std::env;

use anyhow::Result;

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

// Provide a no-op color shim when "colors" feature is disabled
#[cfg(not(feature = "colors"))]
pub mod color_shim {
    use std::fmt::{self, Display, Formatter};

    #[derive(Clone)]
    pub struct Plain(pub String);

    impl Display for Plain {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    pub trait ColorizeShim {
        fn as_str(&self) -> &str;

        fn bold(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn dimmed(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn cyan(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn red(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
    }

    impl ColorizeShim for &str {
        fn as_str(&self) -> &str {
            self
        }
    }
    impl ColorizeShim for String {
        fn as_str(&self) -> &str {
            self.as_str()
        }
    }
    impl ColorizeShim for Plain {
        fn as_str(&self) -> &str {
            &self.0
        }
    }
}

#[cfg(not(feature = "colors"))]
use color_shim::ColorizeShim as OwoColorize;

use crate::filters::{FilterItem, FilterSelection};
use crate::models::CloudResource;

const COLUMNS: [&str; 6] = [
    "Service Name",
    "Location",
    "Resource Group",
    "Date",
    "Cost",
    "Unit Of Measure",
];

const MIN_COLUMN_WIDTH: usize = 8;
const FALLBACK_TERM_WIDTH: usize = 120;

fn color_disabled() -> bool {
    env::var("NO_COLOR").is_ok()
}

fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| w as usize)
        .unwrap_or(FALLBACK_TERM_WIDTH)
}

fn truncate_cell(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(2);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("..");
    out
}

fn row_cells(record: &CloudResource) -> [String; 6] {
    [
        record.service_name.clone(),
        record.location.clone(),
        record.resource_group.clone(),
        record.date.clone(),
        format!("$ {:.2}", record.cost_rounded()),
        record.unit_of_measure.clone(),
    ]
}

/// Column widths sized to content, then shrunk widest-first until the table
/// fits the terminal.
fn column_widths(rows: &[[String; 6]], max_total: usize) -> [usize; 6] {
    let mut widths = [0usize; 6];
    for (i, header) in COLUMNS.iter().enumerate() {
        widths[i] = header.chars().count();
    }
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    // 3 chars of separator between columns
    let overhead = (COLUMNS.len() - 1) * 3;
    loop {
        let total: usize = widths.iter().sum::<usize>() + overhead;
        if total <= max_total {
            break;
        }
        let widest = widths
            .iter()
            .enumerate()
            .max_by_key(|(_, w)| **w)
            .map(|(i, _)| i)
            .unwrap_or(0);
        if widths[widest] <= MIN_COLUMN_WIDTH {
            break;
        }
        widths[widest] -= 1;
    }
    widths
}

fn print_row(cells: &[String; 6], widths: &[usize; 6]) {
    let line = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, w)| format!("{:<width$}", truncate_cell(cell, *w), width = *w))
        .collect::<Vec<_>>()
        .join("   ");
    println!("{}", line.trim_end());
}

/// Render the six-column report table with the page label underneath.
///
/// `loading` takes precedence over emptiness; an empty resolved page prints
/// the "No data found" fallback.
pub fn print_report_table(rows: &[CloudResource], loading: bool, page_label: &str) {
    let cells: Vec<[String; 6]> = rows.iter().map(row_cells).collect();
    let widths = column_widths(&cells, term_width());

    let header: [String; 6] = COLUMNS.map(|c| c.to_string());
    if color_disabled() {
        print_row(&header, &widths);
    } else {
        let line = header
            .iter()
            .zip(widths.iter())
            .map(|(cell, w)| format!("{}", format!("{cell:<width$}", width = *w).bold()))
            .collect::<Vec<_>>()
            .join("   ");
        println!("{}", line);
    }

    if loading {
        println!("Loading...");
    } else if cells.is_empty() {
        println!("No data found");
    } else {
        for row in &cells {
            print_row(row, &widths);
        }
    }

    if !page_label.is_empty() {
        if color_disabled() {
            println!("{page_label}");
        } else {
            println!("{}", page_label.dimmed());
        }
    }
}

/// Machine-readable report output
pub fn print_report_json(
    rows: &[CloudResource],
    filter: &FilterSelection,
    page_label: &str,
    total: Option<usize>,
) -> Result<()> {
    let value = serde_json::json!({
        "filter": filter.describe(),
        "page_label": page_label,
        "total_records": total,
        "rows": rows,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Grouped filter list, headers flush left and entries indented
pub fn print_filter_items(items: &[FilterItem]) {
    if items.is_empty() {
        println!("Nothing found.");
        return;
    }
    for item in items {
        if item.disabled {
            if color_disabled() {
                println!("{}", item.name);
            } else {
                println!("{}", item.name.bold());
            }
        } else {
            println!("  {}", item.name);
        }
    }
}

/// Machine-readable filter list
pub fn print_filter_items_json(items: &[FilterItem]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(items)?);
    Ok(())
}

/// Error line for a failed query, on stderr
pub fn print_query_error(message: &str) {
    if color_disabled() {
        eprintln!("query failed: {message}");
    } else {
        eprintln!("{} {}", "query failed:".red(), message);
    }
}
