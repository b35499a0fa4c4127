//! Terminal output helpers: quoted fields and row highlighting.

use super::report::ReportRow;
use colored::Colorize;
use std::fmt::Display;

/// Quote a value and right-align it to `width`. Longer values are not cut.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
///
/// # Returns
/// A quoted, right-aligned string
pub fn format_field<T: Display>(value: T, width: usize) -> String {
    let quoted = format!("\"{value}\"");
    if quoted.len() >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// Colour a printed row: free blocks green, full prefixes red, parked
/// prefixes yellow.
///
/// # Arguments
/// * `row` - The report row the line was built from
/// * `line` - The formatted CSV line
///
/// # Returns
/// The line, coloured when the row needs attention
pub fn highlight_row(row: &ReportRow, line: String) -> String {
    if row.j == 0 {
        return line.green().to_string();
    }
    if row.utilization == "100.00%" {
        return line.red().to_string();
    }
    match row.status.as_str() {
        "reserved" | "deprecated" => line.yellow().to_string(),
        _ => line,
    }
}
