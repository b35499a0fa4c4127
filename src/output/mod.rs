//! Output formatting for IPAM data.
//!
//! This module handles formatting and outputting the prefix report:
//! - [`report`] - Report rows with free blocks
//! - [`csv`] - CSV output formatting
//! - [`terminal`] - Terminal field formatting

mod csv;
mod report;
mod terminal;

pub use csv::report_print;
pub use report::{report_rows, scope_rows, ReportRow};
pub use terminal::format_field;
