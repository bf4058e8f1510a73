//! swarmdeck - swarm campaign tracking and reporting
//!
//! Keeps swarm campaign records in a 17-column CSV table and turns them into
//! weekly engagement summaries, an interactive dashboard, and report
//! documents with tables and bar charts.
//!
//! # Modules
//!
//! - [`store`] - CSV record store (initialize, append, find, update)
//! - [`magnitude`] - `3.2k`-style number parsing and formatting
//! - [`aggregate`] - Deltas, weekly grouping, comment counts, averages
//! - [`report`] - Report document assembly
//! - [`document`] / [`chart`] - HTML, Markdown and JSON writers, bar charts
//! - [`dashboard`] - Interactive shell
//! - [`doctor`] - Table health checks

pub mod aggregate;
pub mod chart;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod doctor;
pub mod document;
pub mod error;
pub mod logging;
pub mod magnitude;
pub mod model;
pub mod report;
pub mod store;

pub use aggregate::{AggregateReport, BlankPolicy};
pub use cli::*;
pub use config::Config;
pub use document::{Document, DocumentFormat, write_document};
pub use error::{
    Result, SwarmError, find_closest_match, format_did_you_mean, format_error,
    format_unknown_value_error,
};
pub use magnitude::{format_magnitude, parse_magnitude, percentage_change};
pub use model::*;
pub use report::ReportOptions;
pub use store::{CsvStore, RecordStore};

/// Default table filename
pub const DEFAULT_TABLE_NAME: &str = "swarms.csv";

/// Standard width for header dividers in CLI output
pub const HEADER_DIVIDER_WIDTH: usize = 60;

/// Get the default data directory for swarmdeck
#[must_use]
pub fn default_data_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("swarmdeck")
}

/// Get the default table path
#[must_use]
pub fn default_table_path() -> std::path::PathBuf {
    default_data_dir().join(DEFAULT_TABLE_NAME)
}

/// Format a count with thousands separators.
#[must_use]
pub fn format_count(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (idx, ch) in digits.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}

/// Shorten text to `max_len` characters on one line, ending in `...`.
#[must_use]
pub fn truncate_text(text: &str, max_len: usize) -> String {
    let text = text.replace('\n', " ").replace('\r', "");
    if text.chars().count() <= max_len {
        text
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::{default_table_path, format_count, truncate_text};

    #[test]
    fn format_count_adds_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(12_345_678), "12,345,678");
    }

    #[test]
    fn truncate_text_flattens_lines() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("line one\nline two", 12), "line one ...");
        assert_eq!(truncate_text("a\r\nb", 10), "a b");
    }

    #[test]
    fn default_table_lives_in_data_dir() {
        let path = default_table_path();
        assert!(path.ends_with("swarmdeck/swarms.csv"));
    }
}
