//! Health checks for `swarmdeck check`.
//!
//! Each check inspects one aspect of a table file and reports pass, warning,
//! or error with a short message and, when something is off, a suggestion.
//! Checks never modify the table.

use crate::error::{Result, SwarmError};
use crate::magnitude::parse_magnitude;
use crate::model::{COLUMN_COUNT, Field, Metric, SwarmRecord};
use crate::store::{CsvStore, RawTable};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// What part of the table a check looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    File,
    Header,
    Rows,
    Values,
    Identifiers,
}

/// Status for an individual health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warning,
    Error,
}

impl CheckStatus {
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Single health check result.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub category: CheckCategory,
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Worst status across checks; `Pass` when there are none.
#[must_use]
pub fn overall_status(checks: &[HealthCheck]) -> CheckStatus {
    checks
        .iter()
        .map(|c| c.status)
        .max()
        .unwrap_or(CheckStatus::Pass)
}

/// First three entries of a list, with `...` when there are more.
fn sample(items: &[String], separator: &str) -> String {
    format!(
        "{}{}",
        items[..3.min(items.len())].join(separator),
        if items.len() > 3 { "..." } else { "" }
    )
}

/// Header row matches the 17 expected column names.
#[must_use]
pub fn check_header(table: &RawTable) -> HealthCheck {
    let expected = Field::header();
    let found: Vec<&str> = table.header.iter().map(String::as_str).collect();

    let (status, message, suggestion) = if found == expected {
        (CheckStatus::Pass, format!("{COLUMN_COUNT} expected columns"), None)
    } else if found.is_empty() {
        (
            CheckStatus::Error,
            "No header row".to_string(),
            Some("Run 'swarmdeck init' on an empty file to write the header".to_string()),
        )
    } else {
        let differences: Vec<String> = expected
            .iter()
            .enumerate()
            .filter(|(i, name)| found.get(*i) != Some(*name))
            .map(|(i, name)| match found.get(i) {
                Some(other) => format!("column {}: '{other}' instead of '{name}'", i + 1),
                None => format!("column {}: missing '{name}'", i + 1),
            })
            .collect();
        let extra = found.len().saturating_sub(COLUMN_COUNT);
        let message = if differences.is_empty() {
            format!("{extra} unexpected extra column(s)")
        } else {
            format!("{} column(s) differ", differences.len())
        };
        (
            CheckStatus::Error,
            message,
            (!differences.is_empty()).then(|| sample(&differences, "; ")),
        )
    };

    HealthCheck {
        category: CheckCategory::Header,
        name: "Header".into(),
        status,
        message,
        suggestion,
    }
}

/// Every row has exactly 17 fields.
#[must_use]
pub fn check_row_widths(table: &RawTable) -> HealthCheck {
    let bad: Vec<String> = table
        .rows
        .iter()
        .filter(|(_, values)| values.len() != COLUMN_COUNT)
        .map(|(line, values)| format!("line {line}: {} fields", values.len()))
        .collect();

    HealthCheck {
        category: CheckCategory::Rows,
        name: "Row width".into(),
        status: if bad.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Error
        },
        message: if bad.is_empty() {
            format!("{} rows with {COLUMN_COUNT} fields", table.rows.len())
        } else {
            format!("{} malformed rows", bad.len())
        },
        suggestion: (!bad.is_empty()).then(|| sample(&bad, "; ")),
    }
}

fn metric_fields() -> impl Iterator<Item = Field> {
    Metric::ALL
        .into_iter()
        .map(Field::Starting)
        .chain(Metric::ALL.into_iter().map(Field::Ending))
}

/// Metric fields parse as magnitudes. Blanks are a warning: they read as
/// zero on the dashboard but stop report generation.
#[must_use]
pub fn check_numeric_fields(records: &[SwarmRecord]) -> HealthCheck {
    let mut invalid = Vec::new();
    let mut blank = Vec::new();

    for record in records {
        for field in metric_fields() {
            let value = record.get(field);
            if value.trim().is_empty() {
                blank.push(format!("{} {}", record.id, field.header_name()));
            } else if parse_magnitude(value).is_err() {
                invalid.push(format!("{} {}: '{value}'", record.id, field.header_name()));
            }
        }
    }

    let (status, message, suggestion) = if !invalid.is_empty() {
        (
            CheckStatus::Error,
            format!("{} non-numeric metric values", invalid.len()),
            Some(format!(
                "Fix with 'swarmdeck edit <id> <field> <value>': {}",
                sample(&invalid, "; ")
            )),
        )
    } else if !blank.is_empty() {
        (
            CheckStatus::Warning,
            format!("{} blank metric values", blank.len()),
            Some(format!("Reports need every metric: {}", sample(&blank, "; "))),
        )
    } else {
        (
            CheckStatus::Pass,
            format!("{} metric values", records.len() * 2 * Metric::ALL.len()),
            None,
        )
    };

    HealthCheck {
        category: CheckCategory::Values,
        name: "Numeric fields".into(),
        status,
        message,
        suggestion,
    }
}

/// Identifiers are unique. Lookups and edits only reach the first match.
#[must_use]
pub fn check_duplicate_ids(records: &[SwarmRecord]) -> HealthCheck {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut duplicates = Vec::new();
    for record in records {
        let count = counts.entry(record.id.as_str()).or_default();
        *count += 1;
        if *count == 2 {
            duplicates.push(record.id.clone());
        }
    }

    HealthCheck {
        category: CheckCategory::Identifiers,
        name: "Duplicate IDs".into(),
        status: if duplicates.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Warning
        },
        message: if duplicates.is_empty() {
            format!("{} unique swarm IDs", counts.len())
        } else {
            format!("{} duplicate IDs found", duplicates.len())
        },
        suggestion: (!duplicates.is_empty()).then(|| {
            format!(
                "Only the first row is reachable by ID: {}",
                sample(&duplicates, ", ")
            )
        }),
    }
}

/// Identifiers still match `SW-<week>-<number>` after edits.
#[must_use]
pub fn check_stale_ids(records: &[SwarmRecord]) -> HealthCheck {
    let stale: Vec<String> = records
        .iter()
        .filter(|r| r.id != r.derived_id())
        .map(|r| format!("{} (now {})", r.id, r.derived_id()))
        .collect();

    HealthCheck {
        category: CheckCategory::Identifiers,
        name: "Stale IDs".into(),
        status: if stale.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Warning
        },
        message: if stale.is_empty() {
            "All IDs match week and number".to_string()
        } else {
            format!("{} IDs no longer match week and number", stale.len())
        },
        suggestion: (!stale.is_empty()).then(|| {
            format!(
                "IDs are kept stable after edits; look up these swarms by their old ID: {}",
                sample(&stale, ", ")
            )
        }),
    }
}

/// Run every check against a table file.
///
/// A missing file yields a single error check. Value and identifier checks
/// cover rows of the right width only.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed as CSV.
pub fn check_table(store: &CsvStore) -> Result<Vec<HealthCheck>> {
    let table = match store.read_raw() {
        Ok(table) => table,
        Err(SwarmError::FileAbsent { path }) => {
            return Ok(vec![HealthCheck {
                category: CheckCategory::File,
                name: "Table file".into(),
                status: CheckStatus::Error,
                message: format!("Not found: {}", path.display()),
                suggestion: Some("Run 'swarmdeck init' to create it".into()),
            }]);
        }
        Err(e) => return Err(e),
    };
    debug!(rows = table.rows.len(), "Checking table");

    let records: Vec<SwarmRecord> = table
        .rows
        .iter()
        .filter_map(|(_, values)| SwarmRecord::from_row(values.iter().map(String::as_str)))
        .collect();

    Ok(vec![
        HealthCheck {
            category: CheckCategory::File,
            name: "Table file".into(),
            status: CheckStatus::Pass,
            message: store.path().display().to_string(),
            suggestion: None,
        },
        check_header(&table),
        check_row_widths(&table),
        check_numeric_fields(&records),
        check_duplicate_ids(&records),
        check_stale_ids(&records),
    ])
}
