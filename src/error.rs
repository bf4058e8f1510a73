//! Custom error types for swarmdeck.
//!
//! Provides structured error handling with detailed context for better
//! diagnostics and user experience.

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for swarmdeck operations.
///
/// Each variant provides specific context about what went wrong,
/// enabling better error messages and programmatic error handling.
#[derive(Error, Debug)]
pub enum SwarmError {
    // =========================================================================
    // Table Errors
    // =========================================================================
    /// Table file not found where one is required.
    #[error("Swarm table not found at '{path}'")]
    FileAbsent { path: PathBuf },

    /// Table exists but its header or rows do not have the expected shape.
    #[error("Invalid swarm table '{path}': {reason}")]
    InvalidTable { path: PathBuf, reason: String },

    /// No row carries the requested identifier.
    #[error("{item_type} with ID '{id}' not found")]
    NotFound { item_type: &'static str, id: String },

    /// Underlying CSV reader/writer failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // =========================================================================
    // Data Validation Errors
    // =========================================================================
    /// A required field was missing on append, or a field cannot be edited.
    #[error("Invalid swarm: {reason}")]
    Validation { reason: String },

    /// Numeric text could not be parsed.
    #[error("Cannot read '{value}' as a number{}", context_suffix(.context.as_deref()))]
    Format {
        value: String,
        context: Option<String>,
    },

    // =========================================================================
    // IO Errors
    // =========================================================================
    /// File read/write error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Path-specific IO error with context.
    #[error("Failed to {operation} '{path}': {source}")]
    PathError {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Interactive line editor failure.
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file parsing error.
    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigError { path: PathBuf, reason: String },

    // =========================================================================
    // CLI Errors
    // =========================================================================
    /// Invalid command-line argument or prompt answer.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Catch-all for other errors with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

fn context_suffix(context: Option<&str>) -> String {
    context.map_or_else(String::new, |c| format!(" ({c})"))
}

/// Result type alias for swarmdeck operations.
pub type Result<T> = std::result::Result<T, SwarmError>;

impl SwarmError {
    /// Create a file absent error.
    pub fn file_absent(path: impl Into<PathBuf>) -> Self {
        Self::FileAbsent { path: path.into() }
    }

    /// Create an invalid table error.
    pub fn invalid_table(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidTable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error for a swarm identifier.
    pub fn swarm_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            item_type: "Swarm",
            id: id.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Create a numeric format error without location context.
    pub fn format(value: impl Into<String>) -> Self {
        Self::Format {
            value: value.into(),
            context: None,
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a path error with context.
    pub fn path_error(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::PathError {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Wrap an error with additional context.
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Attach a location (record and column) to a format error.
    ///
    /// Other variants pass through untouched.
    #[must_use]
    pub fn at(self, location: impl Into<String>) -> Self {
        match self {
            Self::Format {
                value,
                context: None,
            } => Self::Format {
                value,
                context: Some(location.into()),
            },
            other => other,
        }
    }

    /// Get a suggestion for how to fix this error, if applicable.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::FileAbsent { .. } => {
                Some("Run 'swarmdeck init' to create the table, or pass --table <path>.")
            }
            Self::InvalidTable { .. } => {
                Some("Run 'swarmdeck check' to see which rows are malformed.")
            }
            Self::NotFound { .. } => Some("Run 'swarmdeck list' to see existing swarm IDs."),
            Self::Format { .. } => Some(
                "Numeric fields accept plain numbers or a k/m/b suffix (e.g. 950, 3.2k, 1m).",
            ),
            _ => None,
        }
    }
}

// =============================================================================
// CLI Error Formatting Utilities
// =============================================================================

use colored::Colorize;

/// Format a structured CLI error with explanation and suggestions.
///
/// # Arguments
/// * `title` - Brief error title (e.g., "Unknown field")
/// * `explanation` - What went wrong and why
/// * `suggestions` - List of actionable suggestions
#[must_use]
pub fn format_error(title: &str, explanation: &str, suggestions: &[&str]) -> String {
    use std::fmt::Write;

    let mut output = format!("{} {}", "✗".red().bold(), title.bold());

    if !explanation.is_empty() {
        let _ = write!(output, "\n\n   {explanation}");
    }

    if !suggestions.is_empty() {
        output.push_str("\n\n   ");
        if suggestions.len() == 1 {
            let _ = write!(output, "{} {}", "Hint:".cyan(), suggestions[0]);
        } else {
            let _ = write!(output, "{}:", "Try".cyan());
            for suggestion in suggestions {
                let _ = write!(output, "\n     {} {}", "•".dimmed(), suggestion);
            }
        }
    }

    output
}

/// Edit distance between two strings, counting a swap of two adjacent
/// characters as one edit (optimal string alignment).
///
/// Used for "did you mean?" suggestions on commands, field and week names.
#[must_use]
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // Three rows: transpositions look two rows back
    let mut before_prev: Vec<usize> = vec![0; b_len + 1];
    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row: Vec<usize> = vec![0; b_len + 1];

    for i in 0..a_len {
        curr_row[0] = i + 1;

        for j in 0..b_len {
            let cost = usize::from(a_chars[i] != b_chars[j]);
            let mut best = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
            if i > 0 && j > 0 && a_chars[i] == b_chars[j - 1] && a_chars[i - 1] == b_chars[j] {
                best = best.min(before_prev[j - 1] + 1);
            }
            curr_row[j + 1] = best;
        }

        std::mem::swap(&mut before_prev, &mut prev_row);
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_len]
}

/// Find the best match from a list of candidates for a given input.
///
/// Exact matches are not returned; `max_distance` defaults to 2.
#[must_use]
pub fn find_closest_match<'a>(
    input: &str,
    candidates: &[&'a str],
    max_distance: Option<usize>,
) -> Option<&'a str> {
    let max_dist = max_distance.unwrap_or(2);
    let input_lower = input.to_lowercase();

    candidates
        .iter()
        .map(|&candidate| {
            let candidate_lower = candidate.to_lowercase();
            let distance = edit_distance(&input_lower, &candidate_lower);
            (candidate, distance)
        })
        .filter(|(_, distance)| *distance <= max_dist && *distance > 0)
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Format a "did you mean?" suggestion.
#[must_use]
pub fn format_did_you_mean(suggestion: &str) -> String {
    format!("Did you mean '{}'?", suggestion.green())
}

/// Format an error for an unknown value with "did you mean?" support.
#[must_use]
pub fn format_unknown_value_error(kind: &str, input: &str, valid_options: &[&str]) -> String {
    let title = format!("Unknown {kind}: '{input}'");

    let mut suggestions = Vec::new();

    if let Some(closest) = find_closest_match(input, valid_options, None) {
        suggestions.push(format_did_you_mean(closest));
    }

    if valid_options.len() <= 20 {
        suggestions.push(format!("Valid {kind}s: {}", valid_options.join(", ")));
    }

    let suggestion_refs: Vec<&str> = suggestions.iter().map(String::as_str).collect();
    format_error(&title, "", &suggestion_refs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SwarmError::file_absent("/path/to/swarms.csv");
        assert!(err.to_string().contains("/path/to/swarms.csv"));
    }

    #[test]
    fn test_error_suggestions() {
        let err = SwarmError::file_absent("/path/to/swarms.csv");
        assert!(err.suggestion().is_some());
        assert!(SwarmError::invalid_argument("x").suggestion().is_none());
    }

    #[test]
    fn test_not_found_message() {
        let err = SwarmError::swarm_not_found("SW-3-9");
        assert_eq!(err.to_string(), "Swarm with ID 'SW-3-9' not found");
    }

    #[test]
    fn test_format_error_with_location() {
        let err = SwarmError::format("abc").at("SW-1-1, Views");
        assert_eq!(err.to_string(), "Cannot read 'abc' as a number (SW-1-1, Views)");

        let bare = SwarmError::format("");
        assert_eq!(bare.to_string(), "Cannot read '' as a number");
    }

    #[test]
    fn test_at_keeps_first_location() {
        let err = SwarmError::format("x").at("inner").at("outer");
        assert!(err.to_string().contains("inner"));
        assert!(!err.to_string().contains("outer"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SwarmError = io_err.into();
        assert!(matches!(err, SwarmError::IoError(_)));
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("views", "views"), 0);
        assert_eq!(edit_distance("views", "veiws"), 1);
        assert_eq!(edit_distance("lsit", "list"), 1);
        assert_eq!(edit_distance("lsit", "edit"), 2);
        assert_eq!(edit_distance("ca", "abc"), 3);
        assert_eq!(edit_distance("", "likes"), 5);
    }

    #[test]
    fn find_closest_match_field_typo() {
        let candidates = ["views", "likes", "quotes", "bookmarks"];
        assert_eq!(find_closest_match("vews", &candidates, None), Some("views"));
        assert_eq!(find_closest_match("likes", &candidates, None), None);
        assert_eq!(find_closest_match("zzzzzz", &candidates, None), None);
    }

    #[test]
    fn find_closest_match_prefers_swapped_letters() {
        let commands = ["add", "edit", "show", "list", "summary"];
        assert_eq!(find_closest_match("lsit", &commands, None), Some("list"));
        assert_eq!(find_closest_match("shwo", &commands, None), Some("show"));
    }

    #[test]
    fn format_unknown_value_with_suggestion() {
        let output = format_unknown_value_error("field", "lieks", &["likes", "views"]);
        assert!(output.contains("Unknown field"));
        assert!(output.contains("lieks"));
        assert!(output.contains("likes"));
    }
}
