//! Magnitude strings: human-entered numbers with an optional k/m/b suffix.
//!
//! Formatting is display-only and lossy. Mantissas are rounded half away from
//! zero, so `2_500_000` prints as `3m`.

use crate::error::{Result, SwarmError};

const THOUSAND: f64 = 1_000.0;
const MILLION: f64 = 1_000_000.0;
const BILLION: f64 = 1_000_000_000.0;

/// Parse a magnitude string such as `950`, `3.2k`, `1m` or `2B`.
///
/// # Errors
///
/// Returns [`SwarmError::Format`] for blank or non-numeric text.
pub fn parse_magnitude(text: &str) -> Result<f64> {
    let normalized = text.trim().to_lowercase();

    let (number, scale) = match normalized.chars().last() {
        Some('k') => (&normalized[..normalized.len() - 1], THOUSAND),
        Some('m') => (&normalized[..normalized.len() - 1], MILLION),
        Some('b') => (&normalized[..normalized.len() - 1], BILLION),
        Some(_) => (normalized.as_str(), 1.0),
        None => return Err(SwarmError::format(text)),
    };

    number
        .trim()
        .parse::<f64>()
        .map(|value| value * scale)
        .map_err(|_| SwarmError::format(text))
}

/// Parse a magnitude string, reading blank text as zero.
///
/// # Errors
///
/// Returns [`SwarmError::Format`] for non-blank, non-numeric text.
pub fn parse_or_zero(text: &str) -> Result<f64> {
    if text.trim().is_empty() {
        Ok(0.0)
    } else {
        parse_magnitude(text)
    }
}

/// Format a value with the largest suffix it reaches.
///
/// Thresholds: `>= 1e9` → `b`, `>= 1e6` → `m`, `>= 1e3` → `k`, else the
/// value itself rounded to an integer. Negative values never take a suffix.
#[must_use]
pub fn format_magnitude(value: f64) -> String {
    if value >= BILLION {
        format!("{}b", round_to_integer(value / BILLION))
    } else if value >= MILLION {
        format!("{}m", round_to_integer(value / MILLION))
    } else if value >= THOUSAND {
        format!("{}k", round_to_integer(value / THOUSAND))
    } else {
        round_to_integer(value)
    }
}

/// Percentage change between two magnitude strings, e.g. `"50%"`.
///
/// Thousands separators are ignored. An old value of zero yields `"0%"`.
///
/// # Errors
///
/// Returns [`SwarmError::Format`] when either side does not parse.
pub fn percentage_change(old: &str, new: &str) -> Result<String> {
    let old = parse_magnitude(&old.replace(',', ""))?;
    let new = parse_magnitude(&new.replace(',', ""))?;
    Ok(format_percentage(old, new))
}

/// Percentage change between two numbers, e.g. `"-25%"`.
#[must_use]
pub fn format_percentage(old: f64, new: f64) -> String {
    if old == 0.0 {
        return "0%".to_string();
    }
    format!("{}%", round_to_integer((new - old) / old * 100.0))
}

fn round_to_integer(value: f64) -> String {
    // Adding 0.0 turns -0.0 into 0.0.
    let rounded = value.round() + 0.0;
    format!("{rounded:.0}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixes() {
        assert_eq!(parse_magnitude("3k").unwrap(), 3_000.0);
        assert_eq!(parse_magnitude("1.5m").unwrap(), 1_500_000.0);
        assert_eq!(parse_magnitude("2b").unwrap(), 2_000_000_000.0);
        assert_eq!(parse_magnitude(" 3.2K ").unwrap(), 3_200.0);
        assert_eq!(parse_magnitude("950").unwrap(), 950.0);
        assert_eq!(parse_magnitude("12.5").unwrap(), 12.5);
    }

    #[test]
    fn rejects_blank_and_garbage() {
        for input in ["", "   ", "k", "abc", "3x", "1,000"] {
            let err = parse_magnitude(input).unwrap_err();
            assert!(matches!(err, SwarmError::Format { .. }), "{input:?}");
        }
    }

    #[test]
    fn blank_reads_as_zero_only_when_asked() {
        assert_eq!(parse_or_zero("  ").unwrap(), 0.0);
        assert_eq!(parse_or_zero("2k").unwrap(), 2_000.0);
        assert!(parse_or_zero("n/a").is_err());
    }

    #[test]
    fn formats_with_suffix_tiers() {
        assert_eq!(format_magnitude(0.0), "0");
        assert_eq!(format_magnitude(950.0), "950");
        assert_eq!(format_magnitude(999.4), "999");
        assert_eq!(format_magnitude(1_000.0), "1k");
        assert_eq!(format_magnitude(12_345.0), "12k");
        assert_eq!(format_magnitude(1_000_000.0), "1m");
        assert_eq!(format_magnitude(3_000_000_000.0), "3b");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(format_magnitude(2_500_000.0), "3m");
        assert_eq!(format_magnitude(1_500.0), "2k");
        assert_eq!(format_magnitude(2.5), "3");
        assert_eq!(format_magnitude(-2.5), "-3");
    }

    #[test]
    fn negative_values_stay_unsuffixed() {
        assert_eq!(format_magnitude(-5_000.0), "-5000");
        assert_eq!(format_magnitude(-0.2), "0");
    }

    #[test]
    fn suffix_tier_never_drops_as_value_grows() {
        fn tier(text: &str) -> u8 {
            match text.chars().last() {
                Some('b') => 3,
                Some('m') => 2,
                Some('k') => 1,
                _ => 0,
            }
        }

        let mut previous = 0;
        let mut value = 1.0;
        while value < 1e12 {
            let current = tier(&format_magnitude(value));
            assert!(current >= previous, "tier dropped at {value}");
            previous = current;
            value *= 1.37;
        }
    }

    #[test]
    fn percentage_change_cases() {
        assert_eq!(percentage_change("0", "500").unwrap(), "0%");
        assert_eq!(percentage_change("100", "150").unwrap(), "50%");
        assert_eq!(percentage_change("1,000", "750").unwrap(), "-25%");
        assert_eq!(percentage_change("2k", "3k").unwrap(), "50%");
        assert_eq!(percentage_change("3", "4").unwrap(), "33%");
        assert!(percentage_change("", "4").is_err());
    }
}
