//! Engagement aggregation over swarm records.
//!
//! Deltas are ending minus starting values. Sums are taken over a filtered
//! subset of the table and grouped by week. Nothing here is cached; every
//! report recomputes from the records it is given.

use crate::error::{Result, SwarmError, find_closest_match, format_did_you_mean};
use crate::magnitude::{format_percentage, parse_magnitude, parse_or_zero};
use crate::model::{Field, Metric, SwarmRecord, Week, WeekFilter};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// How a blank metric field is read when totalling engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlankPolicy {
    /// Blank counts as zero (dashboard view of partly filled rows).
    #[default]
    Zero,
    /// Blank is a format error (reports).
    Reject,
}

/// Numeric value of one metric column of a record.
///
/// # Errors
///
/// Returns a format error naming the record and column.
pub fn metric_value(record: &SwarmRecord, field: Field, policy: BlankPolicy) -> Result<f64> {
    let raw = record.get(field);
    let parsed = match policy {
        BlankPolicy::Zero => parse_or_zero(raw),
        BlankPolicy::Reject => parse_magnitude(raw),
    };
    parsed.map_err(|e| e.at(format!("{}, {}", record.id, field.header_name())))
}

/// Ending minus starting value of one metric; blanks read as zero.
///
/// # Errors
///
/// Returns a format error for non-numeric text.
pub fn metric_delta(record: &SwarmRecord, metric: Metric) -> Result<f64> {
    let starting = metric_value(record, Field::Starting(metric), BlankPolicy::Zero)?;
    let ending = metric_value(record, Field::Ending(metric), BlankPolicy::Zero)?;
    Ok(ending - starting)
}

/// Sum of ending minus starting values of one metric across records.
///
/// # Errors
///
/// Returns a format error for non-numeric text.
pub fn sum_metric_delta(metric: Metric, records: &[&SwarmRecord]) -> Result<f64> {
    records
        .iter()
        .map(|record| metric_delta(record, metric))
        .sum()
}

/// Partition records by week, keeping source order inside each week.
#[must_use]
pub fn group_by_week<'a>(records: &[&'a SwarmRecord]) -> BTreeMap<Week, Vec<&'a SwarmRecord>> {
    let mut groups: BTreeMap<Week, Vec<&'a SwarmRecord>> = BTreeMap::new();
    for &record in records {
        groups.entry(record.week_key()).or_default().push(record);
    }
    groups
}

/// Distinct weeks present in the table, ascending.
#[must_use]
pub fn available_weeks(records: &[SwarmRecord]) -> Vec<Week> {
    records
        .iter()
        .map(SwarmRecord::week_key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Reject a week the table does not contain, suggesting the nearest one.
///
/// # Errors
///
/// Returns [`SwarmError::InvalidArgument`] listing the available weeks.
pub fn require_week(records: &[SwarmRecord], filter: &WeekFilter) -> Result<()> {
    let WeekFilter::Week(week) = filter else {
        return Ok(());
    };
    let weeks = available_weeks(records);
    if weeks.contains(week) {
        return Ok(());
    }
    let names: Vec<&str> = weeks.iter().map(Week::as_str).collect();
    let hint = find_closest_match(week.as_str(), &names, None)
        .map(|s| format!(" {}", format_did_you_mean(s)))
        .unwrap_or_default();
    Err(SwarmError::invalid_argument(format!(
        "no swarms in week '{week}'.{hint} Available weeks: {}",
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    )))
}

/// Individual comments in a comments field.
///
/// Segments are split on line breaks and trimmed; blank segments, including
/// the one after a trailing line break, are dropped.
pub fn split_comments(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(str::trim).filter(|c| !c.is_empty())
}

/// Total number of individual comments across records.
#[must_use]
pub fn count_comments(records: &[&SwarmRecord]) -> usize {
    records
        .iter()
        .map(|record| split_comments(&record.comments).count())
        .sum()
}

/// Average of a total over a record count; zero when there are no records.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_per_record(total: f64, record_count: usize) -> f64 {
    if record_count == 0 {
        0.0
    } else {
        total / record_count as f64
    }
}

/// Sum of all five starting metrics across records.
///
/// # Errors
///
/// Returns a format error for non-numeric text, or blank text under
/// [`BlankPolicy::Reject`].
pub fn initial_total(records: &[&SwarmRecord], policy: BlankPolicy) -> Result<f64> {
    engagement_total(records, Field::Starting, policy)
}

/// Sum of all five ending metrics across records.
///
/// # Errors
///
/// Same as [`initial_total`].
pub fn ending_total(records: &[&SwarmRecord], policy: BlankPolicy) -> Result<f64> {
    engagement_total(records, Field::Ending, policy)
}

fn engagement_total(
    records: &[&SwarmRecord],
    column: fn(Metric) -> Field,
    policy: BlankPolicy,
) -> Result<f64> {
    let mut total = 0.0;
    for record in records {
        for metric in Metric::ALL {
            total += metric_value(record, column(metric), policy)?;
        }
    }
    Ok(total)
}

/// Per-metric values keyed by metric.
pub type MetricTotals = BTreeMap<Metric, f64>;

fn per_metric<F>(mut value: F) -> Result<MetricTotals>
where
    F: FnMut(Metric) -> Result<f64>,
{
    Metric::ALL
        .into_iter()
        .map(|metric| value(metric).map(|v| (metric, v)))
        .collect()
}

/// Aggregates for a single week.
#[derive(Debug, Clone, Serialize)]
pub struct WeekSummary {
    pub week: Week,
    pub record_count: usize,
    pub comment_count: usize,
    pub deltas: MetricTotals,
    pub initial_total: f64,
    pub ending_total: f64,
}

/// Aggregates over the records selected by a week filter.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub filter: WeekFilter,
    pub record_count: usize,
    pub comment_count: usize,
    pub total_deltas: MetricTotals,
    pub average_deltas: MetricTotals,
    pub starting_totals: MetricTotals,
    pub ending_totals: MetricTotals,
    pub percentage_changes: BTreeMap<Metric, String>,
    pub weeks: Vec<WeekSummary>,
}

impl AggregateReport {
    /// Compute every aggregate for the records the filter selects.
    ///
    /// # Errors
    ///
    /// Returns the first format error met, naming the record and column.
    pub fn compute(records: &[SwarmRecord], filter: &WeekFilter, policy: BlankPolicy) -> Result<Self> {
        let selected = filter.apply(records);
        let record_count = selected.len();

        let total_deltas = per_metric(|metric| sum_metric_delta(metric, &selected))?;
        let average_deltas = total_deltas
            .iter()
            .map(|(metric, total)| (*metric, average_per_record(*total, record_count)))
            .collect();

        let column_total = |column: fn(Metric) -> Field, metric: Metric| -> Result<f64> {
            selected
                .iter()
                .map(|record| metric_value(record, column(metric), policy))
                .sum()
        };
        let starting_totals = per_metric(|metric| column_total(Field::Starting, metric))?;
        let ending_totals = per_metric(|metric| column_total(Field::Ending, metric))?;
        let percentage_changes = Metric::ALL
            .into_iter()
            .map(|metric| {
                (
                    metric,
                    format_percentage(starting_totals[&metric], ending_totals[&metric]),
                )
            })
            .collect();

        let weeks = group_by_week(&selected)
            .into_iter()
            .map(|(week, members)| {
                Ok(WeekSummary {
                    record_count: members.len(),
                    comment_count: count_comments(&members),
                    deltas: per_metric(|metric| sum_metric_delta(metric, &members))?,
                    initial_total: initial_total(&members, policy)?,
                    ending_total: ending_total(&members, policy)?,
                    week,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            filter: filter.clone(),
            record_count,
            comment_count: count_comments(&selected),
            total_deltas,
            average_deltas,
            starting_totals,
            ending_totals,
            percentage_changes,
            weeks,
        })
    }

    /// One value per week, in week order.
    pub fn per_week<F>(&self, value: F) -> Vec<(String, f64)>
    where
        F: Fn(&WeekSummary) -> f64,
    {
        self.weeks
            .iter()
            .map(|summary| (summary.week.to_string(), value(summary)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwarmError;
    use crate::model::{Engagement, SwarmDraft};

    fn engagement(values: [&str; 5]) -> Engagement {
        let [views, retweets, quotes, likes, bookmarks] = values.map(str::to_string);
        Engagement {
            views,
            retweets,
            quotes,
            likes,
            bookmarks,
        }
    }

    fn record(week: &str, number: &str, start: [&str; 5], end: [&str; 5], comments: &str) -> SwarmRecord {
        SwarmDraft {
            week: week.into(),
            number: number.into(),
            starting: engagement(start),
            ending: engagement(end),
            comments: comments.into(),
            ..SwarmDraft::default()
        }
        .into_record()
        .unwrap()
    }

    fn sample_table() -> Vec<SwarmRecord> {
        vec![
            record("1", "1", ["1k", "10", "1", "20", "2"], ["3k", "30", "4", "60", "5"], "a\nb"),
            record("2", "1", ["500", "5", "0", "10", "1"], ["2.5k", "15", "2", "40", "3"], "c"),
            record("1", "2", ["2k", "20", "2", "30", "0"], ["2.5k", "25", "2", "35", "1"], ""),
        ]
    }

    fn refs(records: &[SwarmRecord]) -> Vec<&SwarmRecord> {
        records.iter().collect()
    }

    #[test]
    fn sums_metric_deltas() {
        let table = sample_table();
        let all = refs(&table);
        assert_eq!(sum_metric_delta(Metric::Views, &all).unwrap(), 4_500.0);
        assert_eq!(sum_metric_delta(Metric::Likes, &all).unwrap(), 75.0);
        assert_eq!(sum_metric_delta(Metric::Views, &[]).unwrap(), 0.0);
    }

    #[test]
    fn blank_fields_count_as_zero_in_deltas() {
        let r = record("1", "1", ["", "", "", "", ""], ["1k", "", "", "", ""], "");
        assert_eq!(sum_metric_delta(Metric::Views, &[&r]).unwrap(), 1_000.0);
        assert_eq!(sum_metric_delta(Metric::Quotes, &[&r]).unwrap(), 0.0);
    }

    #[test]
    fn non_numeric_fields_are_format_errors() {
        let r = record("1", "1", ["lots", "", "", "", ""], ["", "", "", "", ""], "");
        let err = sum_metric_delta(Metric::Views, &[&r]).unwrap_err();
        assert!(matches!(err, SwarmError::Format { .. }));
        assert!(err.to_string().contains("SW-1-1, Views"));
    }

    #[test]
    fn groups_weeks_in_order() {
        let table = vec![
            record("2", "1", ["1"; 5], ["1"; 5], ""),
            record("1", "1", ["1"; 5], ["1"; 5], ""),
            record("2", "2", ["1"; 5], ["1"; 5], ""),
        ];
        let groups = group_by_week(&refs(&table));
        let weeks: Vec<&str> = groups.keys().map(Week::as_str).collect();
        assert_eq!(weeks, ["1", "2"]);
        let week_two: Vec<&str> = groups[&Week::new("2")].iter().map(|r| r.id.as_str()).collect();
        assert_eq!(week_two, ["SW-2-1", "SW-2-2"]);
    }

    #[test]
    fn trailing_separator_does_not_add_a_comment() {
        let r = record("1", "1", ["1"; 5], ["1"; 5], "a\nb\n");
        assert_eq!(count_comments(&[&r]), 2);
    }

    #[test]
    fn blank_comment_fields_count_zero() {
        let blank = record("1", "1", ["1"; 5], ["1"; 5], "   ");
        let lines = record("1", "2", ["1"; 5], ["1"; 5], "one\r\n\r\n  two  \n");
        assert_eq!(count_comments(&[&blank]), 0);
        assert_eq!(count_comments(&[&lines]), 2);
        assert_eq!(split_comments(&lines.comments).collect::<Vec<_>>(), ["one", "two"]);
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average_per_record(100.0, 0), 0.0);
        assert_eq!(average_per_record(100.0, 4), 25.0);
    }

    #[test]
    fn totals_respect_blank_policy() {
        let r = record("1", "1", ["1k", "", "1", "1", "1"], ["2k", "2", "2", "2", "2"], "");
        assert_eq!(initial_total(&[&r], BlankPolicy::Zero).unwrap(), 1_003.0);
        assert_eq!(ending_total(&[&r], BlankPolicy::Reject).unwrap(), 2_008.0);
        assert!(initial_total(&[&r], BlankPolicy::Reject).is_err());
    }

    #[test]
    fn report_matches_hand_computed_week_totals() {
        let table = sample_table();
        let report = AggregateReport::compute(&table, &WeekFilter::All, BlankPolicy::Reject).unwrap();

        assert_eq!(report.record_count, 3);
        assert_eq!(report.comment_count, 3);
        assert_eq!(report.weeks.len(), 2);

        let week_one = &report.weeks[0];
        assert_eq!(week_one.week.as_str(), "1");
        assert_eq!(week_one.record_count, 2);
        assert_eq!(week_one.comment_count, 2);
        assert_eq!(week_one.deltas[&Metric::Views], 2_500.0);
        assert_eq!(week_one.deltas[&Metric::Retweets], 25.0);
        assert_eq!(week_one.deltas[&Metric::Quotes], 3.0);
        assert_eq!(week_one.deltas[&Metric::Likes], 45.0);
        assert_eq!(week_one.deltas[&Metric::Bookmarks], 4.0);
        assert_eq!(week_one.initial_total, 1_033.0 + 2_052.0);
        assert_eq!(week_one.ending_total, 3_099.0 + 2_563.0);

        let week_two = &report.weeks[1];
        assert_eq!(week_two.deltas[&Metric::Views], 2_000.0);
        assert_eq!(week_two.initial_total, 516.0);
        assert_eq!(week_two.ending_total, 2_560.0);

        assert_eq!(report.total_deltas[&Metric::Views], 4_500.0);
        assert_eq!(report.average_deltas[&Metric::Views], 1_500.0);
        assert_eq!(report.starting_totals[&Metric::Views], 3_500.0);
        assert_eq!(report.ending_totals[&Metric::Views], 8_000.0);
        assert_eq!(report.percentage_changes[&Metric::Views], "129%");
    }

    #[test]
    fn report_filters_by_week() {
        let table = sample_table();
        let filter = WeekFilter::parse("2");
        let report = AggregateReport::compute(&table, &filter, BlankPolicy::Zero).unwrap();
        assert_eq!(report.record_count, 1);
        assert_eq!(report.per_week(|w| w.deltas[&Metric::Likes]), vec![("2".to_string(), 30.0)]);
    }

    #[test]
    fn empty_selection_averages_to_zero() {
        let report = AggregateReport::compute(&[], &WeekFilter::All, BlankPolicy::Reject).unwrap();
        assert_eq!(report.record_count, 0);
        assert!(report.average_deltas.values().all(|v| *v == 0.0));
        assert!(report.weeks.is_empty());
        assert_eq!(report.percentage_changes[&Metric::Likes], "0%");
    }

    #[test]
    fn unknown_week_is_rejected_with_hint() {
        let table = sample_table();
        assert!(require_week(&table, &WeekFilter::All).is_ok());
        assert!(require_week(&table, &WeekFilter::parse("2")).is_ok());

        let err = require_week(&table, &WeekFilter::parse("3")).unwrap_err();
        assert!(matches!(err, SwarmError::InvalidArgument { .. }));
        assert!(err.to_string().contains("Available weeks: 1, 2"));
        assert!(require_week(&[], &WeekFilter::parse("1"))
            .unwrap_err()
            .to_string()
            .contains("Available weeks: none"));
    }

    #[test]
    fn available_weeks_are_distinct_and_sorted() {
        let table = sample_table();
        let weeks: Vec<String> = available_weeks(&table).iter().map(ToString::to_string).collect();
        assert_eq!(weeks, ["1", "2"]);
    }
}
