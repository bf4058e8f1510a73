//! Campaign report assembly.
//!
//! Builds a [`Document`] from the swarm table: cover, summary tables, nine
//! per-week bar charts, and one detail section per selected swarm. Values a
//! table or chart needs must be numeric; a bad value stops the report with a
//! format error naming the swarm and column.

use crate::aggregate::{AggregateReport, BlankPolicy, WeekSummary, metric_value, split_comments};
use crate::chart::BarChart;
use crate::document::{Block, Document, Table};
use crate::error::Result;
use crate::magnitude::{format_magnitude, percentage_change};
use crate::model::{Field, Metric, SwarmRecord, WeekFilter};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_HEADER: &str = "LBC Swarm Campaign Report";
pub const DEFAULT_FOOTER: &str = "Private and Confidential";
pub const DEFAULT_CHART_COLOR: &str = "darkorange";
const LOGO_WIDTH_INCHES: f32 = 2.0;

/// Presentation settings for a report.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    pub date: String,
    pub include_comments: bool,
    pub header: Option<String>,
    pub footer: Option<String>,
    pub logo: Option<PathBuf>,
    pub chart_color: String,
}

impl ReportOptions {
    /// Defaults for a report written to `output`: title from the file name,
    /// today's date.
    #[must_use]
    pub fn for_output(output: &Path) -> Self {
        Self {
            title: report_title(output),
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            include_comments: false,
            header: Some(DEFAULT_HEADER.to_string()),
            footer: Some(DEFAULT_FOOTER.to_string()),
            logo: None,
            chart_color: DEFAULT_CHART_COLOR.to_string(),
        }
    }
}

/// Title for a report file: `q3_swarm_report.html` → `Q3 Swarm Report`.
#[must_use]
pub fn report_title(output: &Path) -> String {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().replace('_', " "))
        .unwrap_or_default();

    let mut title = String::with_capacity(stem.len());
    let mut after_letter = false;
    for ch in stem.chars() {
        if ch.is_alphabetic() {
            if after_letter {
                title.extend(ch.to_lowercase());
            } else {
                title.extend(ch.to_uppercase());
            }
            after_letter = true;
        } else {
            title.push(ch);
            after_letter = false;
        }
    }
    title
}

/// Assemble the full report document.
///
/// # Errors
///
/// Returns a format error for a missing or non-numeric value needed by a
/// table or chart. Nothing is written.
pub fn assemble(
    records: &[SwarmRecord],
    filter: &WeekFilter,
    options: &ReportOptions,
) -> Result<Document> {
    assemble_with_progress(records, filter, options, |_| {})
}

/// Same as [`assemble`], calling `on_section` after each swarm section.
///
/// # Errors
///
/// Same as [`assemble`].
pub fn assemble_with_progress<F>(
    records: &[SwarmRecord],
    filter: &WeekFilter,
    options: &ReportOptions,
    mut on_section: F,
) -> Result<Document>
where
    F: FnMut(&SwarmRecord),
{
    let aggregate = AggregateReport::compute(records, filter, BlankPolicy::Reject)?;
    // Weekly charts always span the whole table, whatever the filter.
    let timeline = match filter {
        WeekFilter::All => aggregate.clone(),
        WeekFilter::Week(_) => {
            AggregateReport::compute(records, &WeekFilter::All, BlankPolicy::Reject)?
        }
    };
    let selected = filter.apply(records);
    debug!(filter = %filter, selected = selected.len(), "Assembling report");

    let mut doc = Document {
        title: options.title.clone(),
        header: options.header.clone(),
        footer: options.footer.clone(),
        blocks: Vec::new(),
    };

    push_cover(&mut doc, options);
    push_summary(&mut doc, &aggregate, &timeline, options);

    for record in selected {
        push_swarm_section(&mut doc, record, options.include_comments)?;
        on_section(record);
    }

    Ok(doc)
}

fn push_cover(doc: &mut Document, options: &ReportOptions) {
    if let Some(logo) = &options.logo {
        if logo.is_file() {
            doc.push(Block::Image {
                path: logo.clone(),
                width_inches: LOGO_WIDTH_INCHES,
            });
        } else {
            warn!(path = %logo.display(), "Logo not found; report will have no logo");
        }
    }
    doc.push(Block::Title {
        text: options.title.clone(),
    });
    doc.push(Block::Date {
        text: options.date.clone(),
    });
    doc.push(Block::PageBreak);
}

fn scope_label(filter: &WeekFilter) -> String {
    match filter {
        WeekFilter::All => "All Weeks".to_string(),
        WeekFilter::Week(week) => format!("Week {week}"),
    }
}

fn push_summary(
    doc: &mut Document,
    aggregate: &AggregateReport,
    timeline: &AggregateReport,
    options: &ReportOptions,
) {
    let scope = scope_label(&aggregate.filter);

    doc.push(Block::Heading {
        level: 1,
        text: "Summary".into(),
    });
    #[allow(clippy::cast_precision_loss)]
    let comments = format_magnitude(aggregate.comment_count as f64);
    doc.push(Block::Paragraph {
        text: format!("Total Comments for {scope}: {comments}"),
    });
    doc.push(Block::Paragraph {
        text: format!("Total Swarms for {scope}: {}", aggregate.record_count),
    });

    doc.push(Block::Table(summary_table(
        &format!("Total Additional Engagements for {scope}"),
        |metric| aggregate.total_deltas[&metric],
    )));
    doc.push(Block::Table(summary_table(
        &format!("Average Additional Engagements for {scope}"),
        |metric| aggregate.average_deltas[&metric],
    )));

    for chart in summary_charts(timeline, &options.chart_color) {
        doc.push(Block::Chart(chart));
    }
}

fn summary_table<F>(title: &str, value: F) -> Table
where
    F: Fn(Metric) -> f64,
{
    let mut heading = vec![title.to_string()];
    let mut values = vec![String::new()];
    for metric in Metric::ALL {
        heading.push(metric.label().to_string());
        values.push(format_magnitude(value(metric)));
    }
    Table {
        rows: vec![heading, values],
    }
}

/// The nine per-week charts, in document order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summary_charts(aggregate: &AggregateReport, color: &str) -> Vec<BarChart> {
    let chart = |title: String, y_label: String, value: &dyn Fn(&WeekSummary) -> f64| {
        BarChart::new(title, "Week", y_label, color, aggregate.per_week(value))
    };

    let mut charts = vec![chart(
        "Total Swarms per Week".into(),
        "Number of Swarms".into(),
        &|w: &WeekSummary| w.record_count as f64,
    )];
    for metric in Metric::ALL {
        charts.push(chart(
            format!("Total Additional {metric} per Week"),
            format!("Total Additional {metric}"),
            &|w: &WeekSummary| w.deltas[&metric],
        ));
    }
    charts.push(chart(
        "Initial Total Engagements per Week".into(),
        "Initial Engagements".into(),
        &|w: &WeekSummary| w.initial_total,
    ));
    charts.push(chart(
        "Ending Total Engagements per Week".into(),
        "Ending Engagements".into(),
        &|w: &WeekSummary| w.ending_total,
    ));
    charts.push(chart(
        "Total Comments per Week".into(),
        "Number of Comments".into(),
        &|w: &WeekSummary| w.comment_count as f64,
    ));
    charts
}

fn metric_header() -> Vec<String> {
    std::iter::once(String::new())
        .chain(Metric::ALL.iter().map(|m| m.label().to_string()))
        .collect()
}

/// Before/after tables and optional comments for one swarm.
fn push_swarm_section(doc: &mut Document, record: &SwarmRecord, include_comments: bool) -> Result<()> {
    doc.push(Block::Heading {
        level: 1,
        text: format!("Swarm Number: {}", record.number),
    });
    doc.push(Block::Paragraph {
        text: format!("Swarm URL: {}", record.url),
    });

    let mut initial = vec!["Initial".to_string()];
    let mut ending = vec!["Ending".to_string()];
    let mut change = vec!["% Change".to_string()];
    for metric in Metric::ALL {
        let start = metric_value(record, Field::Starting(metric), BlankPolicy::Reject)?;
        let end = metric_value(record, Field::Ending(metric), BlankPolicy::Reject)?;
        initial.push(format_magnitude(start));
        ending.push(format_magnitude(end));
        change.push(
            percentage_change(record.starting.get(metric), record.ending.get(metric))
                .map_err(|e| e.at(format!("{}, {metric}", record.id)))?,
        );
    }

    doc.push(Block::Table(Table {
        rows: vec![metric_header(), initial],
    }));
    doc.push(Block::Table(Table {
        rows: vec![metric_header(), ending, change],
    }));

    if include_comments {
        doc.push(Block::Heading {
            level: 2,
            text: "Comments:".into(),
        });
        doc.push(Block::NumberedList {
            items: split_comments(&record.comments).map(str::to_string).collect(),
        });
    }

    doc.push(Block::PageBreak);
    Ok(())
}
