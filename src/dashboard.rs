//! Interactive dashboard for a swarm table.
//!
//! A command shell with history: shows weekly charts on start, then adds,
//! edits and lists swarms. Every command reloads the table from disk and
//! each new swarm is collected into its own [`SwarmDraft`].

use crate::aggregate::{
    AggregateReport, BlankPolicy, group_by_week, metric_value, require_week, split_comments,
};
use crate::chart::{BarChart, ChartRenderer, TextChartRenderer};
use crate::error::{Result, SwarmError, find_closest_match, format_did_you_mean};
use crate::model::{Field, Metric, SwarmDraft, SwarmRecord, WeekFilter};
use crate::store::RecordStore;
use crate::truncate_text;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, EditMode, Editor};
use std::fmt::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const CONTENT_WIDTH: usize = 72;
const LIST_WIDTH: usize = 60;

/// Source of answers for multi-step prompts.
pub trait Prompter {
    /// Ask one question. `None` means the user cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error when input cannot be read.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl Prompter for Editor<(), DefaultHistory> {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add,
    Edit { id: String, field: Field, value: String },
    Show { id: String },
    List,
    Summary { filter: WeekFilter },
    Help { command: Option<String> },
    Quit,
}

const COMMANDS: &[&str] = &["add", "edit", "show", "list", "summary", "help", "quit"];

/// Parse one line of dashboard input.
///
/// # Errors
///
/// Returns [`SwarmError::InvalidArgument`] for unknown commands, unknown
/// field names, or missing arguments.
pub fn parse_command(input: &str) -> Result<Command> {
    let (name, rest) = next_word(input);
    if name.is_empty() {
        return Err(SwarmError::invalid_argument("empty command"));
    }
    let args: Vec<&str> = rest.split_whitespace().collect();

    match name {
        "add" | "a" => Ok(Command::Add),
        "edit" | "e" => parse_edit(rest),
        "show" => match args.as_slice() {
            [id] => Ok(Command::Show {
                id: (*id).to_string(),
            }),
            _ => Err(SwarmError::invalid_argument("usage: show <id>")),
        },
        "list" | "ls" => Ok(Command::List),
        "summary" | "s" => Ok(Command::Summary {
            filter: args.first().map_or(WeekFilter::All, |w| WeekFilter::parse(w)),
        }),
        "help" | "h" | "?" => Ok(Command::Help {
            command: args.first().map(ToString::to_string),
        }),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => {
            let hint = find_closest_match(other, COMMANDS, None)
                .map(|s| format!(" {}", format_did_you_mean(s)))
                .unwrap_or_default();
            Err(SwarmError::invalid_argument(format!(
                "unknown command '{other}'.{hint} Type 'help' for available commands."
            )))
        }
    }
}

/// Split off the first word; the remainder starts after its single
/// separating whitespace character.
fn next_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(end) => {
            let sep = input[end..].chars().next().map_or(1, char::len_utf8);
            (&input[..end], &input[end + sep..])
        }
        None => (input, ""),
    }
}

/// `edit <id> <field> [value]`: the value is the rest of the line as typed.
/// A missing value or `""` clears the field.
fn parse_edit(rest: &str) -> Result<Command> {
    let (id, rest) = next_word(rest);
    let (field, value) = next_word(rest);
    if id.is_empty() || field.is_empty() {
        return Err(SwarmError::invalid_argument(
            "usage: edit <id> <field> [value...]",
        ));
    }

    let value = match value.trim() {
        "" | "\"\"" => "",
        _ => value,
    };
    Ok(Command::Edit {
        id: id.to_string(),
        field: field.parse()?,
        value: value.to_string(),
    })
}

/// What the shell should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

/// A dashboard bound to one table.
pub struct Dashboard<S> {
    store: S,
    charts: TextChartRenderer,
}

impl<S: RecordStore> Dashboard<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            charts: TextChartRenderer::default(),
        }
    }

    /// Run one parsed command. Store errors propagate and leave the table
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns store, validation and format errors.
    pub fn execute<P: Prompter>(&self, command: Command, prompter: &mut P) -> Result<Outcome> {
        let output = match command {
            Command::Add => match read_draft(prompter)? {
                Some(draft) => {
                    let id = self.store.append(draft)?;
                    info!(%id, "Added swarm");
                    format!("{} {}", "Added".green(), id.bold())
                }
                None => "Cancelled.".to_string(),
            },
            Command::Edit { id, field, value } => {
                self.store.update_field(&id, field, &value)?;
                info!(%id, field = field.key(), "Updated swarm");
                format!("{} {} of {}", "Updated".green(), field.header_name(), id)
            }
            Command::Show { id } => format_record(&self.store.find_by_identifier(&id)?),
            Command::List => format_list(&self.store.load_all()?),
            Command::Summary { filter } => self.summary(&filter)?,
            Command::Help { command } => help_text(command.as_deref()),
            Command::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Continue(output))
    }

    /// Totals and weekly text charts for the records a filter selects.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidArgument`] for a week not in the table,
    /// and format errors for non-numeric metrics.
    pub fn summary(&self, filter: &WeekFilter) -> Result<String> {
        let records = self.store.load_all()?;
        require_week(&records, filter)?;
        let aggregate = AggregateReport::compute(&records, filter, BlankPolicy::Zero)?;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}",
            format!("Total Number of Swarms: {}", aggregate.record_count).bold()
        );
        let _ = writeln!(
            out,
            "{}",
            format!("Total Number of Comments: {}", aggregate.comment_count).bold()
        );
        let _ = writeln!(out);

        for chart in self.dashboard_charts(&records, &aggregate, filter)? {
            let _ = writeln!(out, "{}", self.charts.render(&chart));
        }
        Ok(out.trim_end().to_string())
    }

    #[allow(clippy::cast_precision_loss)]
    fn dashboard_charts(
        &self,
        records: &[SwarmRecord],
        aggregate: &AggregateReport,
        filter: &WeekFilter,
    ) -> Result<Vec<BarChart>> {
        let chart = |title: String, bars| BarChart::new(title, "Week", "", "", bars);

        let mut charts = vec![chart(
            "Swarms per Week".into(),
            aggregate.per_week(|w| w.record_count as f64),
        )];

        let selected = filter.apply(records);
        let groups = group_by_week(&selected);
        for field in [
            Field::Starting(Metric::Views),
            Field::Ending(Metric::Views),
        ] {
            let bars = groups
                .iter()
                .map(|(week, members)| {
                    let total = members
                        .iter()
                        .map(|r| metric_value(r, field, BlankPolicy::Zero))
                        .sum::<Result<f64>>()?;
                    Ok((week.to_string(), total))
                })
                .collect::<Result<Vec<_>>>()?;
            let title = match field {
                Field::Starting(_) => "Starting Views per Week",
                _ => "Ending Views per Week",
            };
            charts.push(chart(title.into(), bars));
        }

        for metric in Metric::ALL {
            charts.push(chart(
                format!("Additional {metric} per Week"),
                aggregate.per_week(|w| w.deltas[&metric]),
            ));
        }
        Ok(charts)
    }
}

/// Collect a new swarm field by field. Comments are read one per line until
/// a blank line.
///
/// # Errors
///
/// Returns an error when input cannot be read.
pub fn read_draft<P: Prompter>(prompter: &mut P) -> Result<Option<SwarmDraft>> {
    let mut draft = SwarmDraft::default();
    for field in Field::editable() {
        let value = if field == Field::Comments {
            let mut comments = Vec::new();
            loop {
                let Some(line) = prompter.ask("Comment (blank line to finish): ")? else {
                    return Ok(None);
                };
                if line.trim().is_empty() {
                    break;
                }
                comments.push(line.trim().to_string());
            }
            comments.join("\n")
        } else {
            let Some(line) = prompter.ask(&format!("{}: ", field.header_name()))? else {
                return Ok(None);
            };
            line.trim().to_string()
        };
        draft.set(field, value);
    }
    debug!(week = %draft.week, number = %draft.number, "Collected swarm draft");
    Ok(Some(draft))
}

/// Multi-line view of one swarm.
#[must_use]
pub fn format_record(record: &SwarmRecord) -> String {
    let mut out = format!("{}\n", record.id.bold().cyan());
    let _ = writeln!(out, "  {:<18} {}", "Week:", record.week);
    let _ = writeln!(out, "  {:<18} {}", "Number:", record.number);
    let _ = writeln!(out, "  {:<18} {}", "URL:", record.url);
    let _ = writeln!(out, "  {:<18} {}", "Image:", record.tweet_image);
    if !record.tweet_content.trim().is_empty() {
        let _ = writeln!(out, "  Content:");
        let wrapped = textwrap::fill(&record.tweet_content, CONTENT_WIDTH);
        let _ = writeln!(out, "{}", textwrap::indent(&wrapped, "    "));
    }

    let _ = writeln!(out, "  {:<12} {:>10} {:>10}", "", "Starting", "Ending");
    for metric in Metric::ALL {
        let _ = writeln!(
            out,
            "  {:<12} {:>10} {:>10}",
            metric.label(),
            record.starting.get(metric),
            record.ending.get(metric)
        );
    }

    let comments: Vec<&str> = split_comments(&record.comments).collect();
    if !comments.is_empty() {
        let _ = writeln!(out, "  Comments:");
        for (idx, comment) in comments.iter().enumerate() {
            let _ = writeln!(out, "  {:>3}. {comment}", idx + 1);
        }
    }
    out.trim_end().to_string()
}

/// One line per swarm: identifier, first comment, count of the rest.
#[must_use]
pub fn format_list(records: &[SwarmRecord]) -> String {
    if records.is_empty() {
        return "No swarms yet. Use 'add' to create one.".to_string();
    }
    records
        .iter()
        .map(|record| {
            let mut comments = split_comments(&record.comments);
            let first = comments
                .next()
                .map_or_else(|| "(no comments)".to_string(), |c| truncate_text(c, LIST_WIDTH));
            let rest = comments.count();
            if rest > 0 {
                format!("{}: {first} {}", record.id, format!("(+{rest} more)").dimmed())
            } else {
                format!("{}: {first}", record.id)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn help_text(command: Option<&str>) -> String {
    match command {
        Some("add") => "add                       - enter a new swarm field by field".into(),
        Some("edit") => format!(
            "edit <id> <field> [value] - change one field (no value clears it)\n  fields: {}",
            Field::editable().map(Field::key).collect::<Vec<_>>().join(", ")
        ),
        Some("show") => "show <id>                 - show one swarm".into(),
        Some("list") => "list                      - identifiers and first comments".into(),
        Some("summary") => "summary [week|all]        - totals and weekly charts".into(),
        Some("quit" | "exit") => "quit                      - leave the dashboard".into(),
        _ => [
            "Commands:".bold().cyan().to_string(),
            "  add                       - enter a new swarm".into(),
            "  edit <id> <field> [value] - change one field (help edit lists fields)".into(),
            "  show <id>                 - show one swarm".into(),
            "  list                      - identifiers and first comments".into(),
            "  summary [week|all]        - totals and weekly charts".into(),
            "  help [command]            - show help".into(),
            "  quit                      - exit".into(),
        ]
        .join("\n"),
    }
}

/// Run the dashboard shell until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if the table cannot be created or read, or if readline
/// setup or history persistence fails.
pub fn run<S: RecordStore>(store: S) -> Result<()> {
    if store.initialize()? {
        println!("{}", "Created a new swarm table.".dimmed());
    }
    let dashboard = Dashboard::new(store);

    let config = Config::builder()
        .history_ignore_space(true)
        .history_ignore_dups(true)?
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".swarmdeck_history");
    let _ = rl.load_history(&history_path);

    info!("Starting dashboard session");
    match dashboard.summary(&WeekFilter::All) {
        Ok(summary) => println!("{summary}\n"),
        Err(e) => eprintln!("{}: {e}", "Error".red()),
    }
    println!(
        "{}",
        "Type 'help' for commands, 'quit' to exit.".cyan()
    );

    loop {
        let line = match rl.readline("swarmdeck> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line)?;

        debug!(command = %line, "Dashboard command");
        let result = parse_command(line).and_then(|command| dashboard.execute(command, &mut rl));
        match result {
            Ok(Outcome::Continue(output)) => println!("{output}"),
            Ok(Outcome::Quit) => break,
            Err(e) => {
                warn!(error = %e, "Dashboard command failed");
                eprintln!("{}: {e}", "Error".red());
                if let Some(hint) = e.suggestion() {
                    eprintln!("  {hint}");
                }
            }
        }
    }

    if let Err(e) = rl.save_history(&history_path) {
        debug!(error = %e, "Could not save history");
    }
    info!("Ended dashboard session");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CsvStore;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    struct Scripted(VecDeque<&'static str>);

    impl Prompter for Scripted {
        fn ask(&mut self, _prompt: &str) -> Result<Option<String>> {
            Ok(self.0.pop_front().map(ToString::to_string))
        }
    }

    fn scripted(answers: &[&'static str]) -> Scripted {
        Scripted(answers.iter().copied().collect())
    }

    const NEW_SWARM: &[&str] = &[
        "3",
        "7",
        "https://x.com/lbc/status/1",
        "Listen live",
        "show.png",
        "1k",
        "10",
        "1",
        "20",
        "2",
        "  first  ",
        "second",
        "",
        "3k",
        "30",
        "4",
        "60",
        "5",
    ];

    fn dashboard() -> (TempDir, Dashboard<CsvStore>) {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::new(dir.path().join("swarms.csv"));
        store.initialize().unwrap();
        (dir, Dashboard::new(store))
    }

    fn output(outcome: Outcome) -> String {
        match outcome {
            Outcome::Continue(text) => text,
            Outcome::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("add").unwrap(), Command::Add);
        assert_eq!(parse_command("  q ").unwrap(), Command::Quit);
        assert_eq!(
            parse_command("edit SW-1-1 ending-likes 1.2k").unwrap(),
            Command::Edit {
                id: "SW-1-1".into(),
                field: Field::Ending(Metric::Likes),
                value: "1.2k".into(),
            }
        );
        assert_eq!(
            parse_command("edit SW-1-1 content Listen   live  now").unwrap(),
            Command::Edit {
                id: "SW-1-1".into(),
                field: Field::TweetContent,
                value: "Listen   live  now".into(),
            }
        );
        assert_eq!(
            parse_command("summary 2").unwrap(),
            Command::Summary {
                filter: WeekFilter::parse("2")
            }
        );
        assert_eq!(
            parse_command("summary").unwrap(),
            Command::Summary {
                filter: WeekFilter::All
            }
        );
    }

    #[test]
    fn rejects_bad_commands() {
        assert!(parse_command("").is_err());
        assert!(parse_command("edit SW-1-1").is_err());
        assert!(parse_command("show").is_err());

        let err = parse_command("lsit").unwrap_err().to_string();
        assert!(err.contains("list"), "{err}");

        let err = parse_command("edit SW-1-1 viwes 5").unwrap_err();
        assert!(matches!(err, SwarmError::InvalidArgument { .. }));
    }

    #[test]
    fn add_collects_every_field() {
        let draft = read_draft(&mut scripted(NEW_SWARM)).unwrap().unwrap();
        assert_eq!(draft.week, "3");
        assert_eq!(draft.tweet_image, "show.png");
        assert_eq!(draft.starting.likes, "20");
        assert_eq!(draft.comments, "first\nsecond");
        assert_eq!(draft.ending.bookmarks, "5");
    }

    #[test]
    fn cancelled_add_returns_none() {
        assert_eq!(read_draft(&mut scripted(&["3", "7"])).unwrap(), None);
    }

    #[test]
    fn add_then_show_and_list() {
        let (_dir, dashboard) = dashboard();
        let added = output(dashboard.execute(Command::Add, &mut scripted(NEW_SWARM)).unwrap());
        assert!(added.contains("SW-3-7"));

        let shown = output(
            dashboard
                .execute(Command::Show { id: "SW-3-7".into() }, &mut scripted(&[]))
                .unwrap(),
        );
        assert!(shown.contains("https://x.com/lbc/status/1"));
        assert!(shown.contains("Listen live"));
        assert!(shown.contains("  1. first"));

        let listed = output(dashboard.execute(Command::List, &mut scripted(&[])).unwrap());
        assert!(listed.starts_with("SW-3-7: first"));
        assert!(listed.contains("+1 more"));
    }

    #[test]
    fn edit_failures_leave_table_unchanged() {
        let (dir, dashboard) = dashboard();
        dashboard.execute(Command::Add, &mut scripted(NEW_SWARM)).unwrap();
        let path = dir.path().join("swarms.csv");
        let before = std::fs::read(&path).unwrap();

        let missing = Command::Edit {
            id: "SW-9-9".into(),
            field: Field::Url,
            value: "x".into(),
        };
        let err = dashboard.execute(missing, &mut scripted(&[])).unwrap_err();
        assert!(matches!(err, SwarmError::NotFound { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), before);

        let id_edit = Command::Edit {
            id: "SW-3-7".into(),
            field: Field::Id,
            value: "SW-1-1".into(),
        };
        assert!(dashboard.execute(id_edit, &mut scripted(&[])).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn edit_updates_a_field() {
        let (_dir, dashboard) = dashboard();
        dashboard.execute(Command::Add, &mut scripted(NEW_SWARM)).unwrap();
        let command = parse_command("edit SW-3-7 ending-views 4.5k").unwrap();
        dashboard.execute(command, &mut scripted(&[])).unwrap();
        let shown = output(
            dashboard
                .execute(Command::Show { id: "SW-3-7".into() }, &mut scripted(&[]))
                .unwrap(),
        );
        assert!(shown.contains("4.5k"));
    }

    #[test]
    fn edit_value_is_kept_as_typed() {
        let value_of = |line: &str| match parse_command(line).unwrap() {
            Command::Edit { value, .. } => value,
            other => panic!("expected edit, got {other:?}"),
        };
        assert_eq!(value_of("edit SW-1-1 likes"), "");
        assert_eq!(value_of("edit SW-1-1 likes \"\""), "");
        assert_eq!(value_of("edit  SW-1-1   likes 2k"), "2k");
        assert_eq!(value_of("e SW-1-1 image a  b.png "), "a  b.png ");
    }

    #[test]
    fn edit_keeps_spacing_and_clears_fields() {
        let (_dir, dashboard) = dashboard();
        dashboard.execute(Command::Add, &mut scripted(NEW_SWARM)).unwrap();

        let spaced = parse_command("edit SW-3-7 content Listen   live  now").unwrap();
        dashboard.execute(spaced, &mut scripted(&[])).unwrap();
        let cleared = parse_command("edit SW-3-7 ending-likes").unwrap();
        dashboard.execute(cleared, &mut scripted(&[])).unwrap();

        let record = dashboard.store.find_by_identifier("SW-3-7").unwrap();
        assert_eq!(record.tweet_content, "Listen   live  now");
        assert_eq!(record.ending.likes, "");
        assert_eq!(record.ending.bookmarks, "5");
    }

    #[test]
    fn summary_shows_totals_and_charts() {
        let (_dir, dashboard) = dashboard();
        dashboard.execute(Command::Add, &mut scripted(NEW_SWARM)).unwrap();
        let summary = dashboard.summary(&WeekFilter::All).unwrap();
        assert!(summary.contains("Total Number of Swarms: 1"));
        assert!(summary.contains("Total Number of Comments: 2"));
        assert!(summary.contains("Swarms per Week"));
        assert!(summary.contains("Starting Views per Week"));
        assert!(summary.contains("Additional Bookmarks per Week"));
        assert!(summary.contains("3 │"));
    }

    #[test]
    fn summary_rejects_unknown_week() {
        let (_dir, dashboard) = dashboard();
        dashboard.execute(Command::Add, &mut scripted(NEW_SWARM)).unwrap();
        let err = dashboard.summary(&WeekFilter::parse("4")).unwrap_err();
        assert!(err.to_string().contains("Available weeks: 3"));
    }

    #[test]
    fn empty_table_lists_nothing() {
        let (_dir, dashboard) = dashboard();
        let listed = output(dashboard.execute(Command::List, &mut scripted(&[])).unwrap());
        assert!(listed.starts_with("No swarms yet"));
        assert_eq!(
            dashboard.execute(Command::Quit, &mut scripted(&[])).unwrap(),
            Outcome::Quit
        );
    }

    #[test]
    fn list_shortens_long_first_comment() {
        let record = SwarmRecord {
            id: "SW-1-1".into(),
            comments: "x".repeat(100),
            ..SwarmRecord::default()
        };
        let listed = format_list(&[record]);
        assert!(listed.ends_with("..."));
        assert_eq!(listed.chars().count(), "SW-1-1: ".len() + LIST_WIDTH);
    }

    #[test]
    fn help_lists_fields_for_edit() {
        let help = help_text(Some("edit"));
        assert!(help.contains("ending-bookmarks"));
        assert!(!help.contains(" id,"));
    }
}
