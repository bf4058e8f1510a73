//! swarmdeck - swarm campaign tracking CLI
//!
//! Main entry point for the swarmdeck command-line tool.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::generate;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use swarmdeck::aggregate::{available_weeks, require_week, split_comments};
use swarmdeck::dashboard::{self, format_list, format_record};
use swarmdeck::doctor::{self, CheckStatus, HealthCheck};
use swarmdeck::logging::{OperationGuard, init_cli_logging};
use swarmdeck::report::{self, ReportOptions};
use swarmdeck::{
    AggregateReport, BlankPolicy, Cli, Commands, Config, CsvStore, DocumentFormat, Field,
    HEADER_DIVIDER_WIDTH, Metric, OutputFormat, RecordStore, SwarmDraft, SwarmError, WeekFilter,
    cli, format_count, format_magnitude, write_document,
};

fn main() {
    let cli = Cli::parse();
    let colors = std::env::var_os("NO_COLOR").is_none();
    init_cli_logging(cli.quiet, cli.verbose, colors);

    if let Err(err) = run(&cli) {
        eprintln!("{} {err:#}", "Error:".red().bold());
        if let Some(hint) = err.downcast_ref::<SwarmError>().and_then(SwarmError::suggestion) {
            eprintln!("  {} {hint}", "Hint:".cyan());
        }
        std::process::exit(1);
    }
}

/// Settings resolved from flags, environment and config file.
struct Settings {
    config: Config,
    table: PathBuf,
    format: OutputFormat,
    quiet: bool,
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    if !config.output.colors {
        colored::control::set_override(false);
    }

    let format = cli.format.unwrap_or_else(|| {
        OutputFormat::from_str(&config.output.format, true).unwrap_or_else(|_| {
            warn!(format = %config.output.format, "Unknown output format in config; using text");
            OutputFormat::Text
        })
    });
    let ctx = Settings {
        table: cli.table.clone().unwrap_or_else(|| config.table_path()),
        config,
        format,
        quiet: cli.quiet,
    };
    debug!(table = %ctx.table.display(), ?format, "Resolved settings");

    match &cli.command {
        Commands::Init => cmd_init(&ctx),
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Show(args) => cmd_show(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::List => cmd_list(&ctx),
        Commands::Summary(args) => cmd_summary(&ctx, args),
        Commands::Report(args) => cmd_report(&ctx, args),
        Commands::Dashboard => Ok(dashboard::run(CsvStore::new(&ctx.table))?),
        Commands::Check => cmd_check(&ctx),
        Commands::Config(args) => cmd_config(&ctx, args),
        Commands::Completions(args) => cmd_completions(args.clone()),
    }
}

fn print_json<T: Serialize>(format: OutputFormat, value: &T) -> Result<()> {
    let json = if format == OutputFormat::JsonPretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

fn is_json(format: OutputFormat) -> bool {
    matches!(format, OutputFormat::Json | OutputFormat::JsonPretty)
}

fn cmd_init(ctx: &Settings) -> Result<()> {
    let store = CsvStore::new(&ctx.table);
    let created = store.initialize()?;

    if is_json(ctx.format) {
        return print_json(
            ctx.format,
            &serde_json::json!({ "path": ctx.table, "created": created }),
        );
    }
    if created {
        println!("{} {}", "Created".green(), ctx.table.display());
    } else {
        println!(
            "{} {} already has data; left unchanged",
            "•".dimmed(),
            ctx.table.display()
        );
    }
    Ok(())
}

fn cmd_add(ctx: &Settings, args: &cli::AddArgs) -> Result<()> {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let mut draft = SwarmDraft {
        week: args.week.clone(),
        number: args.number.clone(),
        url: text(&args.url),
        tweet_content: text(&args.content),
        tweet_image: text(&args.image),
        comments: args.comments.join("\n"),
        ..SwarmDraft::default()
    };
    let s = &args.starting;
    let e = &args.ending;
    for (metric, start, end) in [
        (Metric::Views, &s.views, &e.ending_views),
        (Metric::Retweets, &s.retweets, &e.ending_retweets),
        (Metric::Quotes, &s.quotes, &e.ending_quotes),
        (Metric::Likes, &s.likes, &e.ending_likes),
        (Metric::Bookmarks, &s.bookmarks, &e.ending_bookmarks),
    ] {
        draft.set(Field::Starting(metric), text(start));
        draft.set(Field::Ending(metric), text(end));
    }

    let id = CsvStore::new(&ctx.table).append(draft)?;

    if is_json(ctx.format) {
        return print_json(ctx.format, &serde_json::json!({ "id": id }));
    }
    println!("{} {}", "Added".green(), id.bold());
    Ok(())
}

fn cmd_show(ctx: &Settings, args: &cli::ShowArgs) -> Result<()> {
    let record = CsvStore::new(&ctx.table).find_by_identifier(&args.id)?;
    if is_json(ctx.format) {
        return print_json(ctx.format, &record);
    }
    println!("{}", format_record(&record));
    Ok(())
}

fn cmd_edit(ctx: &Settings, args: &cli::EditArgs) -> Result<()> {
    let field: Field = args.field.parse()?;
    let store = CsvStore::new(&ctx.table);
    store.update_field(&args.id, field, &args.value)?;

    if is_json(ctx.format) {
        return print_json(
            ctx.format,
            &serde_json::json!({ "id": args.id, "field": field.key(), "value": args.value }),
        );
    }
    println!(
        "{} {} of {}",
        "Updated".green(),
        field.header_name(),
        args.id.bold()
    );
    if matches!(field, Field::Week | Field::Number) && !ctx.quiet {
        println!(
            "  {} The swarm keeps ID {}; 'swarmdeck check' lists IDs that no longer match.",
            "Note:".cyan(),
            args.id
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct ListEntry<'a> {
    id: &'a str,
    week: &'a str,
    number: &'a str,
    url: &'a str,
    first_comment: Option<&'a str>,
    comment_count: usize,
}

fn cmd_list(ctx: &Settings) -> Result<()> {
    let records = CsvStore::new(&ctx.table).load_all()?;

    if is_json(ctx.format) {
        let entries: Vec<ListEntry<'_>> = records
            .iter()
            .map(|r| ListEntry {
                id: &r.id,
                week: &r.week,
                number: &r.number,
                url: &r.url,
                first_comment: split_comments(&r.comments).next(),
                comment_count: split_comments(&r.comments).count(),
            })
            .collect();
        return print_json(ctx.format, &entries);
    }
    println!("{}", format_list(&records));
    Ok(())
}

fn cmd_summary(ctx: &Settings, args: &cli::SummaryArgs) -> Result<()> {
    let records = CsvStore::new(&ctx.table).load_all()?;
    let filter = WeekFilter::parse(&args.week);
    require_week(&records, &filter)?;
    let summary = AggregateReport::compute(&records, &filter, BlankPolicy::Zero)?;

    if is_json(ctx.format) {
        return print_json(ctx.format, &summary);
    }

    let scope = match &filter {
        WeekFilter::All => "All Weeks".to_string(),
        WeekFilter::Week(week) => format!("Week {week}"),
    };
    println!("{}", format!("Swarm Summary: {scope}").bold().cyan());
    println!("{}", "─".repeat(HEADER_DIVIDER_WIDTH));
    println!("  {:<20} {:>10}", "Swarms:", format_count(summary.record_count));
    println!("  {:<20} {:>10}", "Comments:", format_count(summary.comment_count));
    println!();

    println!(
        "  {:<12} {:>10} {:>10} {:>10} {:>10} {:>9}",
        "", "Starting", "Ending", "Added", "Average", "Change"
    );
    for metric in Metric::ALL {
        println!(
            "  {:<12} {:>10} {:>10} {:>10} {:>10} {:>9}",
            metric.label(),
            format_magnitude(summary.starting_totals[&metric]),
            format_magnitude(summary.ending_totals[&metric]),
            format_magnitude(summary.total_deltas[&metric]),
            format_magnitude(summary.average_deltas[&metric]),
            summary.percentage_changes[&metric]
        );
    }

    if !summary.weeks.is_empty() {
        println!();
        println!("{}", "By week".bold());
        println!(
            "  {:<8} {:>7} {:>9} {:>10} {:>10} {:>10}",
            "Week", "Swarms", "Comments", "Initial", "Ending", "+Views"
        );
        for week in &summary.weeks {
            println!(
                "  {:<8} {:>7} {:>9} {:>10} {:>10} {:>10}",
                week.week.to_string(),
                week.record_count,
                week.comment_count,
                format_magnitude(week.initial_total),
                format_magnitude(week.ending_total),
                format_magnitude(week.deltas[&Metric::Views])
            );
        }
    }
    println!("{}", "─".repeat(HEADER_DIVIDER_WIDTH));
    Ok(())
}

/// Ask a question on stderr and read one line from stdin.
fn prompt(question: &str) -> Result<String> {
    eprint!("{question}");
    io::stderr().flush()?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        anyhow::bail!("no answer given for: {}", question.trim_end_matches([':', ' ']));
    }
    Ok(line.trim().to_string())
}

/// Ask until the answer is yes or no (any case).
fn prompt_yes_no(question: &str) -> Result<bool> {
    loop {
        match prompt(question)?.to_lowercase().as_str() {
            "yes" | "y" => return Ok(true),
            "no" | "n" => return Ok(false),
            _ => eprintln!("Please answer yes or no."),
        }
    }
}

fn resolve_input(ctx: &Settings, args: &cli::ReportArgs) -> Result<PathBuf> {
    if let Some(input) = &args.input {
        return Ok(input.clone());
    }
    let answer = prompt(&format!("Swarm table [{}]: ", ctx.table.display()))?;
    Ok(if answer.is_empty() {
        ctx.table.clone()
    } else {
        PathBuf::from(answer)
    })
}

fn resolve_output(args: &cli::ReportArgs) -> Result<PathBuf> {
    if let Some(output) = &args.output {
        return Ok(output.clone());
    }
    loop {
        let answer = prompt("Report file (.html, .md or .json): ")?;
        if !answer.is_empty() {
            return Ok(PathBuf::from(answer));
        }
    }
}

fn cmd_report(ctx: &Settings, args: &cli::ReportArgs) -> Result<()> {
    let input = resolve_input(ctx, args)?;
    let output = resolve_output(args)?;
    let format = DocumentFormat::from_path(&output)?;

    let include_comments = match args.comments_choice().or(ctx.config.report.include_comments) {
        Some(choice) => choice,
        None => prompt_yes_no("Include comments? (yes/no): ")?,
    };

    let records = CsvStore::new(&input)
        .load_all()
        .with_context(|| format!("Failed to load swarm table {}", input.display()))?;

    let filter = match &args.week {
        Some(week) => WeekFilter::parse(week),
        None => {
            let weeks: Vec<String> = available_weeks(&records)
                .iter()
                .map(ToString::to_string)
                .collect();
            eprintln!("Available weeks: {}", weeks.join(", "));
            WeekFilter::parse(&prompt("Week to report on ('all' or a week): ")?)
        }
    };
    require_week(&records, &filter)?;

    let mut options: ReportOptions = ctx.config.report_options(&output);
    options.include_comments = include_comments;
    if let Some(title) = &args.title {
        options.title.clone_from(title);
    }
    if let Some(logo) = &args.logo {
        options.logo = Some(logo.clone());
    }

    let selected = filter.apply(&records).len();
    let pb = if ctx.quiet || is_json(ctx.format) {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(selected as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let guard = OperationGuard::new(format!("report {}", output.display()));
    let document = match report::assemble_with_progress(&records, &filter, &options, |record| {
        pb.set_message(record.id.clone());
        pb.inc(1);
    })
    .and_then(|document| write_document(&document, &output).map(|()| document))
    {
        Ok(document) => {
            guard.complete();
            document
        }
        Err(e) => {
            pb.finish_and_clear();
            guard.fail(&e);
            return Err(e.into());
        }
    };
    pb.finish_and_clear();

    if is_json(ctx.format) {
        return print_json(
            ctx.format,
            &serde_json::json!({
                "output": output,
                "format": format!("{format:?}").to_lowercase(),
                "week": filter.to_string(),
                "swarms": selected,
                "charts": document.chart_count(),
            }),
        );
    }
    println!(
        "{} {} ({} swarms, {} charts)",
        "Report written to".green(),
        output.display().to_string().bold(),
        selected,
        document.chart_count()
    );
    Ok(())
}

fn status_icon(status: CheckStatus) -> colored::ColoredString {
    match status {
        CheckStatus::Pass => "✓".green(),
        CheckStatus::Warning => "⚠".yellow(),
        CheckStatus::Error => "✗".red(),
    }
}

fn print_checks(checks: &[HealthCheck]) {
    for check in checks {
        println!(
            "  {} {}: {}",
            status_icon(check.status),
            check.name.bold(),
            check.message
        );
        if let Some(suggestion) = &check.suggestion {
            println!("      {}", suggestion.dimmed());
        }
    }
}

fn cmd_check(ctx: &Settings) -> Result<()> {
    let checks = doctor::check_table(&CsvStore::new(&ctx.table))?;
    let overall = doctor::overall_status(&checks);

    if is_json(ctx.format) {
        print_json(
            ctx.format,
            &serde_json::json!({ "status": overall, "checks": checks }),
        )?;
    } else {
        println!("{}", format!("Checking {}", ctx.table.display()).bold().cyan());
        print_checks(&checks);
        let summary = match overall {
            CheckStatus::Pass => "All checks passed".green(),
            CheckStatus::Warning => "Checks passed with warnings".yellow(),
            CheckStatus::Error => "Problems found".red(),
        };
        println!("{summary}");
    }

    if overall == CheckStatus::Error {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_config(ctx: &Settings, args: &cli::ConfigArgs) -> Result<()> {
    let user_path = Config::user_config_path();

    if args.path {
        match &user_path {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("Could not determine the config directory"),
        }
        if !args.show {
            return Ok(());
        }
    }

    if args.init {
        let path: &Path = user_path
            .as_deref()
            .context("Could not determine the config directory")?;
        if path.exists() {
            println!("{} {} already exists", "•".dimmed(), path.display());
        } else {
            Config::default().save(path)?;
            println!("{} {}", "Wrote".green(), path.display());
        }
        if !args.show {
            return Ok(());
        }
    }

    if is_json(ctx.format) {
        return print_json(ctx.format, &ctx.config);
    }
    println!("{}", "Current Configuration".bold().cyan());
    println!("  Table: {}", ctx.table.display());
    if let Some(path) = &user_path {
        println!("  Config file: {}", path.display());
    }
    println!();
    print!("{}", toml::to_string_pretty(&ctx.config)?);
    Ok(())
}

fn cmd_completions(args: cli::CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "swarmdeck", &mut io::stdout());
    Ok(())
}
