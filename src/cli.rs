//! CLI definitions for swarmdeck.
//!
//! Uses clap for argument parsing with derive macros.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// swarmdeck - track swarm campaigns and report on their engagement
#[derive(Parser, Debug)]
#[command(name = "swarmdeck")]
#[command(version)]
#[command(about = "Track swarm campaigns in a CSV table and report on their engagement")]
#[command(long_about = r#"
swarmdeck keeps a table of "swarm" campaigns: coordinated engagement pushes
on a single post, with views, retweets, quotes, likes and bookmarks recorded
before and after the swarm.

Quick start:
  1. Create a table:        swarmdeck init
  2. Record a swarm:        swarmdeck add --week 1 --number 1 --url <post-url> ...
  3. Explore interactively: swarmdeck dashboard
  4. Write a report:        swarmdeck report --output week_1.html --week 1
"#)]
pub struct Cli {
    /// Path to the swarm table (CSV)
    #[arg(long, short = 't', env = "SWARMDECK_TABLE", global = true)]
    pub table: Option<PathBuf>,

    /// Output format [default: text, or `[output] format` from config]
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Be verbose (show debug info)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Be quiet (suppress non-error output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Read configuration from this file instead of the user config
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty swarm table with the standard header
    Init,

    /// Record a new swarm
    Add(AddArgs),

    /// Show one swarm
    Show(ShowArgs),

    /// Change one field of a swarm
    Edit(EditArgs),

    /// List swarms with their first comment
    List,

    /// Show engagement totals, averages and weekly breakdowns
    Summary(SummaryArgs),

    /// Generate a campaign report document (.html, .md or .json)
    Report(ReportArgs),

    /// Open the interactive dashboard
    Dashboard,

    /// Check the table for malformed rows, bad numbers and stale IDs
    Check,

    /// Show or manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Default)]
pub struct AddArgs {
    /// Swarm week
    #[arg(long, short = 'w')]
    pub week: String,

    /// Swarm number within the week
    #[arg(long, short = 'n')]
    pub number: String,

    /// URL of the swarmed post
    #[arg(long)]
    pub url: Option<String>,

    /// Text of the swarmed post
    #[arg(long)]
    pub content: Option<String>,

    /// Image file name of the swarmed post
    #[arg(long)]
    pub image: Option<String>,

    /// Comment left during the swarm (repeatable)
    #[arg(long = "comment", short = 'c', action = ArgAction::Append)]
    pub comments: Vec<String>,

    #[command(flatten)]
    pub starting: StartingArgs,

    #[command(flatten)]
    pub ending: EndingArgs,
}

/// Engagement before the swarm. Numbers may carry a k/m/b suffix.
#[derive(Args, Debug, Default)]
pub struct StartingArgs {
    #[arg(long, help_heading = "Starting engagement")]
    pub views: Option<String>,
    #[arg(long, help_heading = "Starting engagement")]
    pub retweets: Option<String>,
    #[arg(long, help_heading = "Starting engagement")]
    pub quotes: Option<String>,
    #[arg(long, help_heading = "Starting engagement")]
    pub likes: Option<String>,
    #[arg(long, help_heading = "Starting engagement")]
    pub bookmarks: Option<String>,
}

/// Engagement after the swarm.
#[derive(Args, Debug, Default)]
pub struct EndingArgs {
    #[arg(long, help_heading = "Ending engagement")]
    pub ending_views: Option<String>,
    #[arg(long, help_heading = "Ending engagement")]
    pub ending_retweets: Option<String>,
    #[arg(long, help_heading = "Ending engagement")]
    pub ending_quotes: Option<String>,
    #[arg(long, help_heading = "Ending engagement")]
    pub ending_likes: Option<String>,
    #[arg(long, help_heading = "Ending engagement")]
    pub ending_bookmarks: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Swarm ID (SW-<week>-<number>)
    pub id: String,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Swarm ID (SW-<week>-<number>)
    pub id: String,

    /// Field to change (e.g. url, likes, ending-views, comments)
    pub field: String,

    /// New value
    pub value: String,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Week to summarise, or `all`
    #[arg(long, short = 'w', default_value = "all")]
    pub week: String,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Swarm table to report on (prompted when omitted)
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Output document; the extension picks the format (prompted when omitted)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Include each swarm's comments
    #[arg(long, overrides_with = "no_comments")]
    pub comments: bool,

    /// Leave comments out
    #[arg(long)]
    pub no_comments: bool,

    /// Week to report on, or `all` (prompted when omitted)
    #[arg(long, short = 'w')]
    pub week: Option<String>,

    /// Report title [default: derived from the output file name]
    #[arg(long)]
    pub title: Option<String>,

    /// Logo image for the cover
    #[arg(long)]
    pub logo: Option<PathBuf>,
}

impl ReportArgs {
    /// Comments choice from flags; `None` when neither flag was given.
    #[must_use]
    pub const fn comments_choice(&self) -> Option<bool> {
        if self.comments {
            Some(true)
        } else if self.no_comments {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Show current configuration (the default; combine with --path or --init)
    #[arg(long)]
    pub show: bool,

    /// Write a default config file to the user config location
    #[arg(long)]
    pub init: bool,

    /// Print the user config file path
    #[arg(long)]
    pub path: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}
