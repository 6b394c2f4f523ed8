//! Command-line surface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "devotions")]
#[command(version, about = "Publish and browse daily devotions")]
#[command(propagate_version = true)]
pub struct Cli {
    /// TOML config file; `DEVOTIONS_*` environment variables override it
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show today's published devotion
    Today,

    /// Show the published devotion for a date
    Date {
        /// Day to look up, as YYYY-MM-DD
        date: String,
    },

    /// Show one devotion by id, drafts included
    Show { id: String },

    /// List recent published devotions
    Archive {
        /// Maximum number of devotions
        #[arg(long)]
        limit: Option<u32>,

        /// Gallery page to show, 12 cards per page
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// List every devotion, drafts included
    List {
        /// all, published or unpublished
        #[arg(long, default_value = "all")]
        filter: String,
    },

    /// Print dashboard counters
    Stats,

    /// Create a devotion
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        verse: String,

        /// Body text; use blank lines between paragraphs
        #[arg(long)]
        content: String,

        /// Summary; derived from content when omitted
        #[arg(long)]
        excerpt: Option<String>,

        /// Publish day as YYYY-MM-DD; defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Make the devotion publicly visible
        #[arg(long)]
        publish: bool,
    },

    /// Make a devotion publicly visible
    Publish { id: String },

    /// Hide a devotion from public pages
    Unpublish { id: String },

    /// Permanently delete a devotion
    Delete { id: String },

    /// Print the share title, text and link for a devotion
    Share { id: String },
}

impl Commands {
    /// Subcommand name for log lines; arguments are never logged.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Date { .. } => "date",
            Self::Show { .. } => "show",
            Self::Archive { .. } => "archive",
            Self::List { .. } => "list",
            Self::Stats => "stats",
            Self::Create { .. } => "create",
            Self::Publish { .. } => "publish",
            Self::Unpublish { .. } => "unpublish",
            Self::Delete { .. } => "delete",
            Self::Share { .. } => "share",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::{CommandFactory, Parser};

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_takes_named_fields_and_global_json() {
        let cli = Cli::try_parse_from([
            "devotions",
            "create",
            "--title",
            "Peace",
            "--verse",
            "John 14:27",
            "--content",
            "Peace I leave with you.",
            "--publish",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Create {
                title,
                publish,
                excerpt,
                date,
                ..
            } => {
                assert_eq!(title, "Peace");
                assert!(publish);
                assert_eq!(excerpt, None);
                assert_eq!(date, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn archive_limit_is_optional() {
        let cli = Cli::try_parse_from(["devotions", "archive", "--limit", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Archive {
                limit: Some(5),
                page: 1
            }
        ));
        assert_eq!(cli.command.name(), "archive");
    }

    #[test]
    fn list_filter_defaults_to_all() {
        let cli = Cli::try_parse_from(["devotions", "list"]).unwrap();
        match cli.command {
            Commands::List { filter } => assert_eq!(filter, "all"),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
