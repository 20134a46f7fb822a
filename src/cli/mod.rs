//! CLI module for Colaborai.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Colaborai - collaborative study assistant
///
/// Ingest a small set of articles, discuss them with other participants in a
/// shared chat and ask the assistant (`@colaborai`) for cited answers and
/// fixation exercises.
#[derive(Parser, Debug)]
#[command(name = "colaborai")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index PDF or text documents (text pages separated by form feeds)
    Ingest {
        /// Files to ingest
        #[arg(required = true)]
        files: Vec<String>,

        /// Source name recorded in citations (single file only; defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Re-index even if the source is already indexed
        #[arg(short, long)]
        force: bool,
    },

    /// List indexed sources
    Sources,

    /// Ask the assistant a question
    Ask {
        /// The question to ask
        question: String,

        /// Participant asking the question
        #[arg(short, long, default_value = "")]
        user: String,
    },

    /// Join the shared chat; mention @colaborai to call the assistant
    Chat {
        /// Participant name (defaults to the first configured participant)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Ask the assistant for fixation exercises on the discussion
    Exercises {
        /// Focus topic (defaults to an overview of the articles)
        topic: Option<String>,

        /// Participant requesting the exercises
        #[arg(short, long, default_value = "")]
        user: String,
    },

    /// Search the corpus (supports `source: <file>` and `from <file>` filters)
    Search {
        /// Search query
        query: String,
    },

    /// Show the end of the shared conversation log
    History {
        /// Number of lines to show
        #[arg(default_value = "20")]
        lines: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ingest_and_globals() {
        let cli = Cli::parse_from(["colaborai", "-vv", "ingest", "a.txt", "b.txt", "--force"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ingest { files, name, force } => {
                assert_eq!(files, vec!["a.txt", "b.txt"]);
                assert!(name.is_none());
                assert!(force);
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_exercises_defaults() {
        let cli = Cli::parse_from(["colaborai", "exercises"]);
        match cli.command {
            Commands::Exercises { topic, user } => {
                assert!(topic.is_none());
                assert!(user.is_empty());
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }
}
