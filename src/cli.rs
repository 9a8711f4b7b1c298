// src/cli.rs

use crate::config::{HistoryConfig, DEFAULT_REFERENCE, DEFAULT_SUFFIX};
use crate::logging::LogFormat;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the git repository to analyze
    #[arg(short, long, conflicts_with = "registry")]
    pub repo: Option<PathBuf>,

    /// Directory holding one repository per subdirectory
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Repository name inside --registry
    #[arg(short, long)]
    pub name: Option<String>,

    /// Only files whose path ends with this suffix are considered
    #[arg(long, env = "HISTORY_MODEL_SUFFIX", default_value = DEFAULT_SUFFIX)]
    pub suffix: String,

    /// Reference the commit listing starts from
    #[arg(long = "ref", env = "HISTORY_MODEL_REF", default_value = DEFAULT_REFERENCE)]
    pub reference: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Hide progress bars
    #[arg(short, long)]
    pub quiet: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List commits that changed matching files, newest first
    Commits,
    /// Rebuild the package and type structure at one commit
    Model {
        commit: String,
        /// Print a flat type list instead of the package tree
        #[arg(long)]
        flat: bool,
    },
    /// Rebuild several commits concurrently
    Models {
        #[arg(required = true)]
        commits: Vec<String>,
        #[arg(long)]
        flat: bool,
    },
    /// Which commits touched which files, walking back from TO down to FROM
    History { from: String, to: String },
    /// List the repositories of --registry
    Repos,
}

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum Format {
    /// Indented, human readable
    Text,
    /// Pretty printed JSON
    Json,
}

impl Args {
    pub fn config(&self) -> HistoryConfig {
        HistoryConfig {
            suffix: self.suffix.clone(),
            reference: self.reference.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn argument_definitions_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_history_command() {
        let args = Args::try_parse_from([
            "history-model", "--repo", "/tmp/r", "--suffix", ".kt", "-vv", "history", "abc", "def",
        ])
        .unwrap();

        assert_eq!(args.repo, Some(PathBuf::from("/tmp/r")));
        assert_eq!(args.verbose, 2);
        assert_eq!(args.config().suffix, ".kt");
        assert_eq!(
            args.command,
            Command::History {
                from: "abc".into(),
                to: "def".into()
            }
        );
    }

    #[test]
    fn repo_and_registry_are_exclusive() {
        let parsed = Args::try_parse_from(["history-model", "--repo", "a", "--registry", "b", "commits"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn models_needs_commits() {
        assert!(Args::try_parse_from(["history-model", "--repo", "a", "models"]).is_err());
    }
}
