//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `wrap`: Wrap hardcoded UI text in translation calls
//! - `init`: Initialize a `.twraprc.json` configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};

use crate::config::{Framework, Mode};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Wrap(cmd)) => cmd.verbose,
            Some(Command::Init(_)) | None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct WrapCommand {
    /// Project root (defaults to the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Source glob relative to the root (overrides config file)
    #[arg(long)]
    pub pattern: Option<String>,

    /// Binding injected into components (overrides config file)
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Target framework (overrides config file)
    #[arg(long, value_enum)]
    pub framework: Option<Framework>,

    /// Report what would change without writing any file
    #[arg(long)]
    pub dry_run: bool,

    /// Number of worker threads (defaults to the number of CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Args)]
pub struct InitCommand {
    /// Directory to create the config file in (defaults to the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Wrap hardcoded text in translation calls
    Wrap(WrapCommand),
    /// Initialize a new .twraprc.json configuration file
    Init(InitCommand),
}

#[cfg(test)]
mod tests {
    use crate::cli::args::*;

    #[test]
    fn test_parse_wrap_flags() {
        let args = Arguments::try_parse_from([
            "twrap", "wrap", "--pattern", "app/**/*.tsx", "--mode", "server", "--dry-run",
            "-j", "4", "--format", "json", "-v",
        ])
        .unwrap();
        let Some(Command::Wrap(cmd)) = &args.command else {
            panic!("expected wrap command");
        };
        assert_eq!(cmd.pattern.as_deref(), Some("app/**/*.tsx"));
        assert_eq!(cmd.mode, Some(Mode::Server));
        assert!(cmd.dry_run);
        assert_eq!(cmd.jobs, Some(4));
        assert_eq!(cmd.format, OutputFormat::Json);
        assert!(args.verbose());
    }

    #[test]
    fn test_wrap_defaults() {
        let args = Arguments::try_parse_from(["twrap", "wrap"]).unwrap();
        let Some(Command::Wrap(cmd)) = &args.command else {
            panic!("expected wrap command");
        };
        assert_eq!(cmd.mode, None);
        assert_eq!(cmd.format, OutputFormat::Text);
        assert!(!cmd.dry_run);
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Arguments::try_parse_from(["twrap", "wrap", "--mode", "edge"]).is_err());
    }
}
