//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const AFTER_HELP: &str = "\
Quick Start:
  $ autocommand run -e .go -- go build ./...        # rebuild on every .go change
  $ autocommand run -d src -d lib -e rs -- cargo test
  $ autocommand init                                # write .autocommand/settings.toml
  $ autocommand config                              # show effective settings";

#[derive(Parser, Debug)]
#[command(
    name = "autocommand",
    version,
    about = "Run a command whenever watched source files change",
    styles = clap_cargo_style(),
    after_help = AFTER_HELP
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch directories and run a command after changes settle
    Run {
        /// Root directory to watch recursively (repeatable, overrides config)
        #[arg(short = 'd', long = "dir", value_name = "DIR")]
        dirs: Vec<PathBuf>,

        /// File extension that counts as a change, e.g. `.go` (repeatable, overrides config)
        #[arg(short = 'e', long = "ext", value_name = "EXT")]
        exts: Vec<String>,

        /// Command and arguments to run (overrides config)
        #[arg(last = true, value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Create .autocommand/settings.toml in the current directory
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_trailing_command() {
        let cli = Cli::try_parse_from([
            "autocommand", "run", "-d", "src", "--dir", "lib", "-e", ".go", "--", "go", "build",
            "-v",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                dirs,
                exts,
                command,
            } => {
                assert_eq!(dirs, vec![PathBuf::from("src"), PathBuf::from("lib")]);
                assert_eq!(exts, vec![".go"]);
                assert_eq!(command, vec!["go", "build", "-v"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_init_force() {
        let cli = Cli::try_parse_from(["autocommand", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { force: true }));
    }
}
