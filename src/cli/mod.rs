//! Command-line surface for the `genie` binary.

pub mod commands;
pub mod console;
pub mod interrupt;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Genie console
#[derive(Parser, Debug)]
#[command(
    name = "genie",
    version,
    about = "Query the Genie API directly or through a hosted agent"
)]
pub struct Cli {
    /// Settings file (defaults to ./appsettings.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Without a command the interactive menu is shown
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run one Genie conversation and print the result
    Ask {
        /// Natural-language question for Genie
        prompt: String,
    },
    /// Chat with the hosted agent (type 'exit' to quit)
    Agent,
}

/// Entry of the interactive main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Genie,
    Agent,
    Exit,
}

impl MenuChoice {
    /// Parse a menu selection; anything other than 1-3 is `None`.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Genie),
            "2" => Some(Self::Agent),
            "3" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// One line typed at the agent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentInput<'a> {
    Exit,
    Blank,
    Prompt(&'a str),
}

impl<'a> AgentInput<'a> {
    pub fn classify(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Self::Blank
        } else if trimmed.eq_ignore_ascii_case("exit") {
            Self::Exit
        } else {
            Self::Prompt(line.trim_end_matches(['\r', '\n']))
        }
    }
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "genie_console=debug,info"
        } else {
            "info"
        }
    }
}
