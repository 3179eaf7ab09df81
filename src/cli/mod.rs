//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{ListCommand, PlanCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Deploy and translation-sync tasks
#[derive(Debug, Parser, Clone)]
#[command(name = "shipline")]
#[command(author = "Shipline Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Deploy a Django service and sync its translations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Remote host as [user@]host[:port], overrides the configuration
    #[arg(short = 'H', long, global = true)]
    pub host: Option<String>,

    /// Print captured command output
    #[arg(short, long, global = true)]
    pub stream: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a task
    Run(RunCommand),

    /// Show the commands a task would run
    Plan(PlanCommand),

    /// List available tasks
    List(ListCommand),

    /// Check the configuration
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
