//! Command-line interface for obscura.
//!
//! This module provides the CLI structure for the `obscura` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    BlurCommand, ConfigCommand, DebugCommand, KeywordCommand, PresetCommand, RenderCommand,
    ResolveCommand,
};

/// obscura - Reversible blur for document elements
///
/// Curate the selectors and keywords whose matches get blurred, toggle the
/// effect, and render document snapshots with the effect applied.
#[derive(Debug, Parser)]
#[command(name = "obscura")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the settings file (overrides the configured one)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage stored selectors
    #[command(subcommand)]
    Preset(PresetCommand),

    /// Manage stored keywords
    #[command(subcommand)]
    Keyword(KeywordCommand),

    /// Control the blur effect
    #[command(subcommand)]
    Blur(BlurCommand),

    /// Toggle diagnostic logging
    #[command(subcommand)]
    Debug(DebugCommand),

    /// Render a document snapshot with the stored settings applied
    Render(RenderCommand),

    /// Print the selector derived for an element of a document snapshot
    Resolve(ResolveCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}
