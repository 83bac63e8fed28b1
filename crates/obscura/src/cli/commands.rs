//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Preset management commands.
#[derive(Debug, Subcommand)]
pub enum PresetCommand {
    /// List stored selectors in display order
    List,

    /// Store a selector (e.g. `#title` or `.note.active`)
    Add {
        /// The selector to store
        selector: String,
    },

    /// Remove a stored selector
    Remove {
        /// The selector to remove
        selector: String,
    },

    /// Remove every stored selector
    Clear,
}

/// Keyword management commands.
#[derive(Debug, Subcommand)]
pub enum KeywordCommand {
    /// List stored keywords
    List,

    /// Store a keyword (surrounding whitespace is trimmed)
    Add {
        /// The keyword to store
        keyword: String,
    },

    /// Remove a stored keyword
    Remove {
        /// The keyword to remove
        keyword: String,
    },
}

/// Blur effect commands.
#[derive(Debug, Subcommand)]
pub enum BlurCommand {
    /// Turn the blur effect on
    On,

    /// Turn the blur effect off
    Off,

    /// Flip the blur effect
    Toggle,

    /// Show the stored settings
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Set the blur amount (a bare number gets the `em` unit)
    Amount {
        /// Length value, e.g. `0.5em` or `4px`
        value: String,
    },
}

/// Debug mode commands.
#[derive(Debug, Subcommand)]
pub enum DebugCommand {
    /// Turn diagnostic logging on
    On,

    /// Turn diagnostic logging off
    Off,
}

/// Render command arguments.
#[derive(Debug, Args)]
pub struct RenderCommand {
    /// Document snapshot (JSON) to render
    pub document: PathBuf,

    /// Write the rendered snapshot here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Resolve command arguments.
#[derive(Debug, Args)]
#[command(group(
    clap::ArgGroup::new("target")
        .required(true)
        .args(["id", "class"]),
))]
pub struct ResolveCommand {
    /// Document snapshot (JSON) to search
    pub document: PathBuf,

    /// Pick the element with this id
    #[arg(long)]
    pub id: Option<String>,

    /// Pick the first element carrying this class
    #[arg(long)]
    pub class: Option<String>,
}

impl ResolveCommand {
    /// Selector locating the element to resolve.
    #[must_use]
    pub fn target_selector(&self) -> Option<String> {
        self.id
            .as_ref()
            .map(|id| format!("#{id}"))
            .or_else(|| self.class.as_ref().map(|class| format!(".{class}")))
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        file: Option<PathBuf>,
    },
}
