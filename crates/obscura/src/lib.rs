//! `obscura` - Reversible blur for document elements
//!
//! This library lets a user mark elements of a live content document as
//! presets by pointer interaction, then apply or remove a reversible blur to
//! those elements and to any text matching configured keywords. The host is
//! reached only through capability traits: [`Document`], [`Shell`] and
//! [`SettingsStore`].

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod document;
pub mod effects;
pub mod error;
pub mod highlight;
pub mod logging;
pub mod panel;
pub mod plugin;
pub mod regions;
pub mod selection;
pub mod selector;
pub mod settings;
pub mod shell;
pub mod store;

pub use config::Config;
pub use document::{Document, MemoryDocument, NodeId};
pub use effects::EffectEngine;
pub use error::{Error, Result};
pub use highlight::HighlightState;
pub use logging::init_logging;
pub use panel::ManagementPanel;
pub use plugin::Plugin;
pub use selection::SelectionModeController;
pub use selector::SelectorResolver;
pub use settings::{KeywordStore, PresetStore, Settings};
pub use shell::{Command, RecordingShell, Shell};
pub use store::{JsonFileStore, MemoryStore, SettingsStore};
