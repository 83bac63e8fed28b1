//! `obscura` - CLI for the obscura blur engine
//!
//! This binary drives the library against a JSON settings file and JSON
//! document snapshots.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;

use obscura::cli::{
    BlurCommand, Cli, Command, ConfigCommand, DebugCommand, KeywordCommand, PresetCommand,
    RenderCommand, ResolveCommand,
};
use obscura::{
    init_logging, Config, Document, Error, JsonFileStore, MemoryDocument, Plugin, RecordingShell,
    Settings, SettingsStore,
};

type CliPlugin = Plugin<MemoryDocument, RecordingShell, JsonFileStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Configuration commands must work even when the settings file is broken
    if let Command::Config(config_cmd) = &cli.command {
        init_logging(cli.verbosity());
        return handle_config(cli.config.clone(), config_cmd);
    }

    let config = Config::load_from(cli.config.clone())?;
    let store = JsonFileStore::new(
        cli.settings
            .clone()
            .unwrap_or_else(|| config.settings_path()),
    );

    // The persisted debug flag raises the default verbosity
    let debug_mode = peek_debug_mode(&store).await;
    init_logging(cli.verbosity().with_debug_mode(debug_mode));

    match cli.command {
        Command::Preset(cmd) => {
            let mut plugin = start(&config, MemoryDocument::new(), store).await?;
            handle_preset(&mut plugin, cmd).await
        }
        Command::Keyword(cmd) => {
            let mut plugin = start(&config, MemoryDocument::new(), store).await?;
            handle_keyword(&mut plugin, cmd).await
        }
        Command::Blur(cmd) => {
            let mut plugin = start(&config, MemoryDocument::new(), store).await?;
            handle_blur(&mut plugin, cmd).await
        }
        Command::Debug(cmd) => {
            let mut plugin = start(&config, MemoryDocument::new(), store).await?;
            plugin.set_debug_mode(matches!(cmd, DebugCommand::On)).await?;
            println!(
                "Debug mode {}",
                if plugin.settings().is_debug_mode { "on" } else { "off" }
            );
            Ok(())
        }
        Command::Render(cmd) => handle_render(&config, store, &cmd).await,
        Command::Resolve(cmd) => handle_resolve(&config, store, &cmd).await,
        Command::Config(_) => Ok(()),
    }
}

async fn peek_debug_mode(store: &JsonFileStore) -> bool {
    store
        .load()
        .await
        .ok()
        .and_then(|blob| Settings::from_blob(blob).ok())
        .is_some_and(|loaded| loaded.settings.is_debug_mode)
}

async fn start(
    config: &Config,
    document: MemoryDocument,
    store: JsonFileStore,
) -> anyhow::Result<CliPlugin> {
    let mut plugin = Plugin::new(config, document, RecordingShell::new(), store);
    plugin.load().await?;
    Ok(plugin)
}

fn print_notices(plugin: &mut CliPlugin) {
    for notice in plugin.shell_mut().drain_notices() {
        println!("{notice}");
    }
}

async fn handle_preset(plugin: &mut CliPlugin, cmd: PresetCommand) -> anyhow::Result<()> {
    match cmd {
        PresetCommand::List => {
            if plugin.settings().presets.is_empty() {
                println!("{}", obscura::shell::english("panel.no_presets").unwrap_or_default());
            }
            for (index, selector) in plugin.settings().presets.iter().enumerate() {
                println!("{:>3}  {selector}", index + 1);
            }
        }
        PresetCommand::Add { selector } => {
            if plugin.add_preset(&selector).await? {
                println!("Added preset: {}", selector.trim());
            } else {
                println!("Preset not added (empty or already stored): {selector}");
            }
        }
        PresetCommand::Remove { selector } => {
            if plugin.remove_preset(&selector).await? {
                println!("Removed preset: {}", selector.trim());
            } else {
                println!("No such preset: {selector}");
            }
        }
        PresetCommand::Clear => {
            let removed = plugin.clear_presets().await?;
            println!("Removed {} preset(s)", removed.len());
        }
    }
    Ok(())
}

async fn handle_keyword(plugin: &mut CliPlugin, cmd: KeywordCommand) -> anyhow::Result<()> {
    match cmd {
        KeywordCommand::List => {
            if plugin.settings().keywords.is_empty() {
                println!("{}", obscura::shell::english("panel.no_keywords").unwrap_or_default());
            }
            for keyword in plugin.settings().keywords.iter() {
                println!("{keyword}");
            }
        }
        KeywordCommand::Add { keyword } => {
            if plugin.add_keyword(&keyword).await? {
                println!("Added keyword: {}", keyword.trim());
            } else {
                println!("Keyword not added (blank or already stored): {keyword:?}");
            }
        }
        KeywordCommand::Remove { keyword } => {
            if plugin.remove_keyword(&keyword).await? {
                println!("Removed keyword: {}", keyword.trim());
            } else {
                println!("No such keyword: {keyword}");
            }
        }
    }
    Ok(())
}

async fn handle_blur(plugin: &mut CliPlugin, cmd: BlurCommand) -> anyhow::Result<()> {
    match cmd {
        BlurCommand::On => plugin.set_blur_active(true).await?,
        BlurCommand::Off => plugin.set_blur_active(false).await?,
        BlurCommand::Toggle => plugin.toggle_blur_active().await?,
        BlurCommand::Amount { value } => {
            plugin.set_blur_amount(&value).await?;
            println!("Blur amount: {}", plugin.settings().blur_amount);
        }
        BlurCommand::Status { json } => print_status(plugin.settings(), plugin.store(), json)?,
    }
    print_notices(plugin);
    Ok(())
}

fn print_status(settings: &Settings, store: &JsonFileStore, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&settings.to_blob()?)?);
    } else {
        println!("obscura status");
        println!("--------------");
        println!("Settings:      {}", store.path().display());
        println!(
            "Blur:          {}",
            if settings.is_blur_active { "on" } else { "off" }
        );
        println!("Blur amount:   {}", settings.blur_amount);
        println!("Presets:       {}", settings.presets.len());
        println!("Keywords:      {}", settings.keywords.len());
        println!(
            "Debug mode:    {}",
            if settings.is_debug_mode { "on" } else { "off" }
        );
    }
    Ok(())
}

async fn read_document(path: &Path) -> anyhow::Result<MemoryDocument> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::document_load(path, e.to_string()))?;
    let document =
        MemoryDocument::from_json(&text).map_err(|e| Error::document_load(path, e.to_string()))?;
    Ok(document)
}

async fn handle_render(
    config: &Config,
    store: JsonFileStore,
    cmd: &RenderCommand,
) -> anyhow::Result<()> {
    let document = read_document(&cmd.document).await?;
    let plugin = start(config, document, store).await?;
    let rendered = plugin.document().to_json_pretty()?;

    match &cmd.output {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Rendered snapshot written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

async fn handle_resolve(
    config: &Config,
    store: JsonFileStore,
    cmd: &ResolveCommand,
) -> anyhow::Result<()> {
    let Some(target) = cmd.target_selector() else {
        bail!("pass --id or --class to pick an element");
    };
    let document = read_document(&cmd.document).await?;
    let plugin = Plugin::new(config, document, RecordingShell::new(), store);

    let Some(node) = plugin.document().query_selector(&target) else {
        bail!("no element matches {target}");
    };
    match plugin.resolve_selector(node) {
        Some(selector) => println!("{selector}"),
        None => bail!("element {target} has no stable selector"),
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Markers]");
                println!("  Reserved prefix:    {}", config.markers.reserved_prefix);
                println!();
                println!("[Regions]");
                println!(
                    "  Protected classes:  {}",
                    config.regions.protected_classes.join(", ")
                );
                println!(
                    "  Shell icon classes: {}",
                    config.regions.shell_icon_classes.join(", ")
                );
                println!("  Panel class:        {}", config.regions.panel_class);
                println!();
                println!("[Highlight]");
                println!("  Preset outline:     {}", config.highlight.preset_outline);
                println!("  Selecting outline:  {}", config.highlight.selecting_outline);
                println!("  Hover outline:      {}", config.highlight.hover_outline);
                println!();
                println!("[Panel]");
                println!(
                    "  Default position:   ({}, {})",
                    config.panel.default_x, config.panel.default_y
                );
                println!();
                println!("[Storage]");
                println!("  Settings path:      {}", config.settings_path().display());
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .clone()
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
