//! Configuration management for obscura.
//!
//! This module provides runtime configuration loading and validation using
//! figment, supporting TOML config files, environment variables, and defaults.
//! Runtime configuration describes the host (which classes mark protected
//! regions, which prefix the marker classes carry); the user's presets and
//! keywords live in the persisted [`Settings`](crate::settings::Settings) blob.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "obscura";

/// Default settings file name.
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `OBSCURA_`)
/// 2. TOML config file at `~/.config/obscura/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Marker class configuration.
    pub markers: MarkerConfig,
    /// Host region configuration.
    pub regions: RegionConfig,
    /// Highlight outline configuration.
    pub highlight: HighlightConfig,
    /// Management panel configuration.
    pub panel: PanelConfig,
    /// Settings storage configuration.
    pub storage: StorageConfig,
}

/// Marker class configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Prefix reserved for classes added by obscura.
    /// Classes carrying it are never part of a derived selector.
    pub reserved_prefix: String,
}

/// Host region configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Classes whose elements (and descendants) form protected regions.
    pub protected_classes: Vec<String>,
    /// Classes identifying shell/ribbon icon elements.
    pub shell_icon_classes: Vec<String>,
    /// Class of the management panel container.
    pub panel_class: String,
}

/// Highlight outline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Outline of stored presets.
    pub preset_outline: String,
    /// Outline of the element under the pointer.
    pub selecting_outline: String,
    /// Outline of the element whose panel item is hovered.
    pub hover_outline: String,
}

/// Management panel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Horizontal offset of a freshly opened panel, in pixels.
    pub default_x: f64,
    /// Vertical offset of a freshly opened panel, in pixels.
    pub default_y: f64,
}

/// Settings storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the settings file.
    /// Defaults to `~/.local/share/obscura/settings.json`
    pub settings_path: Option<PathBuf>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            reserved_prefix: "blur-plugin-".to_string(),
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            protected_classes: vec![
                "cm-editor".to_string(),
                "markdown-preview-view".to_string(),
            ],
            shell_icon_classes: vec!["ribbon-tab".to_string(), "side-dock-ribbon".to_string()],
            panel_class: "blur-manage-panel".to_string(),
        }
    }
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            preset_outline: "2px solid rgba(0, 255, 0, 0.7)".to_string(),
            selecting_outline: "2px solid rgba(255, 255, 0, 0.7)".to_string(),
            hover_outline: "2px solid rgba(255, 0, 0, 0.7)".to_string(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            default_x: 20.0,
            default_y: 50.0,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("OBSCURA_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.markers.reserved_prefix;
        if prefix.trim().is_empty() {
            return invalid("reserved_prefix must not be empty");
        }
        if !is_class_name(prefix) {
            return invalid(format!("reserved_prefix is not a valid class name: {prefix:?}"));
        }

        validate_class_list("protected_classes", &self.regions.protected_classes)?;
        validate_class_list("shell_icon_classes", &self.regions.shell_icon_classes)?;
        if !is_class_name(&self.regions.panel_class) {
            return invalid(format!(
                "panel_class is not a valid class name: {:?}",
                self.regions.panel_class
            ));
        }

        for (name, value) in [
            ("preset_outline", &self.highlight.preset_outline),
            ("selecting_outline", &self.highlight.selecting_outline),
            ("hover_outline", &self.highlight.hover_outline),
        ] {
            if value.trim().is_empty() {
                return invalid(format!("{name} must not be empty"));
            }
        }

        if self.panel.default_x < 0.0 || self.panel.default_y < 0.0 {
            return invalid(format!(
                "panel default position must not be negative ({}, {})",
                self.panel.default_x, self.panel.default_y
            ));
        }

        Ok(())
    }

    /// Get the settings path, resolving defaults if not set.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.storage
            .settings_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(SETTINGS_FILE_NAME))
    }
}

fn invalid(message: impl Into<String>) -> Result<()> {
    Err(Error::ConfigValidation {
        message: message.into(),
    })
}

fn validate_class_list(name: &str, classes: &[String]) -> Result<()> {
    if classes.is_empty() {
        return invalid(format!("{name} must list at least one class"));
    }
    match classes.iter().find(|class| !is_class_name(class)) {
        Some(bad) => invalid(format!("{name} contains an invalid class name: {bad:?}")),
        None => Ok(()),
    }
}

/// A class name usable inside a compound selector.
fn is_class_name(class: &str) -> bool {
    !class.is_empty()
        && !class
            .chars()
            .any(|c| c.is_whitespace() || c == '.' || c == '#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.markers.reserved_prefix, "blur-plugin-");
        assert!(config
            .regions
            .protected_classes
            .contains(&"cm-editor".to_string()));
        assert_eq!(config.regions.panel_class, "blur-manage-panel");
        assert!(config.storage.settings_path.is_none());
    }

    #[test]
    fn test_default_highlight_config() {
        let highlight = HighlightConfig::default();

        assert!(highlight.preset_outline.contains("0, 255, 0"));
        assert!(highlight.selecting_outline.contains("255, 255, 0"));
        assert!(highlight.hover_outline.contains("255, 0, 0"));
    }

    #[test]
    fn test_default_panel_config() {
        let panel = PanelConfig::default();
        assert!((panel.default_x - 20.0).abs() < f64::EPSILON);
        assert!((panel.default_y - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_prefix() {
        let mut config = Config::default();
        config.markers.reserved_prefix = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("reserved_prefix"));
    }

    #[test]
    fn test_validate_class_with_dot() {
        let mut config = Config::default();
        config.regions.protected_classes = vec!["cm.editor".to_string()];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("protected_classes"));
    }

    #[test]
    fn test_validate_empty_shell_classes() {
        let mut config = Config::default();
        config.regions.shell_icon_classes.clear();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("shell_icon_classes"));
    }

    #[test]
    fn test_validate_empty_outline() {
        let mut config = Config::default();
        config.highlight.hover_outline = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("hover_outline"));
    }

    #[test]
    fn test_validate_negative_panel_position() {
        let mut config = Config::default();
        config.panel.default_y = -1.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("panel default position"));
    }

    #[test]
    fn test_settings_path_default() {
        let config = Config::default();
        let path = config.settings_path();

        assert!(path.to_string_lossy().contains("settings.json"));
    }

    #[test]
    fn test_settings_path_custom() {
        let mut config = Config::default();
        config.storage.settings_path = Some(PathBuf::from("/custom/settings.json"));

        assert_eq!(
            config.settings_path(),
            PathBuf::from("/custom/settings.json")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("obscura"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_load_toml_overrides_defaults() {
        let path = std::env::temp_dir().join(format!(
            "obscura-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[markers]\nreserved_prefix = \"veil-\"\n\n[panel]\ndefault_x = 5.0\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.markers.reserved_prefix, "veil-");
        assert!((config.panel.default_x - 5.0).abs() < f64::EPSILON);
        assert!((config.panel.default_y - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_region_config_deserialize() {
        let json = r#"{"protected_classes": ["editor-root"], "panel_class": "my-panel"}"#;
        let regions: RegionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(regions.protected_classes, vec!["editor-root".to_string()]);
        assert_eq!(regions.panel_class, "my-panel");
        assert!(!regions.shell_icon_classes.is_empty());
    }
}
