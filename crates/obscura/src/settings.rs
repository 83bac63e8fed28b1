//! Persisted settings.
//!
//! [`Settings`] is the single blob the host persists between sessions. It
//! owns the two user-curated lists, [`PresetStore`] and [`KeywordStore`],
//! both of which keep insertion order and never hold duplicates, including
//! right after decoding a hand-edited blob.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// Default blur amount.
pub const DEFAULT_BLUR_AMOUNT: &str = "0.5em";

/// Unit assumed for bare numeric blur amounts.
const DEFAULT_UNIT: &str = "em";

/// Leading number of a length value, the way a lenient float parser reads it.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<num>[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)(?P<unit>.*)$")
        .expect("leading number regex")
});

/// The persisted settings blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Blur length, e.g. `0.5em`. Kept verbatim when it is not numeric.
    pub blur_amount: String,
    /// Whether selection mode is on. Never survives a reload.
    pub is_selecting_mode: bool,
    /// Whether the blur effect is on. Reapplied on load.
    pub is_blur_active: bool,
    /// Stored selectors, in insertion order.
    pub presets: PresetStore,
    /// Stored keywords, in insertion order.
    pub keywords: KeywordStore,
    /// Whether diagnostic logging is on.
    pub is_debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blur_amount: DEFAULT_BLUR_AMOUNT.to_string(),
            is_selecting_mode: false,
            is_blur_active: false,
            presets: PresetStore::default(),
            keywords: KeywordStore::default(),
            is_debug_mode: false,
        }
    }
}

/// Result of decoding a stored blob.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSettings {
    /// The decoded, normalized settings.
    pub settings: Settings,
    /// Whether normalization changed anything that should be written back.
    pub needs_write: bool,
}

impl Settings {
    /// Decode a stored blob, merging it over the defaults.
    ///
    /// Missing keys take their default value and unknown keys are ignored.
    /// Selection mode is always forced off and a bare numeric blur amount
    /// gets the default unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is not an object or a known key holds a
    /// value of the wrong type.
    pub fn from_blob(blob: Option<Value>) -> Result<LoadedSettings> {
        let Some(blob) = blob else {
            return Ok(LoadedSettings {
                settings: Self::default(),
                needs_write: false,
            });
        };
        let Value::Object(stored) = blob else {
            return Err(Error::settings_decode("settings blob must be a JSON object"));
        };

        // What the blob means once merged over the defaults
        let mut merged = serde_json::to_value(Self::default())?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in stored {
                if fields.contains_key(&key) {
                    fields.insert(key, value);
                }
            }
        }

        let mut settings: Self = serde_json::from_value(merged.clone())
            .map_err(|e| Error::settings_decode(e.to_string()))?;
        settings.is_selecting_mode = false;
        settings.blur_amount = normalize_blur_amount(&settings.blur_amount);

        let needs_write = serde_json::to_value(&settings)? != merged;
        debug!(
            presets = settings.presets.len(),
            keywords = settings.keywords.len(),
            needs_write,
            "Settings decoded"
        );
        Ok(LoadedSettings {
            settings,
            needs_write,
        })
    }

    /// Encode the settings as a blob.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_blob(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// The parsed blur amount.
    #[must_use]
    pub fn blur(&self) -> BlurAmount {
        BlurAmount::parse(&self.blur_amount)
    }
}

/// Append the default unit to a bare number; keep anything else verbatim.
#[must_use]
pub fn normalize_blur_amount(raw: &str) -> String {
    match LEADING_NUMBER.captures(raw) {
        Some(caps) if caps["unit"].trim().is_empty() => {
            format!("{}{DEFAULT_UNIT}", &caps["num"])
        }
        _ => raw.to_string(),
    }
}

/// A blur length split into its numeric part and unit.
#[derive(Debug, Clone, PartialEq)]
pub struct BlurAmount {
    raw: String,
    base: Option<(f64, String)>,
}

impl BlurAmount {
    /// Parse a length value. Values without a leading number keep only
    /// their raw text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let base = LEADING_NUMBER.captures(raw).and_then(|caps| {
            let value: f64 = caps["num"].parse().ok()?;
            let unit = caps["unit"].trim();
            let unit = if unit.is_empty() { DEFAULT_UNIT } else { unit };
            Some((value, unit.to_string()))
        });
        Self {
            raw: raw.to_string(),
            base,
        }
    }

    /// Numeric portion, if any.
    #[must_use]
    pub fn base(&self) -> Option<f64> {
        self.base.as_ref().map(|(value, _)| *value)
    }

    /// CSS filter value for this amount scaled by `multiplier`.
    ///
    /// Non-numeric amounts are passed through unscaled, for the rendering
    /// layer to accept or ignore.
    #[must_use]
    pub fn filter(&self, multiplier: f64) -> String {
        match &self.base {
            Some((value, unit)) => format!("blur({}{unit})", value * multiplier),
            None => format!("blur({})", self.raw),
        }
    }
}

/// Outcome of toggling a selector's membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// The selector was added.
    Added,
    /// The selector was removed.
    Removed,
}

/// Ordered, duplicate-free list of preset selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PresetStore {
    selectors: Vec<String>,
}

impl From<Vec<String>> for PresetStore {
    fn from(selectors: Vec<String>) -> Self {
        let mut store = Self::default();
        for selector in selectors {
            store.add(&selector);
        }
        store
    }
}

impl From<PresetStore> for Vec<String> {
    fn from(store: PresetStore) -> Self {
        store.selectors
    }
}

impl PresetStore {
    /// Whether `selector` is stored.
    #[must_use]
    pub fn contains(&self, selector: &str) -> bool {
        self.selectors.iter().any(|s| s == selector)
    }

    /// Append `selector` unless already present. Returns whether it was added.
    pub fn add(&mut self, selector: &str) -> bool {
        if selector.is_empty() || self.contains(selector) {
            return false;
        }
        self.selectors.push(selector.to_string());
        true
    }

    /// Remove `selector`. Returns whether it was present.
    pub fn remove(&mut self, selector: &str) -> bool {
        let before = self.selectors.len();
        self.selectors.retain(|s| s != selector);
        self.selectors.len() != before
    }

    /// Add `selector` if absent, remove it if present.
    pub fn toggle(&mut self, selector: &str) -> Toggle {
        if self.remove(selector) {
            Toggle::Removed
        } else {
            self.add(selector);
            Toggle::Added
        }
    }

    /// Remove and return the selector at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        (index < self.selectors.len()).then(|| self.selectors.remove(index))
    }

    /// Remove every selector, returning them in order.
    pub fn clear(&mut self) -> Vec<String> {
        std::mem::take(&mut self.selectors)
    }

    /// Selector at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.selectors.get(index).map(String::as_str)
    }

    /// Iterate selectors in display order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().map(String::as_str)
    }

    /// Selectors in display order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.selectors
    }

    /// Number of stored selectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Whether no selectors are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

/// Why a keyword was not added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordRejection {
    /// Empty or whitespace-only input.
    Blank,
    /// Already stored.
    Duplicate,
}

/// Ordered, duplicate-free list of non-blank keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct KeywordStore {
    keywords: Vec<String>,
}

impl From<Vec<String>> for KeywordStore {
    fn from(keywords: Vec<String>) -> Self {
        let mut store = Self::default();
        for keyword in keywords {
            let _ = store.add(&keyword);
        }
        store
    }
}

impl From<KeywordStore> for Vec<String> {
    fn from(store: KeywordStore) -> Self {
        store.keywords
    }
}

impl KeywordStore {
    /// Add a keyword, trimmed of surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns the reason when the keyword is blank or already stored.
    pub fn add(&mut self, keyword: &str) -> std::result::Result<(), KeywordRejection> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(KeywordRejection::Blank);
        }
        if self.contains(keyword) {
            return Err(KeywordRejection::Duplicate);
        }
        self.keywords.push(keyword.to_string());
        Ok(())
    }

    /// Whether `keyword` is stored.
    #[must_use]
    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    /// Remove `keyword`. Returns whether it was present.
    pub fn remove(&mut self, keyword: &str) -> bool {
        let before = self.keywords.len();
        self.keywords.retain(|k| k != keyword);
        self.keywords.len() != before
    }

    /// Remove and return the keyword at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        (index < self.keywords.len()).then(|| self.keywords.remove(index))
    }

    /// First stored keyword contained in `text` (plain, case-sensitive).
    #[must_use]
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .find(|keyword| text.contains(keyword))
    }

    /// Iterate keywords in display order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    /// Keywords in display order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.keywords
    }

    /// Number of stored keywords.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// Whether no keywords are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
