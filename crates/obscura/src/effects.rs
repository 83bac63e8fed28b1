//! Blur effect application and removal.
//!
//! The engine is stateless: removal finds its own work by fingerprint (the
//! editor marker class and `blur(` filters) rather than remembering what it
//! applied, so it stays correct across reloads and re-renders.

use tracing::{debug, trace, warn};

use crate::document::{Document, NodeId};
use crate::regions::Regions;
use crate::selector::Selector;
use crate::settings::{BlurAmount, KeywordStore, Settings};

/// Inline style property owned by the effect.
const FILTER: &str = "filter";

/// Prefix of every filter value the effect writes.
const BLUR_FINGERPRINT: &str = "blur(";

/// Containers whose text is never scanned for keywords.
const SKIPPED_CONTAINERS: [&str; 2] = ["script", "style"];

/// Blur multiplier for an element's tag.
#[must_use]
pub fn heading_multiplier(tag: &str) -> f64 {
    match tag {
        "h1" => 2.0,
        "h2" => 1.75,
        "h3" => 1.5,
        "h4" => 1.25,
        _ => 1.0,
    }
}

/// What one application pass touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectReport {
    /// Elements blurred through a preset.
    pub preset_elements: usize,
    /// Containers blurred through a keyword match.
    pub keyword_containers: usize,
}

/// Applies and removes the blur effect.
#[derive(Debug, Clone)]
pub struct EffectEngine {
    editor_class: String,
    regions: Regions,
}

impl EffectEngine {
    /// Create an engine whose protected-region marker is `<prefix>editor`.
    #[must_use]
    pub fn new(reserved_prefix: &str, regions: Regions) -> Self {
        Self {
            editor_class: format!("{reserved_prefix}editor"),
            regions,
        }
    }

    /// Marker class used inside protected regions.
    #[must_use]
    pub fn editor_class(&self) -> &str {
        &self.editor_class
    }

    /// Blur every element matched by a preset, then every keyword container.
    pub fn apply_effects<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        settings: &Settings,
    ) -> EffectReport {
        let blur = settings.blur();
        if blur.base().is_none() {
            warn!(amount = %settings.blur_amount, "Blur amount is not numeric, passing it through");
        }

        let mut report = EffectReport::default();
        for selector in settings.presets.iter() {
            if Selector::parse(selector).is_none() {
                debug!(selector, "Skipping unsupported selector");
                continue;
            }
            for node in doc.query_selector_all(selector) {
                if self.regions.is_panel(&*doc, node) {
                    continue;
                }
                let multiplier = doc.tag_name(node).map_or(1.0, heading_multiplier);
                self.blur(doc, node, &blur, multiplier);
                report.preset_elements += 1;
            }
        }

        if !settings.keywords.is_empty() {
            report.keyword_containers = self.apply_keyword_blur(doc, &settings.keywords, &blur);
        }

        debug!(
            presets = report.preset_elements,
            keywords = report.keyword_containers,
            "Effects applied"
        );
        report
    }

    /// Blur the container of every text leaf that contains a keyword, at
    /// the base intensity whatever the container's tag.
    pub fn apply_keyword_blur<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        keywords: &KeywordStore,
        blur: &BlurAmount,
    ) -> usize {
        let mut containers: Vec<NodeId> = Vec::new();
        for leaf in doc.text_nodes(doc.body()) {
            let Some(container) = doc.parent(leaf) else {
                continue;
            };
            if containers.contains(&container) {
                continue;
            }
            let skipped_tag = doc
                .tag_name(container)
                .is_some_and(|tag| SKIPPED_CONTAINERS.contains(&tag));
            if skipped_tag
                || self.regions.is_panel(&*doc, container)
                || self.regions.is_shell_icon(&*doc, container)
            {
                continue;
            }
            if let Some(keyword) = doc.text(leaf).and_then(|text| keywords.first_match(text)) {
                trace!(%container, keyword, "Keyword matched");
                containers.push(container);
            }
        }

        let mut blurred = 0;
        for container in containers {
            self.blur(doc, container, blur, 1.0);
            blurred += 1;
        }
        blurred
    }

    /// Remove every marker class and blur filter the engine may have applied.
    ///
    /// Calling it again, or with nothing applied, changes nothing.
    pub fn remove_effects<D: Document + ?Sized>(&self, doc: &mut D) -> usize {
        let mut removed = 0;
        for node in doc.elements() {
            let mut touched = false;
            if doc.has_class(node, &self.editor_class) {
                doc.remove_class(node, &self.editor_class);
                touched = true;
            }
            if doc
                .style(node, FILTER)
                .is_some_and(|value| value.starts_with(BLUR_FINGERPRINT))
            {
                doc.remove_style(node, FILTER);
                touched = true;
            }
            if touched {
                trace!(%node, "Effect removed");
                removed += 1;
            }
        }
        debug!(removed, "Effects removed");
        removed
    }

    fn blur<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        node: NodeId,
        blur: &BlurAmount,
        multiplier: f64,
    ) {
        if self.regions.is_protected(&*doc, node) {
            trace!(%node, "Marking protected element");
            doc.add_class(node, &self.editor_class);
        } else {
            let value = blur.filter(multiplier);
            trace!(%node, filter = %value, "Blurring element");
            doc.set_style(node, FILTER, &value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::settings::PresetStore;

    fn engine() -> EffectEngine {
        EffectEngine::new("plugin-", Regions::default())
    }

    fn settings(presets: &[&str], keywords: &[&str]) -> Settings {
        Settings {
            presets: PresetStore::from(presets.iter().map(|s| (*s).to_string()).collect::<Vec<_>>()),
            keywords: KeywordStore::from(
                keywords.iter().map(|s| (*s).to_string()).collect::<Vec<_>>(),
            ),
            ..Settings::default()
        }
    }

    #[test]
    fn test_heading_multipliers() {
        assert_eq!(heading_multiplier("h1"), 2.0);
        assert_eq!(heading_multiplier("h2"), 1.75);
        assert_eq!(heading_multiplier("h3"), 1.5);
        assert_eq!(heading_multiplier("h4"), 1.25);
        assert_eq!(heading_multiplier("h5"), 1.0);
        assert_eq!(heading_multiplier("p"), 1.0);
    }

    #[test]
    fn test_level_one_heading_gets_double_blur() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let title = doc.append_element(body, "h1", &[]);
        doc.set_id(title, "title");

        let report = engine().apply_effects(&mut doc, &settings(&["#title"], &[]));

        assert_eq!(report.preset_elements, 1);
        assert_eq!(doc.style(title, "filter"), Some("blur(1em)"));
    }

    #[test]
    fn test_applies_to_all_matches() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let a = doc.append_element(body, "p", &["private"]);
        let b = doc.append_element(body, "h3", &["private"]);

        engine().apply_effects(&mut doc, &settings(&[".private"], &[]));

        assert_eq!(doc.style(a, "filter"), Some("blur(0.5em)"));
        assert_eq!(doc.style(b, "filter"), Some("blur(0.75em)"));
    }

    #[test]
    fn test_protected_region_gets_marker_class_only() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let editor = doc.append_element(body, "div", &["cm-editor"]);
        let line = doc.append_element(editor, "div", &["cm-line"]);

        engine().apply_effects(&mut doc, &settings(&[".cm-line"], &[]));

        assert!(doc.has_class(line, "plugin-editor"));
        assert_eq!(doc.style(line, "filter"), None);
    }

    #[test]
    fn test_panel_elements_are_skipped() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let panel = doc.append_element(body, "div", &["blur-manage-panel"]);
        let inside = doc.append_element(panel, "span", &["label"]);
        let outside = doc.append_element(body, "span", &["label"]);

        engine().apply_effects(&mut doc, &settings(&[".label"], &[]));

        assert_eq!(doc.style(inside, "filter"), None);
        assert_eq!(doc.style(outside, "filter"), Some("blur(0.5em)"));
    }

    #[test]
    fn test_unmatched_and_unsupported_selectors_are_skipped() {
        let mut doc = MemoryDocument::new();
        let before = doc.to_json_pretty().unwrap();

        let report = engine().apply_effects(&mut doc, &settings(&["#missing", "div > p"], &[]));

        assert_eq!(report, EffectReport::default());
        assert_eq!(doc.to_json_pretty().unwrap(), before);
    }

    #[test]
    fn test_keyword_scoping() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let para = doc.append_element(body, "p", &[]);
        doc.append_text(para, "this is secret info");
        let script = doc.append_element(body, "script", &[]);
        doc.append_text(script, "this is secret info");
        let style = doc.append_element(body, "style", &[]);
        doc.append_text(style, "this is secret info");

        let report = engine().apply_effects(&mut doc, &settings(&[], &["secret"]));

        assert_eq!(report.keyword_containers, 1);
        assert_eq!(doc.style(para, "filter"), Some("blur(0.5em)"));
        assert_eq!(doc.style(script, "filter"), None);
        assert_eq!(doc.style(style, "filter"), None);
    }

    #[test]
    fn test_keyword_skips_panel_and_shell_icons() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let ribbon = doc.append_element(body, "div", &["side-dock-ribbon"]);
        let icon = doc.append_element(ribbon, "span", &[]);
        doc.append_text(icon, "secret");
        let panel = doc.append_element(body, "div", &["blur-manage-panel"]);
        let item = doc.append_element(panel, "span", &["keyword-text"]);
        doc.append_text(item, "secret");

        let report = engine().apply_effects(&mut doc, &settings(&[], &["secret"]));

        assert_eq!(report.keyword_containers, 0);
        assert_eq!(doc.style(icon, "filter"), None);
        assert_eq!(doc.style(item, "filter"), None);
    }

    #[test]
    fn test_keyword_match_sets_base_intensity_on_preset_heading() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let title = doc.append_element(body, "h1", &[]);
        doc.set_id(title, "title");
        doc.append_text(title, "secret plans");

        let report = engine().apply_effects(&mut doc, &settings(&["#title"], &["secret"]));

        assert_eq!(report.preset_elements, 1);
        assert_eq!(report.keyword_containers, 1);
        assert_eq!(doc.style(title, "filter"), Some("blur(0.5em)"));
    }

    #[test]
    fn test_keyword_in_protected_region_uses_marker() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let preview = doc.append_element(body, "div", &["markdown-preview-view"]);
        let para = doc.append_element(preview, "p", &[]);
        doc.append_text(para, "my secret");

        engine().apply_effects(&mut doc, &settings(&[], &["secret"]));

        assert!(doc.has_class(para, "plugin-editor"));
        assert_eq!(doc.style(para, "filter"), None);
    }

    #[test]
    fn test_remove_effects_is_idempotent() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let title = doc.append_element(body, "h2", &["note"]);
        doc.set_style(title, "color", "red");
        let editor = doc.append_element(body, "div", &["cm-editor"]);
        let line = doc.append_element(editor, "div", &["note"]);
        let engine = engine();

        engine.apply_effects(&mut doc, &settings(&[".note"], &[]));
        assert_eq!(engine.remove_effects(&mut doc), 2);
        let once = doc.to_json_pretty().unwrap();
        assert_eq!(engine.remove_effects(&mut doc), 0);
        let twice = doc.to_json_pretty().unwrap();

        assert_eq!(once, twice);
        assert_eq!(doc.style(title, "filter"), None);
        assert_eq!(doc.style(title, "color"), Some("red"));
        assert!(!doc.has_class(line, "plugin-editor"));
    }

    #[test]
    fn test_remove_keeps_foreign_filters() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let img = doc.append_element(body, "img", &[]);
        doc.set_style(img, "filter", "grayscale(1)");

        engine().remove_effects(&mut doc);

        assert_eq!(doc.style(img, "filter"), Some("grayscale(1)"));
    }

    #[test]
    fn test_non_numeric_amount_passes_through() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let el = doc.append_element(body, "h1", &["x"]);
        let mut settings = settings(&[".x"], &[]);
        settings.blur_amount = "var(--blur)".to_string();

        engine().apply_effects(&mut doc, &settings);

        assert_eq!(doc.style(el, "filter"), Some("blur(var(--blur))"));
    }
}
