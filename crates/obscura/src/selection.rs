//! Selection mode: pointer interaction that curates presets.
//!
//! The controller mutates the in-memory [`PresetStore`] and the highlight
//! state only. Persisting the change, refreshing the panel and re-applying
//! the effect are left to the caller, which runs them as one settings
//! transaction after [`SelectionModeController::click`] returns.

use tracing::{debug, trace};

use crate::document::{Document, NodeId};
use crate::highlight::{HighlightState, Highlighter};
use crate::regions::Regions;
use crate::selector::SelectorResolver;
use crate::settings::{PresetStore, Toggle};

/// Selection mode state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// Pointer events pass through.
    #[default]
    Inactive,
    /// Pointer events curate presets.
    Active,
}

/// Result of a click that changed the preset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutcome {
    /// Selector resolved for the clicked element.
    pub selector: String,
    /// Whether it was added or removed.
    pub toggle: Toggle,
}

/// Drives selection mode from pointer events.
#[derive(Debug, Clone)]
pub struct SelectionModeController {
    mode: SelectionMode,
    resolver: SelectorResolver,
    regions: Regions,
    highlighter: Highlighter,
}

impl SelectionModeController {
    /// Create an inactive controller.
    #[must_use]
    pub fn new(resolver: SelectorResolver, regions: Regions, highlighter: Highlighter) -> Self {
        Self {
            mode: SelectionMode::Inactive,
            resolver,
            regions,
            highlighter,
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Whether selection mode is on.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.mode == SelectionMode::Active
    }

    /// The selector resolver.
    #[must_use]
    pub fn resolver(&self) -> &SelectorResolver {
        &self.resolver
    }

    /// Highlight state of `node`.
    #[must_use]
    pub fn highlight(&self, node: NodeId) -> HighlightState {
        self.highlighter.state(node)
    }

    /// Enter selection mode, highlighting every stored preset match.
    ///
    /// Returns `false` when already active.
    pub fn activate<D: Document + ?Sized>(&mut self, doc: &mut D, presets: &PresetStore) -> bool {
        if self.is_active() {
            return false;
        }
        self.mode = SelectionMode::Active;
        self.highlighter.sync_presets(doc, presets);
        debug!(presets = presets.len(), "Selection mode entered");
        true
    }

    /// Leave selection mode and clear every highlight.
    ///
    /// Returns `false` when already inactive.
    pub fn deactivate<D: Document + ?Sized>(&mut self, doc: &mut D) -> bool {
        if !self.is_active() {
            return false;
        }
        self.mode = SelectionMode::Inactive;
        self.highlighter.clear_all(doc);
        debug!("Selection mode exited");
        true
    }

    /// Clear every highlight without leaving selection mode.
    pub fn clear_highlights<D: Document + ?Sized>(&mut self, doc: &mut D) {
        self.highlighter.clear_all(doc);
    }

    /// Pointer entered `node`.
    pub fn pointer_enter<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        presets: &PresetStore,
        node: NodeId,
    ) {
        if !self.accepts(&*doc, node) {
            return;
        }
        let own_stored = self
            .resolver
            .resolve(&*doc, node)
            .is_some_and(|selector| presets.contains(&selector));
        self.highlighter.set_pointer_over(doc, node, true, own_stored);
    }

    /// Pointer left `node`.
    pub fn pointer_leave<D: Document + ?Sized>(&mut self, doc: &mut D, node: NodeId) {
        if !self.accepts(&*doc, node) {
            return;
        }
        self.highlighter.set_pointer_over(doc, node, false, false);
    }

    /// Click on `node`: toggle its resolved selector in `presets`.
    ///
    /// Returns `None` when the click is ignored or the element has no
    /// selector. Highlights already reflect the new store on return.
    pub fn click<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        presets: &mut PresetStore,
        node: NodeId,
    ) -> Option<ClickOutcome> {
        if !self.accepts(&*doc, node) {
            return None;
        }
        let Some(selector) = self.resolver.resolve(&*doc, node) else {
            trace!(%node, "Clicked element has no selector");
            return None;
        };

        let toggle = presets.toggle(&selector);
        let own_stored = toggle == Toggle::Added;
        self.highlighter.set_pointer_over(doc, node, true, own_stored);
        self.highlighter.sync_presets(doc, presets);
        debug!(selector = %selector, ?toggle, "Preset toggled");
        Some(ClickOutcome { selector, toggle })
    }

    /// Mark every element `selector` matches as hovered (or not) from the
    /// panel list.
    pub fn set_preset_hovered<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        selector: &str,
        hovered: bool,
    ) {
        self.highlighter.set_selector_hovered(doc, selector, hovered);
    }

    /// Bring highlights in line with `presets` after an external change.
    pub fn sync_presets<D: Document + ?Sized>(&mut self, doc: &mut D, presets: &PresetStore) {
        if self.is_active() {
            self.highlighter.sync_presets(doc, presets);
        }
    }

    fn accepts<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        self.is_active() && !self.regions.is_ignored_target(doc, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HighlightConfig;

    fn controller() -> SelectionModeController {
        let regions = Regions::default();
        SelectionModeController::new(
            SelectorResolver::new("plugin-", regions.clone()),
            regions.clone(),
            Highlighter::new("plugin-", regions, HighlightConfig::default()),
        )
    }

    fn sample() -> (crate::document::MemoryDocument, NodeId) {
        let mut doc = crate::document::MemoryDocument::new();
        let body = doc.body();
        let title = doc.append_element(body, "h1", &[]);
        doc.set_id(title, "title");
        (doc, title)
    }

    #[test]
    fn test_inactive_controller_ignores_pointer() {
        let (mut doc, title) = sample();
        let mut presets = PresetStore::default();
        let mut ctl = controller();

        ctl.pointer_enter(&mut doc, &presets, title);
        assert_eq!(ctl.highlight(title), HighlightState::None);
        assert!(ctl.click(&mut doc, &mut presets, title).is_none());
        assert!(presets.is_empty());
    }

    #[test]
    fn test_activate_highlights_presets() {
        let (mut doc, title) = sample();
        let presets = PresetStore::from(vec!["#title".to_string()]);
        let mut ctl = controller();

        assert!(ctl.activate(&mut doc, &presets));
        assert!(!ctl.activate(&mut doc, &presets));
        assert_eq!(ctl.highlight(title), HighlightState::Preset);

        assert!(ctl.deactivate(&mut doc));
        assert_eq!(ctl.highlight(title), HighlightState::None);
        assert_eq!(doc.style(title, "outline"), None);
    }

    #[test]
    fn test_pointer_enter_and_leave() {
        let (mut doc, title) = sample();
        let body = doc.body();
        let other = doc.append_element(body, "p", &["lead"]);
        let presets = PresetStore::from(vec!["#title".to_string()]);
        let mut ctl = controller();
        ctl.activate(&mut doc, &presets);

        ctl.pointer_enter(&mut doc, &presets, other);
        assert_eq!(ctl.highlight(other), HighlightState::Selecting);
        ctl.pointer_leave(&mut doc, other);
        assert_eq!(ctl.highlight(other), HighlightState::None);

        ctl.pointer_enter(&mut doc, &presets, title);
        assert_eq!(ctl.highlight(title), HighlightState::Preset);
        ctl.pointer_leave(&mut doc, title);
        assert_eq!(ctl.highlight(title), HighlightState::Preset);
    }

    #[test]
    fn test_ignored_targets() {
        let (mut doc, _) = sample();
        let body = doc.body();
        let ribbon = doc.append_element(body, "div", &["ribbon-tab"]);
        let panel = doc.append_element(body, "div", &["blur-manage-panel"]);
        let item = doc.append_element(panel, "li", &["preset-item"]);
        let mut presets = PresetStore::default();
        let mut ctl = controller();
        ctl.activate(&mut doc, &presets);

        for node in [body, ribbon, item] {
            ctl.pointer_enter(&mut doc, &presets, node);
            assert_eq!(ctl.highlight(node), HighlightState::None);
            assert!(ctl.click(&mut doc, &mut presets, node).is_none());
        }
        assert!(presets.is_empty());
    }

    #[test]
    fn test_click_toggle_round_trip() {
        let (mut doc, title) = sample();
        doc.set_style(title, "outline", "1px solid gray");
        let mut presets = PresetStore::from(vec![".other".to_string()]);
        let before_presets = presets.clone();
        let mut ctl = controller();
        ctl.activate(&mut doc, &presets);
        ctl.pointer_enter(&mut doc, &presets, title);
        let hovered_state = ctl.highlight(title);
        let hovered_outline = doc.style(title, "outline").map(str::to_string);

        let first = ctl.click(&mut doc, &mut presets, title).unwrap();
        assert_eq!(first.selector, "#title");
        assert_eq!(first.toggle, Toggle::Added);
        assert_eq!(ctl.highlight(title), HighlightState::Preset);

        let second = ctl.click(&mut doc, &mut presets, title).unwrap();
        assert_eq!(second.toggle, Toggle::Removed);
        assert_eq!(presets, before_presets);
        assert_eq!(ctl.highlight(title), hovered_state);
        assert_eq!(doc.style(title, "outline").map(str::to_string), hovered_outline);

        ctl.pointer_leave(&mut doc, title);
        assert_eq!(doc.style(title, "outline"), Some("1px solid gray"));
    }

    #[test]
    fn test_click_without_selector_is_noop() {
        let mut doc = crate::document::MemoryDocument::new();
        let body = doc.body();
        let bare = doc.append_element(body, "div", &[]);
        let mut presets = PresetStore::default();
        let mut ctl = controller();
        ctl.activate(&mut doc, &presets);

        assert!(ctl.click(&mut doc, &mut presets, bare).is_none());
        assert!(presets.is_empty());
    }

    #[test]
    fn test_panel_hover_wins() {
        let (mut doc, title) = sample();
        let presets = PresetStore::from(vec!["#title".to_string()]);
        let mut ctl = controller();
        ctl.activate(&mut doc, &presets);

        ctl.set_preset_hovered(&mut doc, "#title", true);
        assert_eq!(ctl.highlight(title), HighlightState::Hover);
        ctl.set_preset_hovered(&mut doc, "#title", false);
        assert_eq!(ctl.highlight(title), HighlightState::Preset);
    }
}
