//! Transient highlight states shown while presets are being managed.
//!
//! Each tracked element carries a set of [`Triggers`]; its visible
//! [`HighlightState`] is always recomputed from them by
//! [`Triggers::resolve`], never toggled piecemeal. Rendering mirrors the
//! effect engine's region split: marker classes inside protected regions,
//! the inline `outline` property everywhere else.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::config::HighlightConfig;
use crate::document::{Document, NodeId};
use crate::regions::Regions;
use crate::selector::Selector;
use crate::settings::PresetStore;

/// Inline style property owned by highlights.
const OUTLINE: &str = "outline";

/// Visual classification of an element, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightState {
    /// Its panel list item is hovered.
    Hover,
    /// The pointer is over it and its own selector is not stored.
    Selecting,
    /// It matches a stored preset.
    Preset,
    /// Not highlighted.
    None,
}

/// Conditions that can highlight an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triggers {
    /// Its panel list item is hovered.
    pub hovered: bool,
    /// The pointer is over it in selection mode.
    pub pointer_over: bool,
    /// Its own resolved selector is stored.
    pub own_stored: bool,
    /// It matches any stored preset.
    pub stored: bool,
}

impl Triggers {
    /// Resolve the state these triggers produce.
    #[must_use]
    pub fn resolve(self) -> HighlightState {
        if self.hovered {
            HighlightState::Hover
        } else if self.pointer_over && !self.own_stored {
            HighlightState::Selecting
        } else if self.stored || self.pointer_over {
            HighlightState::Preset
        } else {
            HighlightState::None
        }
    }

    fn is_idle(self) -> bool {
        self == Self::default()
    }
}

#[derive(Debug, Clone, Default)]
struct Tracked {
    triggers: Triggers,
    /// Inline outline found before the first highlight was drawn.
    saved_outline: Option<Option<String>>,
}

/// Marker classes for the three visible states.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MarkerClasses {
    selecting: String,
    preset: String,
    hover: String,
}

impl MarkerClasses {
    fn new(prefix: &str) -> Self {
        Self {
            selecting: format!("{prefix}selecting"),
            preset: format!("{prefix}preset"),
            hover: format!("{prefix}hover"),
        }
    }

    fn for_state(&self, state: HighlightState) -> Option<&str> {
        match state {
            HighlightState::Hover => Some(self.hover.as_str()),
            HighlightState::Selecting => Some(self.selecting.as_str()),
            HighlightState::Preset => Some(self.preset.as_str()),
            HighlightState::None => None,
        }
    }

    fn all(&self) -> [&str; 3] {
        [
            self.selecting.as_str(),
            self.preset.as_str(),
            self.hover.as_str(),
        ]
    }
}

/// Per-element highlight state machine.
#[derive(Debug, Clone)]
pub struct Highlighter {
    regions: Regions,
    classes: MarkerClasses,
    outlines: HighlightConfig,
    tracked: HashMap<NodeId, Tracked>,
}

impl Highlighter {
    /// Create a highlighter whose marker classes start with `reserved_prefix`.
    #[must_use]
    pub fn new(reserved_prefix: &str, regions: Regions, outlines: HighlightConfig) -> Self {
        Self {
            regions,
            classes: MarkerClasses::new(reserved_prefix),
            outlines,
            tracked: HashMap::new(),
        }
    }

    /// Current state of `node`.
    #[must_use]
    pub fn state(&self, node: NodeId) -> HighlightState {
        self.tracked
            .get(&node)
            .map_or(HighlightState::None, |t| t.triggers.resolve())
    }

    /// Number of elements currently highlighted.
    #[must_use]
    pub fn highlighted_count(&self) -> usize {
        self.tracked
            .values()
            .filter(|t| t.triggers.resolve() != HighlightState::None)
            .count()
    }

    /// Record whether the pointer is over `node` and whether its own
    /// selector is stored.
    pub fn set_pointer_over<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        node: NodeId,
        over: bool,
        own_stored: bool,
    ) {
        self.update(doc, node, |t| {
            t.pointer_over = over;
            t.own_stored = over && own_stored;
        });
    }

    /// Record whether the panel item of `node` is hovered.
    pub fn set_hovered<D: Document + ?Sized>(&mut self, doc: &mut D, node: NodeId, hovered: bool) {
        self.update(doc, node, |t| t.hovered = hovered);
    }

    /// Set the hover trigger on every element `selector` matches.
    pub fn set_selector_hovered<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        selector: &str,
        hovered: bool,
    ) {
        for node in doc.query_selector_all(selector) {
            self.set_hovered(doc, node, hovered);
        }
    }

    /// Recompute the stored trigger of every element against `presets`.
    ///
    /// Elements matched by any preset (all matches of each) gain it,
    /// previously tracked elements that no longer match lose it.
    pub fn sync_presets<D: Document + ?Sized>(&mut self, doc: &mut D, presets: &PresetStore) {
        let mut matched: Vec<NodeId> = Vec::new();
        for selector in presets.iter() {
            if Selector::parse(selector).is_none() {
                trace!(selector, "Preset cannot be matched");
                continue;
            }
            for node in doc.query_selector_all(selector) {
                if !self.regions.is_panel(&*doc, node) && !matched.contains(&node) {
                    matched.push(node);
                }
            }
        }

        let mut stale: Vec<NodeId> = self
            .tracked
            .iter()
            .filter(|(node, t)| t.triggers.stored && !matched.contains(*node))
            .map(|(node, _)| *node)
            .collect();
        stale.sort();

        for node in stale {
            self.update(doc, node, |t| t.stored = false);
        }
        for node in &matched {
            self.update(doc, *node, |t| t.stored = true);
        }
        debug!(matched = matched.len(), "Preset highlights synced");
    }

    /// Remove every highlight, restoring the outlines found before them.
    ///
    /// The document is also swept for marker classes and configured outlines
    /// left on elements this highlighter no longer tracks.
    pub fn clear_all<D: Document + ?Sized>(&mut self, doc: &mut D) {
        let mut nodes: Vec<NodeId> = self.tracked.keys().copied().collect();
        nodes.sort();
        for node in nodes {
            self.update(doc, node, |t| *t = Triggers::default());
        }
        self.tracked.clear();

        for node in doc.elements() {
            for class in self.classes.all() {
                if doc.has_class(node, class) {
                    doc.remove_class(node, class);
                }
            }
            let stray = doc
                .style(node, OUTLINE)
                .is_some_and(|value| self.is_configured_outline(value));
            if stray {
                doc.remove_style(node, OUTLINE);
            }
        }
        debug!("Highlights cleared");
    }

    fn update<D, F>(&mut self, doc: &mut D, node: NodeId, change: F)
    where
        D: Document + ?Sized,
        F: FnOnce(&mut Triggers),
    {
        let entry = self.tracked.entry(node).or_default();
        let before = entry.triggers.resolve();
        change(&mut entry.triggers);
        let after = entry.triggers.resolve();

        if before != after {
            trace!(%node, ?before, ?after, "Highlight state changed");
            let protected = self.regions.is_protected(&*doc, node);
            render(doc, node, after, protected, &self.classes, &self.outlines, entry);
        }
        if entry.triggers.is_idle() {
            self.tracked.remove(&node);
        }
    }

    fn is_configured_outline(&self, value: &str) -> bool {
        [
            &self.outlines.preset_outline,
            &self.outlines.selecting_outline,
            &self.outlines.hover_outline,
        ]
        .iter()
        .any(|outline| outline.as_str() == value)
    }
}

fn render<D: Document + ?Sized>(
    doc: &mut D,
    node: NodeId,
    state: HighlightState,
    protected: bool,
    classes: &MarkerClasses,
    outlines: &HighlightConfig,
    entry: &mut Tracked,
) {
    if protected {
        for class in classes.all() {
            doc.remove_class(node, class);
        }
        if let Some(class) = classes.for_state(state) {
            doc.add_class(node, class);
        }
        return;
    }

    let outline = match state {
        HighlightState::Hover => Some(&outlines.hover_outline),
        HighlightState::Selecting => Some(&outlines.selecting_outline),
        HighlightState::Preset => Some(&outlines.preset_outline),
        HighlightState::None => None,
    };
    match outline {
        Some(value) => {
            if entry.saved_outline.is_none() {
                entry.saved_outline = Some(doc.style(node, OUTLINE).map(str::to_string));
            }
            doc.set_style(node, OUTLINE, value);
        }
        None => match entry.saved_outline.take() {
            Some(Some(previous)) => doc.set_style(node, OUTLINE, &previous),
            _ => doc.remove_style(node, OUTLINE),
        },
    }
}
