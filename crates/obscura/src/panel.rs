//! Floating management panel.
//!
//! The panel is an ordinary subtree of the host document, appended to the
//! body under the configured panel class so every "inside the panel" check
//! applies to it. It owns no data: lists are rendered from the stores the
//! caller passes in, after each settings transaction has completed.

use tracing::{debug, trace};

use crate::config::PanelConfig;
use crate::document::{Document, NodeId};
use crate::settings::{KeywordStore, PresetStore};
use crate::shell::Shell;

const HANDLE_CLASS: &str = "blur-panel-handle";
const TITLE_CLASS: &str = "blur-panel-title";
const CLOSE_CLASS: &str = "blur-panel-close";
const TABS_CLASS: &str = "blur-panel-tabs";
const TAB_CLASS: &str = "blur-panel-tab";
const ACTIVE_TAB_CLASS: &str = "is-active";
const CONTENT_CLASS: &str = "blur-panel-content";
const SELECTOR_CONTAINER_CLASS: &str = "selector-container";
const KEYWORD_CONTAINER_CLASS: &str = "keyword-container";
const PRESET_LIST_CLASS: &str = "preset-list";
const PRESET_ITEM_CLASS: &str = "preset-item";
const PRESET_SELECTOR_CLASS: &str = "preset-selector";
const PRESET_DELETE_CLASS: &str = "preset-delete-btn";
const KEYWORD_INPUT_CLASS: &str = "keyword-input";
const KEYWORD_ADD_CLASS: &str = "keyword-add-btn";
const KEYWORD_LIST_CLASS: &str = "keyword-list";
const KEYWORD_ITEM_CLASS: &str = "keyword-item";
const KEYWORD_TEXT_CLASS: &str = "keyword-text";
const KEYWORD_DELETE_CLASS: &str = "keyword-delete-btn";
const EMPTY_CLASS: &str = "empty-list";

/// The two views sharing the panel body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanelView {
    /// Stored selectors.
    #[default]
    Presets,
    /// Stored keywords.
    Keywords,
}

/// Panel offset from the viewport's top-left corner, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    /// Horizontal offset.
    pub x: f64,
    /// Vertical offset.
    pub y: f64,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// What a click inside the panel asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    /// The close button.
    Close,
    /// A view tab.
    ShowView(PanelView),
    /// The delete button of the preset at this index.
    DeletePreset(usize),
    /// The delete button of the keyword at this index.
    DeleteKeyword(usize),
    /// The add button next to the keyword input.
    AddKeyword,
}

#[derive(Debug, Clone)]
struct PanelNodes {
    root: NodeId,
    handle: NodeId,
    close: NodeId,
    preset_tab: NodeId,
    keyword_tab: NodeId,
    selector_container: NodeId,
    keyword_container: NodeId,
    keyword_input: NodeId,
    keyword_add: NodeId,
    preset_list: NodeId,
    keyword_list: NodeId,
}

#[derive(Debug, Clone)]
struct OpenPanel {
    nodes: PanelNodes,
    view: PanelView,
    position: Position,
    /// Pointer offset inside the panel while a drag is captured.
    drag_offset: Option<Position>,
    preset_items: Vec<NodeId>,
    keyword_items: Vec<NodeId>,
}

/// The management panel's view state.
#[derive(Debug, Clone)]
pub struct ManagementPanel {
    panel_class: String,
    default_position: Position,
    open: Option<OpenPanel>,
}

impl ManagementPanel {
    /// Create a closed panel.
    #[must_use]
    pub fn new(panel_class: &str, config: &PanelConfig) -> Self {
        Self {
            panel_class: panel_class.to_string(),
            default_position: Position::new(config.default_x, config.default_y),
            open: None,
        }
    }

    /// Whether the panel is currently attached.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Root element of the open panel.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.open.as_ref().map(|p| p.nodes.root)
    }

    /// Close button of the open panel.
    #[must_use]
    pub fn close_button(&self) -> Option<NodeId> {
        self.open.as_ref().map(|p| p.nodes.close)
    }

    /// Active view, `None` while closed.
    #[must_use]
    pub fn view(&self) -> Option<PanelView> {
        self.open.as_ref().map(|p| p.view)
    }

    /// Current position, `None` while closed.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.open.as_ref().map(|p| p.position)
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.open.as_ref().is_some_and(|p| p.drag_offset.is_some())
    }

    /// List element of the preset at `index`.
    #[must_use]
    pub fn preset_item(&self, index: usize) -> Option<NodeId> {
        self.open.as_ref().and_then(|p| p.preset_items.get(index).copied())
    }

    /// List element of the keyword at `index`.
    #[must_use]
    pub fn keyword_item(&self, index: usize) -> Option<NodeId> {
        self.open.as_ref().and_then(|p| p.keyword_items.get(index).copied())
    }

    /// Text input of the keyword view.
    #[must_use]
    pub fn keyword_input(&self) -> Option<NodeId> {
        self.open.as_ref().map(|p| p.nodes.keyword_input)
    }

    /// What the user typed into the keyword input.
    pub fn keyword_draft<D: Document + ?Sized>(&self, doc: &D) -> Option<String> {
        self.keyword_input()
            .and_then(|input| doc.value(input))
            .map(str::to_string)
    }

    /// Empty the keyword input.
    pub fn clear_keyword_input<D: Document + ?Sized>(&self, doc: &mut D) {
        if let Some(input) = self.keyword_input() {
            doc.set_value(input, "");
        }
    }

    /// Build the panel, attach it to the body and render both lists.
    ///
    /// The position resets to its default on every open. Opening an open
    /// panel does nothing.
    pub fn open<D, H>(
        &mut self,
        doc: &mut D,
        shell: &H,
        presets: &PresetStore,
        keywords: &KeywordStore,
    ) -> NodeId
    where
        D: Document + ?Sized,
        H: Shell + ?Sized,
    {
        if let Some(root) = self.root() {
            return root;
        }

        let root = doc.create_element("div", &[self.panel_class.as_str()]);

        let handle = doc.create_element("div", &[HANDLE_CLASS]);
        let title = doc.create_element("span", &[TITLE_CLASS]);
        doc.append_text(title, &shell.translate("panel.title"));
        doc.append_child(handle, title);
        let close = doc.create_element("button", &[CLOSE_CLASS]);
        doc.append_text(close, "×");
        doc.append_child(handle, close);
        doc.append_child(root, handle);

        let tabs = doc.create_element("div", &[TABS_CLASS]);
        let preset_tab = doc.create_element("button", &[TAB_CLASS, ACTIVE_TAB_CLASS]);
        doc.append_text(preset_tab, &shell.translate("panel.tab_presets"));
        doc.append_child(tabs, preset_tab);
        let keyword_tab = doc.create_element("button", &[TAB_CLASS]);
        doc.append_text(keyword_tab, &shell.translate("panel.tab_keywords"));
        doc.append_child(tabs, keyword_tab);
        doc.append_child(root, tabs);

        let content = doc.create_element("div", &[CONTENT_CLASS]);
        let selector_container = doc.create_element("div", &[SELECTOR_CONTAINER_CLASS]);
        let preset_list = doc.create_element("ul", &[PRESET_LIST_CLASS]);
        doc.append_child(selector_container, preset_list);
        doc.append_child(content, selector_container);

        let keyword_container = doc.create_element("div", &[KEYWORD_CONTAINER_CLASS]);
        let input = doc.create_element("input", &[KEYWORD_INPUT_CLASS]);
        doc.append_child(keyword_container, input);
        let add = doc.create_element("button", &[KEYWORD_ADD_CLASS]);
        doc.append_text(add, "+");
        doc.append_child(keyword_container, add);
        let keyword_list = doc.create_element("ul", &[KEYWORD_LIST_CLASS]);
        doc.append_child(keyword_container, keyword_list);
        doc.append_child(content, keyword_container);
        doc.append_child(root, content);

        let body = doc.body();
        doc.append_child(body, root);

        self.open = Some(OpenPanel {
            nodes: PanelNodes {
                root,
                handle,
                close,
                preset_tab,
                keyword_tab,
                selector_container,
                keyword_container,
                keyword_input: input,
                keyword_add: add,
                preset_list,
                keyword_list,
            },
            view: PanelView::Presets,
            position: self.default_position,
            drag_offset: None,
            preset_items: Vec::new(),
            keyword_items: Vec::new(),
        });
        self.show_view(doc, PanelView::Presets);
        self.place(doc);
        self.render_presets(doc, shell, presets);
        self.render_keywords(doc, shell, keywords);
        debug!(%root, "Panel opened");
        root
    }

    /// Detach the panel. Closing a closed panel does nothing.
    pub fn close<D: Document + ?Sized>(&mut self, doc: &mut D) -> bool {
        let Some(open) = self.open.take() else {
            return false;
        };
        doc.discard(open.nodes.root);
        debug!("Panel closed");
        true
    }

    /// Re-render the preset list.
    pub fn render_presets<D, H>(&mut self, doc: &mut D, shell: &H, presets: &PresetStore)
    where
        D: Document + ?Sized,
        H: Shell + ?Sized,
    {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        doc.discard(open.nodes.preset_list);
        let list = doc.create_element("ul", &[PRESET_LIST_CLASS]);
        doc.append_child(open.nodes.selector_container, list);
        open.nodes.preset_list = list;
        open.preset_items.clear();

        if presets.is_empty() {
            let empty = doc.create_element("li", &[EMPTY_CLASS]);
            doc.append_text(empty, &shell.translate("panel.no_presets"));
            doc.append_child(list, empty);
            return;
        }

        for selector in presets.iter() {
            let item = doc.create_element("li", &[PRESET_ITEM_CLASS]);
            let label = doc.create_element("span", &[PRESET_SELECTOR_CLASS]);
            doc.append_text(label, selector);
            doc.append_child(item, label);
            let delete = doc.create_element("button", &[PRESET_DELETE_CLASS]);
            doc.append_text(delete, "×");
            doc.append_child(item, delete);
            doc.append_child(list, item);
            open.preset_items.push(item);
        }
        trace!(count = presets.len(), "Preset list rendered");
    }

    /// Re-render the keyword list.
    pub fn render_keywords<D, H>(&mut self, doc: &mut D, shell: &H, keywords: &KeywordStore)
    where
        D: Document + ?Sized,
        H: Shell + ?Sized,
    {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        doc.discard(open.nodes.keyword_list);
        let list = doc.create_element("ul", &[KEYWORD_LIST_CLASS]);
        doc.append_child(open.nodes.keyword_container, list);
        open.nodes.keyword_list = list;
        open.keyword_items.clear();

        if keywords.is_empty() {
            let empty = doc.create_element("li", &[EMPTY_CLASS]);
            doc.append_text(empty, &shell.translate("panel.no_keywords"));
            doc.append_child(list, empty);
            return;
        }

        for keyword in keywords.iter() {
            let item = doc.create_element("li", &[KEYWORD_ITEM_CLASS]);
            let label = doc.create_element("span", &[KEYWORD_TEXT_CLASS]);
            doc.append_text(label, keyword);
            doc.append_child(item, label);
            let delete = doc.create_element("button", &[KEYWORD_DELETE_CLASS]);
            doc.append_text(delete, "×");
            doc.append_child(item, delete);
            doc.append_child(list, item);
            open.keyword_items.push(item);
        }
        trace!(count = keywords.len(), "Keyword list rendered");
    }

    /// Switch the visible view.
    pub fn switch_view<D: Document + ?Sized>(&mut self, doc: &mut D, view: PanelView) {
        if self.view().is_some_and(|current| current != view) {
            self.show_view(doc, view);
            debug!(?view, "Panel view switched");
        }
    }

    /// Capture a drag at pointer position `pointer`.
    pub fn begin_drag(&mut self, pointer: Position) {
        if let Some(open) = self.open.as_mut() {
            open.drag_offset = Some(Position::new(
                pointer.x - open.position.x,
                pointer.y - open.position.y,
            ));
        }
    }

    /// Move a captured panel so it follows `pointer`, clamped to the viewport.
    pub fn drag_to<D: Document + ?Sized>(&mut self, doc: &mut D, pointer: Position) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let Some(offset) = open.drag_offset else {
            return;
        };

        let viewport = doc.viewport_size();
        let size = doc.element_size(open.nodes.root);
        let max_x = (viewport.width - size.width).max(0.0);
        let max_y = (viewport.height - size.height).max(0.0);
        open.position = Position::new(
            (pointer.x - offset.x).clamp(0.0, max_x),
            (pointer.y - offset.y).clamp(0.0, max_y),
        );
        self.place(doc);
    }

    /// Release a captured drag.
    pub fn end_drag(&mut self) {
        if let Some(open) = self.open.as_mut() {
            open.drag_offset = None;
        }
    }

    /// Whether `node` lies inside the open panel.
    pub fn contains<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        self.root()
            .is_some_and(|root| doc.is_inclusive_descendant(node, root))
    }

    /// Whether a pointer-down on `node` starts a drag: inside the handle
    /// but not on the close button.
    pub fn is_drag_handle<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        self.open.as_ref().is_some_and(|p| {
            doc.is_inclusive_descendant(node, p.nodes.handle)
                && !doc.is_inclusive_descendant(node, p.nodes.close)
        })
    }

    /// Index of the preset whose list item is exactly `node`.
    #[must_use]
    pub fn preset_index(&self, node: NodeId) -> Option<usize> {
        self.open
            .as_ref()
            .and_then(|p| p.preset_items.iter().position(|item| *item == node))
    }

    /// Map a click on `node` to the control it hit.
    pub fn action_for<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> Option<PanelAction> {
        let open = self.open.as_ref()?;
        let nodes = &open.nodes;
        let mut current = Some(node);
        while let Some(n) = current {
            if n == nodes.close {
                return Some(PanelAction::Close);
            }
            if n == nodes.preset_tab {
                return Some(PanelAction::ShowView(PanelView::Presets));
            }
            if n == nodes.keyword_tab {
                return Some(PanelAction::ShowView(PanelView::Keywords));
            }
            if n == nodes.keyword_add {
                return Some(PanelAction::AddKeyword);
            }
            if doc.has_class(n, PRESET_DELETE_CLASS) {
                let item = doc.parent(n)?;
                return open
                    .preset_items
                    .iter()
                    .position(|i| *i == item)
                    .map(PanelAction::DeletePreset);
            }
            if doc.has_class(n, KEYWORD_DELETE_CLASS) {
                let item = doc.parent(n)?;
                return open
                    .keyword_items
                    .iter()
                    .position(|i| *i == item)
                    .map(PanelAction::DeleteKeyword);
            }
            if n == nodes.root {
                return None;
            }
            current = doc.parent(n);
        }
        None
    }

    fn show_view<D: Document + ?Sized>(&mut self, doc: &mut D, view: PanelView) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        open.view = view;
        let nodes = &open.nodes;
        let (shown, hidden, active, inactive) = match view {
            PanelView::Presets => (
                nodes.selector_container,
                nodes.keyword_container,
                nodes.preset_tab,
                nodes.keyword_tab,
            ),
            PanelView::Keywords => (
                nodes.keyword_container,
                nodes.selector_container,
                nodes.keyword_tab,
                nodes.preset_tab,
            ),
        };
        doc.remove_style(shown, "display");
        doc.set_style(hidden, "display", "none");
        doc.add_class(active, ACTIVE_TAB_CLASS);
        doc.remove_class(inactive, ACTIVE_TAB_CLASS);
    }

    fn place<D: Document + ?Sized>(&self, doc: &mut D) {
        if let Some(open) = &self.open {
            let Position { x, y } = open.position;
            doc.set_style(
                open.nodes.root,
                "transform",
                &format!("translate3d({x}px, {y}px, 0)"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MemoryDocument, Size};
    use crate::shell::RecordingShell;

    fn panel() -> ManagementPanel {
        ManagementPanel::new("blur-manage-panel", &PanelConfig::default())
    }

    fn texts(doc: &MemoryDocument, root: NodeId) -> Vec<String> {
        doc.text_nodes(root)
            .into_iter()
            .filter_map(|n| doc.text(n).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_open_attaches_panel_at_default_position() {
        let mut doc = MemoryDocument::new();
        let mut panel = panel();
        let shell = RecordingShell::new();

        let root = panel.open(&mut doc, &shell, &PresetStore::default(), &KeywordStore::default());

        assert_eq!(doc.query_selector(".blur-manage-panel"), Some(root));
        assert_eq!(panel.position(), Some(Position::new(20.0, 50.0)));
        assert_eq!(doc.style(root, "transform"), Some("translate3d(20px, 50px, 0)"));
        assert_eq!(panel.view(), Some(PanelView::Presets));
        assert!(texts(&doc, root).contains(&"No elements selected".to_string()));
        assert!(texts(&doc, root).contains(&"No keywords added".to_string()));
    }

    #[test]
    fn test_render_lists_in_store_order() {
        let mut doc = MemoryDocument::new();
        let mut panel = panel();
        let shell = RecordingShell::new();
        let presets = PresetStore::from(vec!["#b".to_string(), ".a".to_string()]);
        let keywords = KeywordStore::from(vec!["secret".to_string()]);

        panel.open(&mut doc, &shell, &presets, &keywords);

        let items = doc.query_selector_all(".preset-selector");
        let labels: Vec<String> = items.iter().flat_map(|n| texts(&doc, *n)).collect();
        assert_eq!(labels, vec!["#b".to_string(), ".a".to_string()]);
        assert_eq!(doc.query_selector_all(".keyword-item").len(), 1);
        assert_eq!(panel.preset_item(1), doc.parent(items[1]));
        assert_eq!(panel.preset_item(2), None);
    }

    #[test]
    fn test_rerender_replaces_items() {
        let mut doc = MemoryDocument::new();
        let mut panel = panel();
        let shell = RecordingShell::new();
        let mut presets = PresetStore::from(vec!["#a".to_string()]);
        panel.open(&mut doc, &shell, &presets, &KeywordStore::default());

        presets.add("#b");
        panel.render_presets(&mut doc, &shell, &presets);
        assert_eq!(doc.query_selector_all(".preset-item").len(), 2);

        presets.clear();
        panel.render_presets(&mut doc, &shell, &presets);
        assert!(doc.query_selector_all(".preset-item").is_empty());
        assert_eq!(doc.query_selector_all(".empty-list").len(), 2);
    }

    #[test]
    fn test_switch_view_toggles_display() {
        let mut doc = MemoryDocument::new();
        let mut panel = panel();
        let shell = RecordingShell::new();
        panel.open(&mut doc, &shell, &PresetStore::default(), &KeywordStore::default());
        let selectors = doc.query_selector(".selector-container").unwrap();
        let keywords = doc.query_selector(".keyword-container").unwrap();
        assert_eq!(doc.style(keywords, "display"), Some("none"));

        panel.switch_view(&mut doc, PanelView::Keywords);

        assert_eq!(panel.view(), Some(PanelView::Keywords));
        assert_eq!(doc.style(selectors, "display"), Some("none"));
        assert_eq!(doc.style(keywords, "display"), None);
        let active = doc.query_selector_all(".blur-panel-tab.is-active");
        assert_eq!(active.len(), 1);
        assert_eq!(texts(&doc, active[0]), vec!["Keywords".to_string()]);
    }

    #[test]
    fn test_drag_clamps_to_viewport() {
        let mut doc = MemoryDocument::new();
        doc.set_viewport(Size::new(800.0, 600.0));
        let mut panel = panel();
        let shell = RecordingShell::new();
        let root = panel.open(&mut doc, &shell, &PresetStore::default(), &KeywordStore::default());
        doc.set_element_size(root, Size::new(300.0, 200.0));

        panel.begin_drag(Position::new(30.0, 60.0));
        panel.drag_to(&mut doc, Position::new(110.0, 90.0));
        assert_eq!(panel.position(), Some(Position::new(100.0, 80.0)));

        panel.drag_to(&mut doc, Position::new(5000.0, -100.0));
        assert_eq!(panel.position(), Some(Position::new(500.0, 0.0)));
        assert_eq!(doc.style(root, "transform"), Some("translate3d(500px, 0px, 0)"));

        panel.end_drag();
        panel.drag_to(&mut doc, Position::new(0.0, 0.0));
        assert_eq!(panel.position(), Some(Position::new(500.0, 0.0)));
    }

    #[test]
    fn test_panel_larger_than_viewport_pins_to_origin() {
        let mut doc = MemoryDocument::new();
        doc.set_viewport(Size::new(200.0, 100.0));
        let mut panel = panel();
        let shell = RecordingShell::new();
        let root = panel.open(&mut doc, &shell, &PresetStore::default(), &KeywordStore::default());
        doc.set_element_size(root, Size::new(300.0, 200.0));

        panel.begin_drag(Position::new(20.0, 50.0));
        panel.drag_to(&mut doc, Position::new(90.0, 90.0));

        assert_eq!(panel.position(), Some(Position::new(0.0, 0.0)));
    }

    #[test]
    fn test_action_for_controls() {
        let mut doc = MemoryDocument::new();
        let mut panel = panel();
        let shell = RecordingShell::new();
        let presets = PresetStore::from(vec!["#a".to_string(), "#b".to_string()]);
        let keywords = KeywordStore::from(vec!["secret".to_string()]);
        panel.open(&mut doc, &shell, &presets, &keywords);

        let close = panel.close_button().unwrap();
        assert_eq!(panel.action_for(&doc, close), Some(PanelAction::Close));

        let tabs = doc.query_selector_all(".blur-panel-tab");
        let tab_label = doc.text_nodes(tabs[1])[0];
        assert_eq!(
            panel.action_for(&doc, tab_label),
            Some(PanelAction::ShowView(PanelView::Keywords))
        );

        let deletes = doc.query_selector_all(".preset-delete-btn");
        assert_eq!(
            panel.action_for(&doc, deletes[1]),
            Some(PanelAction::DeletePreset(1))
        );
        let keyword_delete = doc.query_selector(".keyword-delete-btn").unwrap();
        assert_eq!(
            panel.action_for(&doc, keyword_delete),
            Some(PanelAction::DeleteKeyword(0))
        );

        let add = doc.query_selector(".keyword-add-btn").unwrap();
        let add_label = doc.text_nodes(add)[0];
        assert_eq!(panel.action_for(&doc, add_label), Some(PanelAction::AddKeyword));

        let label = doc.query_selector(".preset-selector").unwrap();
        assert_eq!(panel.action_for(&doc, label), None);
        let input = doc.query_selector(".keyword-input").unwrap();
        assert_eq!(panel.action_for(&doc, input), None);
        assert_eq!(panel.action_for(&doc, doc.body()), None);
    }

    #[test]
    fn test_keyword_draft_reads_and_clears_input() {
        let mut doc = MemoryDocument::new();
        let mut panel = panel();
        let shell = RecordingShell::new();
        assert_eq!(panel.keyword_draft(&doc), None);
        panel.open(&mut doc, &shell, &PresetStore::default(), &KeywordStore::default());

        let input = doc.query_selector(".keyword-input").unwrap();
        assert_eq!(panel.keyword_input(), Some(input));
        doc.set_value(input, " secret ");
        assert_eq!(panel.keyword_draft(&doc).as_deref(), Some(" secret "));

        panel.clear_keyword_input(&mut doc);
        assert_eq!(panel.keyword_draft(&doc).as_deref(), Some(""));
    }

    #[test]
    fn test_rerender_reuses_document_slots() {
        let mut doc = MemoryDocument::new();
        let mut panel = panel();
        let shell = RecordingShell::new();
        let presets = PresetStore::from(vec!["#a".to_string(), "#b".to_string()]);
        let keywords = KeywordStore::from(vec!["secret".to_string()]);
        panel.open(&mut doc, &shell, &presets, &keywords);
        panel.render_presets(&mut doc, &shell, &presets);
        panel.render_keywords(&mut doc, &shell, &keywords);
        let capacity = doc.capacity();

        for _ in 0..50 {
            panel.render_presets(&mut doc, &shell, &presets);
            panel.render_keywords(&mut doc, &shell, &keywords);
        }
        panel.close(&mut doc);
        panel.open(&mut doc, &shell, &presets, &keywords);

        assert_eq!(doc.capacity(), capacity);
        assert_eq!(doc.query_selector_all(".preset-item").len(), 2);
        assert_eq!(doc.query_selector_all(".keyword-item").len(), 1);
    }

    #[test]
    fn test_drag_handle_excludes_close_button() {
        let mut doc = MemoryDocument::new();
        let mut panel = panel();
        let shell = RecordingShell::new();
        panel.open(&mut doc, &shell, &PresetStore::default(), &KeywordStore::default());

        let handle = doc.query_selector(".blur-panel-handle").unwrap();
        let title = doc.query_selector(".blur-panel-title").unwrap();
        let close = panel.close_button().unwrap();
        let list = doc.query_selector(".preset-list").unwrap();

        assert!(panel.is_drag_handle(&doc, handle));
        assert!(panel.is_drag_handle(&doc, title));
        assert!(!panel.is_drag_handle(&doc, close));
        assert!(!panel.is_drag_handle(&doc, list));
        assert!(panel.contains(&doc, list));
        assert!(!panel.contains(&doc, doc.body()));
    }

    #[test]
    fn test_close_detaches_and_reopen_resets_position() {
        let mut doc = MemoryDocument::new();
        let mut panel = panel();
        let shell = RecordingShell::new();
        let root = panel.open(&mut doc, &shell, &PresetStore::default(), &KeywordStore::default());
        doc.set_element_size(root, Size::new(10.0, 10.0));
        panel.begin_drag(Position::new(20.0, 50.0));
        panel.drag_to(&mut doc, Position::new(120.0, 150.0));

        assert!(panel.close(&mut doc));
        assert!(!panel.close(&mut doc));
        assert!(doc.query_selector(".blur-manage-panel").is_none());

        panel.open(&mut doc, &shell, &PresetStore::default(), &KeywordStore::default());
        assert_eq!(panel.position(), Some(Position::new(20.0, 50.0)));
        assert!(!panel.is_dragging());
    }
}
