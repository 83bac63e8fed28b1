//! Region membership checks.
//!
//! The host document is divided into areas that get special treatment:
//! protected regions (re-rendered by the host, so only classes survive there),
//! shell icon elements (never selectable, never blurred) and the management
//! panel itself.

use crate::config::RegionConfig;
use crate::document::{Document, NodeId};

/// Classifies elements by the host region they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regions {
    protected_classes: Vec<String>,
    shell_icon_classes: Vec<String>,
    panel_classes: Vec<String>,
}

impl Regions {
    /// Build region checks from configuration.
    #[must_use]
    pub fn new(config: &RegionConfig) -> Self {
        Self {
            protected_classes: config.protected_classes.clone(),
            shell_icon_classes: config.shell_icon_classes.clone(),
            panel_classes: vec![config.panel_class.clone()],
        }
    }

    /// Class of the management panel container.
    #[must_use]
    pub fn panel_class(&self) -> &str {
        &self.panel_classes[0]
    }

    /// Whether `node` is, or lies inside, a protected region.
    pub fn is_protected<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        doc.closest_with_any_class(node, &self.protected_classes)
            .is_some()
    }

    /// Whether `node` is, or lies inside, a shell icon element.
    pub fn is_shell_icon<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        doc.closest_with_any_class(node, &self.shell_icon_classes)
            .is_some()
    }

    /// Whether `node` is, or lies inside, the management panel.
    pub fn is_panel<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        doc.closest_with_any_class(node, &self.panel_classes).is_some()
    }

    /// Whether pointer interaction with `node` is ignored by selection mode:
    /// the body, shell icons and the panel are never selectable.
    pub fn is_ignored_target<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        node == doc.body()
            || doc.tag_name(node).is_none()
            || self.is_shell_icon(doc, node)
            || self.is_panel(doc, node)
    }
}

impl Default for Regions {
    fn default() -> Self {
        Self::new(&RegionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;

    fn sample() -> (MemoryDocument, NodeId, NodeId, NodeId, NodeId) {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let editor = doc.create_element("div", &["cm-editor"]);
        doc.append_child(body, editor);
        let line = doc.create_element("div", &["cm-line"]);
        doc.append_child(editor, line);
        let ribbon = doc.create_element("div", &["side-dock-ribbon"]);
        doc.append_child(body, ribbon);
        let icon = doc.create_element("span", &["icon"]);
        doc.append_child(ribbon, icon);
        let panel = doc.create_element("div", &["blur-manage-panel"]);
        doc.append_child(body, panel);
        (doc, line, icon, panel, editor)
    }

    #[test]
    fn test_protected_region_includes_descendants() {
        let (doc, line, icon, _, editor) = sample();
        let regions = Regions::default();

        assert!(regions.is_protected(&doc, editor));
        assert!(regions.is_protected(&doc, line));
        assert!(!regions.is_protected(&doc, icon));
    }

    #[test]
    fn test_shell_icon_detection() {
        let (doc, line, icon, _, _) = sample();
        let regions = Regions::default();

        assert!(regions.is_shell_icon(&doc, icon));
        assert!(!regions.is_shell_icon(&doc, line));
    }

    #[test]
    fn test_ignored_targets() {
        let (doc, line, icon, panel, _) = sample();
        let regions = Regions::default();

        assert!(regions.is_ignored_target(&doc, doc.body()));
        assert!(regions.is_ignored_target(&doc, icon));
        assert!(regions.is_ignored_target(&doc, panel));
        assert!(!regions.is_ignored_target(&doc, line));
    }

    #[test]
    fn test_panel_class_from_config() {
        let config = RegionConfig {
            panel_class: "my-panel".to_string(),
            ..RegionConfig::default()
        };
        assert_eq!(Regions::new(&config).panel_class(), "my-panel");
    }
}
