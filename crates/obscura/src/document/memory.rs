//! In-memory document tree.
//!
//! An arena-backed element/text tree that implements [`Document`]. It loads
//! from and saves to a nested JSON snapshot:
//!
//! ```json
//! {
//!   "viewport": { "width": 1280, "height": 800 },
//!   "body": {
//!     "tag": "body",
//!     "children": [
//!       { "tag": "h1", "id": "title", "children": [ { "text": "Hello" } ] }
//!     ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Document, NodeId, Size};
use crate::selector::Selector;

/// Viewport used when a snapshot does not specify one.
const DEFAULT_VIEWPORT: Size = Size::new(1280.0, 800.0);

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    value: Option<String>,
    size: Size,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(ElementData),
    Text(String),
    /// Slot of a discarded node, waiting for reuse.
    Vacant,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An element in a document snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotElement {
    /// Tag name.
    pub tag: String,
    /// Identifier attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Class list, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Inline style properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,
    /// Current value of a form control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Rendered size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

/// A node in a document snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    /// A text leaf.
    Text {
        /// Text content.
        text: String,
    },
    /// An element.
    Element(SnapshotElement),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default = "default_viewport")]
    viewport: Size,
    body: SnapshotElement,
}

fn default_viewport() -> Size {
    DEFAULT_VIEWPORT
}

/// Arena-backed implementation of [`Document`].
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<NodeData>,
    vacant: Vec<NodeId>,
    body: NodeId,
    viewport: Size,
}

impl MemoryDocument {
    /// Create a document holding only an empty body.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            vacant: Vec::new(),
            body: NodeId(0),
            viewport: DEFAULT_VIEWPORT,
        };
        doc.body = doc.push(NodeKind::Element(ElementData {
            tag: "body".to_string(),
            id: None,
            classes: Vec::new(),
            style: BTreeMap::new(),
            value: None,
            size: DEFAULT_VIEWPORT,
        }));
        doc
    }

    /// Parse a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a valid snapshot.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        let mut doc = Self::new();
        doc.viewport = snapshot.viewport;
        let body = doc.body;
        doc.fill_element(body, snapshot.body);
        Ok(doc)
    }

    /// Serialize the attached tree as a pretty-printed JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let snapshot = Snapshot {
            viewport: self.viewport,
            body: self.snapshot_element(self.body),
        };
        serde_json::to_string_pretty(&snapshot)
    }

    /// Set the identifier attribute of an element.
    pub fn set_id(&mut self, node: NodeId, id: &str) {
        if let Some(el) = self.element_mut(node) {
            el.id = Some(id.to_string());
        }
    }

    /// Set the rendered size of an element.
    pub fn set_element_size(&mut self, node: NodeId, size: Size) {
        if let Some(el) = self.element_mut(node) {
            el.size = size;
        }
    }

    /// Set the viewport size.
    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = size;
    }

    /// Create an element with the given tag and classes and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, classes: &[&str]) -> NodeId {
        let node = self.create_element(tag, classes);
        self.append_child(parent, node);
        node
    }

    /// Number of node slots, live or vacant.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(id) = self.vacant.pop() {
            self.nodes[id.0] = data;
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(node.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn fill_element(&mut self, node: NodeId, snapshot: SnapshotElement) {
        if let Some(el) = self.element_mut(node) {
            el.tag = snapshot.tag.to_ascii_lowercase();
            el.id = snapshot.id;
            el.classes = snapshot.classes;
            el.style = snapshot.style;
            el.value = snapshot.value;
            if let Some(size) = snapshot.size {
                el.size = size;
            }
        }
        for child in snapshot.children {
            match child {
                SnapshotNode::Text { text } => {
                    self.append_text(node, &text);
                }
                SnapshotNode::Element(element) => {
                    let child_id = self.create_element(&element.tag, &[]);
                    self.append_child(node, child_id);
                    self.fill_element(child_id, element);
                }
            }
        }
    }

    fn snapshot_element(&self, node: NodeId) -> SnapshotElement {
        let Some(el) = self.element(node) else {
            return SnapshotElement::default();
        };
        let children = self.nodes[node.0]
            .children
            .iter()
            .filter_map(|&child| match &self.nodes[child.0].kind {
                NodeKind::Text(text) => Some(SnapshotNode::Text { text: text.clone() }),
                NodeKind::Element(_) => Some(SnapshotNode::Element(self.snapshot_element(child))),
                NodeKind::Vacant => None,
            })
            .collect();
        SnapshotElement {
            tag: el.tag.clone(),
            id: el.id.clone(),
            classes: el.classes.clone(),
            style: el.style.clone(),
            value: el.value.clone(),
            size: (el.size != Size::default()).then_some(el.size),
            children,
        }
    }

    /// Pre-order walk of the attached subtree rooted at `root`.
    fn walk(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            out.push(node);
            if let Some(data) = self.nodes.get(node.0) {
                stack.extend(data.children.iter().rev());
            }
        }
        out
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(node.0).and_then(|n| n.parent) else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != node);
        self.nodes[node.0].parent = None;
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn body(&self) -> NodeId {
        self.body
    }

    fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        let Some(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.elements()
            .into_iter()
            .filter(|&node| selector.matches(self, node))
            .collect()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    fn id(&self, node: NodeId) -> Option<&str> {
        self.element(node).and_then(|el| el.id.as_deref())
    }

    fn class_list(&self, node: NodeId) -> &[String] {
        self.element(node).map(|el| el.classes.as_slice()).unwrap_or(&[])
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            if !el.classes.iter().any(|c| c == class) {
                el.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            el.classes.retain(|c| c != class);
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node)
            .and_then(|el| el.style.get(property))
            .map(String::as_str)
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.style.insert(property.to_string(), value.to_string());
        }
    }

    fn remove_style(&mut self, node: NodeId, property: &str) {
        if let Some(el) = self.element_mut(node) {
            el.style.remove(property);
        }
    }

    fn value(&self, node: NodeId) -> Option<&str> {
        self.element(node).and_then(|el| el.value.as_deref())
    }

    fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.value = Some(value.to_string());
        }
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    fn text_nodes(&self, root: NodeId) -> Vec<NodeId> {
        self.walk(root)
            .into_iter()
            .filter(|&node| self.text(node).is_some())
            .collect()
    }

    fn elements(&self) -> Vec<NodeId> {
        self.walk(self.body)
            .into_iter()
            .filter(|&node| self.element(node).is_some())
            .collect()
    }

    fn create_element(&mut self, tag: &str, classes: &[&str]) -> NodeId {
        let mut unique: Vec<String> = Vec::with_capacity(classes.len());
        for class in classes {
            if !class.is_empty() && !unique.iter().any(|c| c == class) {
                unique.push((*class).to_string());
            }
        }
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            id: None,
            classes: unique,
            style: BTreeMap::new(),
            value: None,
            size: Size::default(),
        }))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.element(parent).is_none()
            || self
                .nodes
                .get(child.0)
                .is_none_or(|n| matches!(n.kind, NodeKind::Vacant))
            || self.is_inclusive_descendant(parent, child)
        {
            return;
        }
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let node = self.push(NodeKind::Text(text.to_string()));
        self.append_child(parent, node);
        node
    }

    fn remove(&mut self, node: NodeId) {
        self.detach(node);
    }

    fn discard(&mut self, node: NodeId) {
        let live = self
            .nodes
            .get(node.0)
            .is_some_and(|n| !matches!(n.kind, NodeKind::Vacant));
        if node == self.body || !live {
            return;
        }
        self.detach(node);
        for slot in self.walk(node) {
            self.nodes[slot.0] = NodeData {
                kind: NodeKind::Vacant,
                parent: None,
                children: Vec::new(),
            };
            self.vacant.push(slot);
        }
    }

    fn clear_children(&mut self, node: NodeId) {
        let Some(data) = self.nodes.get_mut(node.0) else {
            return;
        };
        let children = std::mem::take(&mut data.children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn element_size(&self, node: NodeId) -> Size {
        self.element(node).map_or(Size::default(), |el| el.size)
    }
}
