//! Host document capability.
//!
//! Every component talks to the live content document through the
//! [`Document`] trait: query by selector, element introspection, class and
//! inline style mutation, and the small amount of tree construction the
//! management panel needs. [`MemoryDocument`] is the in-process
//! implementation used by the CLI and the tests.

mod memory;

use std::fmt;

pub use memory::{MemoryDocument, SnapshotElement, SnapshotNode};

/// Opaque handle to a node of a [`Document`].
///
/// A handle stays valid until its node is passed to [`Document::discard`]; a
/// node that was only removed from the tree simply stops matching queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Width and height in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Capability interface over the host's content document.
///
/// Implementations must be deterministic: the same tree yields the same
/// query results in the same (tree) order.
pub trait Document {
    /// The document body, root of every traversal.
    fn body(&self) -> NodeId;

    /// First attached element matching `selector`, in tree order.
    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.query_selector_all(selector).into_iter().next()
    }

    /// Every attached element matching `selector`, in tree order.
    ///
    /// A selector the document cannot interpret matches nothing.
    fn query_selector_all(&self, selector: &str) -> Vec<NodeId>;

    /// Parent element, `None` for the body and detached nodes.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Lowercase tag name, `None` for text leaves.
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    /// Identifier attribute, if present.
    fn id(&self, node: NodeId) -> Option<&str>;

    /// Class list in the order the classes were added.
    fn class_list(&self, node: NodeId) -> &[String];

    /// Add a class; adding a present class is a no-op.
    fn add_class(&mut self, node: NodeId, class: &str);

    /// Remove a class; removing an absent class is a no-op.
    fn remove_class(&mut self, node: NodeId, class: &str);

    /// Inline style property value.
    fn style(&self, node: NodeId, property: &str) -> Option<&str>;

    /// Set an inline style property.
    fn set_style(&mut self, node: NodeId, property: &str, value: &str);

    /// Remove an inline style property.
    fn remove_style(&mut self, node: NodeId, property: &str);

    /// Current value of a form control such as an `input`.
    fn value(&self, node: NodeId) -> Option<&str>;

    /// Set the value of a form control.
    fn set_value(&mut self, node: NodeId, value: &str);

    /// Content of a text leaf, `None` for elements.
    fn text(&self, node: NodeId) -> Option<&str>;

    /// Text leaves below `root`, in tree order.
    fn text_nodes(&self, root: NodeId) -> Vec<NodeId>;

    /// Every attached element (body included), in tree order.
    fn elements(&self) -> Vec<NodeId>;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str, classes: &[&str]) -> NodeId;

    /// Append `child` as the last child of `parent`, detaching it first.
    fn append_child(&mut self, parent: NodeId, child: NodeId);

    /// Append a text leaf to `parent`.
    fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId;

    /// Detach `node` (and its subtree) from the tree.
    fn remove(&mut self, node: NodeId);

    /// Remove `node` and release its subtree. Handles into the subtree must
    /// not be used afterwards; the document may hand them out again.
    fn discard(&mut self, node: NodeId) {
        self.remove(node);
    }

    /// Detach every child of `node`.
    fn clear_children(&mut self, node: NodeId);

    /// Size of the visible viewport.
    fn viewport_size(&self) -> Size;

    /// Rendered size of an element.
    fn element_size(&self, node: NodeId) -> Size;

    /// Whether `node` carries `class`.
    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.class_list(node).iter().any(|c| c == class)
    }

    /// Nearest inclusive ancestor carrying any of `classes`.
    fn closest_with_any_class(&self, node: NodeId, classes: &[String]) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if classes.iter().any(|class| self.has_class(n, class)) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// Whether `node` is `ancestor` or lies below it.
    fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }
}
