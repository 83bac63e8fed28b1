//! Selector derivation and matching.
//!
//! [`SelectorResolver`] turns an element into the stable selector string that
//! is stored as a preset. [`Selector`] parses the small compound-selector
//! grammar those strings use (`tag`, `#id`, `.class` and concatenations) so
//! that a document can match them again later.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::document::{Document, NodeId};
use crate::regions::Regions;

/// Whole compound selector: optional tag followed by `#id` / `.class` parts.
static COMPOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<tag>[A-Za-z][A-Za-z0-9-]*)?(?P<rest>(?:[#.][^#.\s]+)*)$")
        .expect("compound selector regex")
});

/// One `#id` or `.class` part.
static PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<kind>[#.])(?P<name>[^#.\s]+)").expect("part regex"));

/// A parsed compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
}

impl Selector {
    /// Parse a compound selector. Returns `None` for anything outside the
    /// supported grammar (combinators, attribute selectors, pseudo-classes).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let caps = COMPOUND.captures(input)?;

        let tag = caps.name("tag").map(|m| m.as_str().to_ascii_lowercase());
        let mut ids = Vec::new();
        let mut classes = Vec::new();
        if let Some(rest) = caps.name("rest") {
            for part in PART.captures_iter(rest.as_str()) {
                let name = part["name"].to_string();
                if &part["kind"] == "#" {
                    ids.push(name);
                } else {
                    classes.push(name);
                }
            }
        }

        if tag.is_none() && ids.is_empty() && classes.is_empty() {
            return None;
        }
        Some(Self { tag, ids, classes })
    }

    /// Build a class-only selector from a non-empty class list.
    fn from_classes<I, S>(classes: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes: Vec<String> = classes.into_iter().map(Into::into).collect();
        if classes.is_empty() {
            return None;
        }
        Some(Self {
            tag: None,
            ids: Vec::new(),
            classes,
        })
    }

    /// Whether `node` satisfies every part of this selector.
    pub fn matches<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        let Some(tag) = doc.tag_name(node) else {
            return false;
        };
        if let Some(wanted) = &self.tag {
            if !wanted.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if !self.ids.is_empty() && !self.ids.iter().all(|id| doc.id(node) == Some(id.as_str())) {
            return false;
        }
        self.classes.iter().all(|class| doc.has_class(node, class))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        }
        for id in &self.ids {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        Ok(())
    }
}

/// Derives the stable selector stored for an element.
///
/// Rules, first match wins:
/// 1. inside a protected region: the element's own classes minus reserved ones;
/// 2. a non-empty id: `#id`;
/// 3. the element's classes minus reserved ones;
/// 4. otherwise nothing.
///
/// Class order is kept as found on the element so the same element always
/// produces the same string.
#[derive(Debug, Clone)]
pub struct SelectorResolver {
    reserved_prefix: String,
    regions: Regions,
}

impl SelectorResolver {
    /// Create a resolver that drops classes starting with `reserved_prefix`.
    #[must_use]
    pub fn new(reserved_prefix: impl Into<String>, regions: Regions) -> Self {
        Self {
            reserved_prefix: reserved_prefix.into(),
            regions,
        }
    }

    /// Resolve the selector for `node`, or `None` if it cannot become a preset.
    pub fn resolve<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> Option<String> {
        doc.tag_name(node)?;

        if self.regions.is_protected(doc, node) {
            if let Some(selector) = self.class_selector(doc, node) {
                return Some(selector);
            }
        }

        if let Some(id) = doc.id(node).filter(|id| !id.is_empty()) {
            return Some(format!("#{id}"));
        }

        self.class_selector(doc, node)
    }

    fn class_selector<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> Option<String> {
        let kept = doc
            .class_list(node)
            .iter()
            .filter(|class| !class.is_empty() && !class.starts_with(&self.reserved_prefix))
            .map(String::as_str);
        Selector::from_classes(kept).map(|selector| selector.to_string())
    }
}
