//! Host document abstraction.
//!
//! The engine never touches a concrete DOM. Everything it needs from the page
//! goes through [`Document`]: selector queries, attribute and style access,
//! element construction, structural swaps, and an explicit media reload.
//! [`Tree`] is the in-memory implementation used by the CLI and the tests.

mod html;
pub mod selector;
mod tree;

use std::fmt;

use crate::error::DomError;

pub use selector::SelectorList;
pub use tree::Tree;

/// Attribute carrying the processed flag on placeholders and replacements.
pub const PROCESSED_ATTR: &str = "data-replaced";

/// Opaque handle to a node owned by a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Width of a replacement media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaWidth {
    /// Fixed width inherited from the placeholder's rendered width.
    Pixels(u32),
    /// Fill the available width.
    Fill,
}

/// Description of a playable media element to construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaElement {
    pub src: String,
    pub controls: bool,
    pub width: MediaWidth,
}

impl MediaElement {
    /// Inline style for the element.
    pub fn style(&self) -> String {
        match self.width {
            MediaWidth::Pixels(px) => format!("width: {px}px; max-width: 100%"),
            MediaWidth::Fill => "width: 100%; max-width: 100%".to_string(),
        }
    }
}

/// Operations the engine requires from the host document.
///
/// Implementations are driven from a single thread; no method is called while
/// another is running.
pub trait Document {
    /// All elements matching `selectors`, in document order, each once.
    /// Only nodes attached to the document are returned.
    fn query_all(&self, selectors: &SelectorList) -> Vec<NodeId>;

    /// Nearest inclusive ancestor of `node` matching `selectors`.
    fn closest(&self, node: NodeId, selectors: &SelectorList) -> Option<NodeId>;

    fn attr(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    /// Rendered width in pixels, if the host knows one.
    fn rendered_width(&self, node: NodeId) -> Option<u32>;

    /// Set one inline style property, keeping the others.
    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), DomError>;

    /// Build a detached media element. Its load begins immediately.
    fn create_media(&mut self, media: &MediaElement) -> Result<NodeId, DomError>;

    /// Put `new` where `old` is and detach `old`.
    fn replace_with(&mut self, old: NodeId, new: NodeId) -> Result<(), DomError>;

    /// Detach `node` from the tree. Detaching a detached node is a no-op.
    fn remove(&mut self, node: NodeId) -> Result<(), DomError>;

    fn is_attached(&self, node: NodeId) -> bool;

    /// Discard the current load attempt of a media element and begin a new
    /// one against the same source.
    fn restart_load(&mut self, node: NodeId) -> Result<(), DomError>;

    /// Number of structural subtree changes since the previous call.
    ///
    /// Hosts that deliver mutation notifications on their own may always
    /// return 0.
    fn take_changes(&mut self) -> usize;
}

pub fn is_processed<D: Document + ?Sized>(doc: &D, node: NodeId) -> bool {
    doc.attr(node, PROCESSED_ATTR).is_some()
}

pub fn mark_processed<D: Document + ?Sized>(doc: &mut D, node: NodeId) -> Result<(), DomError> {
    doc.set_attr(node, PROCESSED_ATTR, "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_style_pixels_and_fill() {
        let px = MediaElement {
            src: "https://cdn.example.com/a.mp4".to_string(),
            controls: true,
            width: MediaWidth::Pixels(320),
        };
        assert_eq!(px.style(), "width: 320px; max-width: 100%");

        let fill = MediaElement {
            width: MediaWidth::Fill,
            ..px
        };
        assert_eq!(fill.style(), "width: 100%; max-width: 100%");
    }

    #[test]
    fn processed_flag_roundtrip_on_tree() {
        let mut tree = Tree::parse_html("<img src=\"/x.jpg\">").unwrap();
        let imgs = tree.query_all(&SelectorList::parse("img").unwrap());
        assert_eq!(imgs.len(), 1);
        assert!(!is_processed(&tree, imgs[0]));
        mark_processed(&mut tree, imgs[0]).unwrap();
        assert!(is_processed(&tree, imgs[0]));
        assert_eq!(tree.attr(imgs[0], PROCESSED_ATTR).as_deref(), Some("true"));
    }
}
