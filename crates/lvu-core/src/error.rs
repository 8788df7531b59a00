//! Error types shared by the document host, selector engine and scan.

use thiserror::Error;

use crate::dom::NodeId;

/// Failure reported by a document host operation.
#[derive(Debug, Error)]
pub enum DomError {
    /// The id does not name a node of this document.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    /// The operation needs a parent but the node is not in the tree.
    #[error("node {0} is detached from the document")]
    Detached(NodeId),
    /// The operation needs an element (attributes, styles, media).
    #[error("node {0} is not an element")]
    NotElement(NodeId),
    /// Reading or writing HTML failed.
    #[error("html i/o: {0}")]
    Html(#[from] std::io::Error),
}

/// Failure to parse a selector string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector {source_text:?} at byte {offset}: {message}")]
pub struct SelectorError {
    pub source_text: String,
    pub offset: usize,
    pub message: &'static str,
}

/// Failure while processing a single placeholder. Isolated per item: the scan
/// records it and moves on to the next placeholder.
#[derive(Debug, Error)]
#[error("placeholder {locator}: {source}")]
pub struct ScanError {
    pub locator: String,
    #[source]
    pub source: DomError,
}
