//! HTML input and output for [`Tree`].
//!
//! Parsing goes through html5ever into an `RcDom` which is then copied into
//! the arena. Output walks the arena through html5ever's serializer.

use std::io;

use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::tree::{ElementData, NodeKind, Tree};
use super::NodeId;
use crate::error::DomError;

impl Tree {
    /// Parse a complete HTML document (html5ever fills in `html`, `head`
    /// and `body` when absent).
    pub fn parse_html(input: &str) -> Result<Self, DomError> {
        let dom: RcDom = parse_document(RcDom::default(), ParseOpts::default())
            .from_utf8()
            .read_from(&mut input.as_bytes())?;
        let mut tree = Tree::new();
        let root = tree.root();
        copy_children(&mut tree, root, &dom.document);
        Ok(tree)
    }

    /// Serialize the attached document back to HTML.
    pub fn to_html(&self) -> Result<String, DomError> {
        let mut buf = Vec::new();
        let doc = SerializableNode {
            tree: self,
            id: self.root(),
        };
        serialize(&mut buf, &doc, SerializeOpts::default())?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// One arena node as seen by html5ever's serializer.
struct SerializableNode<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl SerializableNode<'_> {
    fn at(&self, id: NodeId) -> Self {
        Self {
            tree: self.tree,
            id,
        }
    }

    fn children<S: Serializer>(&self, serializer: &mut S) -> io::Result<()> {
        for child in self.tree.children(self.id) {
            self.at(*child).node(serializer)?;
        }
        Ok(())
    }

    fn node<S: Serializer>(&self, serializer: &mut S) -> io::Result<()> {
        match &self.tree.nodes[self.id.0].kind {
            NodeKind::Document => self.children(serializer),
            NodeKind::Doctype(name) => serializer.write_doctype(name),
            NodeKind::Text(text) => serializer.write_text(text),
            NodeKind::Comment(text) => serializer.write_comment(text),
            NodeKind::Element(ElementData { name, attrs }) => {
                let attrs = attrs.iter().map(|a| (&a.name, &*a.value));
                serializer.start_elem(name.clone(), attrs)?;
                self.children(serializer)?;
                serializer.end_elem(name.clone())
            }
        }
    }
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S: Serializer>(
        &self,
        serializer: &mut S,
        traversal_scope: TraversalScope,
    ) -> io::Result<()> {
        match traversal_scope {
            TraversalScope::IncludeNode => self.node(serializer),
            TraversalScope::ChildrenOnly(_) => self.children(serializer),
        }
    }
}

fn copy_children(tree: &mut Tree, parent: NodeId, handle: &Handle) {
    for child in handle.children.borrow().iter() {
        let kind = match &child.data {
            NodeData::Element { name, attrs, .. } => NodeKind::Element(ElementData {
                name: name.clone(),
                attrs: attrs.borrow().clone(),
            }),
            NodeData::Text { contents } => NodeKind::Text(contents.borrow().to_string()),
            NodeData::Comment { contents } => NodeKind::Comment(contents.to_string()),
            NodeData::Doctype { name, .. } => NodeKind::Doctype(name.to_string()),
            NodeData::Document | NodeData::ProcessingInstruction { .. } => continue,
        };
        let id = tree.push(Some(parent), kind);
        // Template content lives in a separate fragment; keep it as children.
        if let NodeData::Element {
            template_contents, ..
        } = &child.data
        {
            if let Some(contents) = template_contents.borrow().as_ref() {
                copy_children(tree, id, contents);
            }
        }
        copy_children(tree, id, child);
    }
}
