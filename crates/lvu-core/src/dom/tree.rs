//! Arena-backed document tree implementing [`Document`].

use std::collections::HashMap;

use html5ever::{namespace_url, ns, Attribute, LocalName, QualName};

use super::selector::{self, SelectorList};
use super::{Document, MediaElement, NodeId, PROCESSED_ATTR};
use crate::error::DomError;

#[derive(Debug, Clone)]
pub(super) enum NodeKind {
    Document,
    Doctype(String),
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub(super) struct ElementData {
    pub(super) name: QualName,
    pub(super) attrs: Vec<Attribute>,
}

#[derive(Debug, Clone)]
pub(super) struct Node {
    pub(super) kind: NodeKind,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
}

/// In-memory document.
///
/// Nodes are never freed: a removed node stays addressable (detached) so late
/// events referring to it can still be answered. Structural changes under the
/// root are counted for [`Document::take_changes`]; attribute and style writes
/// are not, matching a child-list subtree observer.
#[derive(Debug, Clone)]
pub struct Tree {
    pub(super) nodes: Vec<Node>,
    changes: usize,
    load_attempts: HashMap<NodeId, u32>,
    started_loads: Vec<NodeId>,
}

const ROOT: NodeId = NodeId(0);

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Empty document with only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            changes: 0,
            load_attempts: HashMap::new(),
            started_loads: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// Append a node without recording a change; used while building.
    pub(super) fn push(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs.iter().map(|(k, v)| attribute(k, v)).collect();
        let name = QualName::new(None, ns!(html), LocalName::from(name.to_ascii_lowercase()));
        self.push(None, NodeKind::Element(ElementData { name, attrs }))
    }

    #[cfg(test)]
    pub(crate) fn create_text(&mut self, text: &str) -> NodeId {
        self.push(None, NodeKind::Text(text.to_string()))
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(parent)?;
        self.node(child)?;
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        self.record_change(parent);
        Ok(())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element(e) => Some(&*e.name.local),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes.
    #[cfg(test)]
    pub(crate) fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(n) = self.nodes.get(id.0) else {
                continue;
            };
            if let NodeKind::Text(t) = &n.kind {
                out.push_str(t);
            }
            stack.extend(n.children.iter().rev());
        }
        out
    }

    /// Value of one inline style property.
    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let style = self.attr_ref(node, "style")?;
        parse_style(style)
            .into_iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(property))
            .map(|(_, v)| v)
    }

    /// How many loads have been started for a media element so far.
    pub fn load_attempts(&self, node: NodeId) -> u32 {
        self.load_attempts.get(&node).copied().unwrap_or(0)
    }

    /// Media elements whose load started since the previous call, in order.
    pub fn take_started_loads(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.started_loads)
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(e)) => Ok(e),
            Some(_) => Err(DomError::NotElement(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    fn attr_ref(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(e) => e
                .attrs
                .iter()
                .find(|a| (*a.name.local).eq_ignore_ascii_case(name))
                .map(|a| &*a.value),
            _ => None,
        }
    }

    fn detach(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.0].parent.take()?;
        self.nodes[parent.0].children.retain(|c| *c != node);
        Some(parent)
    }

    fn record_change(&mut self, parent: NodeId) {
        if self.is_attached(parent) {
            self.changes += 1;
        }
    }

    fn start_load(&mut self, node: NodeId) {
        *self.load_attempts.entry(node).or_insert(0) += 1;
        self.started_loads.push(node);
    }

    fn is_template(&self, id: NodeId) -> bool {
        match &self.nodes[id.0].kind {
            NodeKind::Element(e) => e.name.ns == ns!(html) && &*e.name.local == "template",
            _ => false,
        }
    }

    fn element_ref(&self, id: NodeId) -> Option<ElementRef<'_>> {
        match self.nodes.get(id.0)?.kind {
            NodeKind::Element(_) => Some(ElementRef { tree: self, id }),
            _ => None,
        }
    }
}

impl Document for Tree {
    fn query_all(&self, selectors: &SelectorList) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            if let Some(el) = self.element_ref(id) {
                if selectors.matches(el) {
                    out.push(id);
                }
            }
            if !self.is_template(id) {
                stack.extend(self.nodes[id.0].children.iter().rev());
            }
        }
        out
    }

    fn closest(&self, node: NodeId, selectors: &SelectorList) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(el) = self.element_ref(id) {
                if selectors.matches(el) {
                    return Some(id);
                }
            }
            current = self.parent(id);
        }
        None
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.attr_ref(node, name).map(str::to_string)
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let el = self.element_mut(node)?;
        match el.attrs.iter_mut().find(|a| (*a.name.local).eq_ignore_ascii_case(name)) {
            Some(a) => a.value = value.into(),
            None => el.attrs.push(attribute(name, value)),
        }
        Ok(())
    }

    fn rendered_width(&self, node: NodeId) -> Option<u32> {
        self.attr_ref(node, "width")?
            .trim()
            .trim_end_matches("px")
            .parse::<u32>()
            .ok()
            .filter(|w| *w > 0)
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let current = self.attr_ref(node, "style").unwrap_or_default();
        let mut decls = parse_style(current);
        match decls
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(property))
        {
            Some((_, v)) => *v = value.to_string(),
            None => decls.push((property.to_string(), value.to_string())),
        }
        let joined = decls
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr(node, "style", &joined)
    }

    fn create_media(&mut self, media: &MediaElement) -> Result<NodeId, DomError> {
        let style = media.style();
        let mut attrs: Vec<(&str, &str)> = vec![("src", media.src.as_str())];
        if media.controls {
            attrs.push(("controls", ""));
        }
        attrs.push(("style", style.as_str()));
        attrs.push((PROCESSED_ATTR, "true"));
        let id = self.create_element("video", &attrs);
        self.start_load(id);
        Ok(id)
    }

    fn replace_with(&mut self, old: NodeId, new: NodeId) -> Result<(), DomError> {
        self.node(old)?;
        self.node(new)?;
        let parent = self.nodes[old.0].parent.ok_or(DomError::Detached(old))?;
        if old == new {
            return Ok(());
        }
        self.detach(new);
        let siblings = &mut self.nodes[parent.0].children;
        let Some(idx) = siblings.iter().position(|c| *c == old) else {
            return Err(DomError::Detached(old));
        };
        siblings[idx] = new;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        self.record_change(parent);
        Ok(())
    }

    fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.node(node)?;
        if let Some(parent) = self.detach(node) {
            self.record_change(parent);
        }
        Ok(())
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == ROOT {
                return true;
            }
            match self.parent(current) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    fn restart_load(&mut self, node: NodeId) -> Result<(), DomError> {
        self.element_mut(node)?;
        self.start_load(node);
        Ok(())
    }

    fn take_changes(&mut self) -> usize {
        std::mem::take(&mut self.changes)
    }
}

/// Borrowed element handle used for selector matching.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl selector::Element for ElementRef<'_> {
    fn local_name(&self) -> &str {
        self.tree.element_name(self.id).unwrap_or_default()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.tree.attr_ref(self.id, name)
    }

    fn parent_element(&self) -> Option<Self> {
        let parent = self.tree.parent(self.id)?;
        self.tree.element_ref(parent)
    }
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, ns!(), LocalName::from(name.to_ascii_lowercase())),
        value: value.into(),
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}
