#![forbid(unsafe_code)]

//! Headless document model.
//!
//! A [`Document`] is a single-threaded, shared tree of element and text
//! nodes rooted at a `<body>` element. It stands in for the browser host:
//! components create their containers here, toggle class names, read and
//! write inline styles, and receive events through [`Document::dispatch`].
//!
//! # Invariants
//!
//! 1. Every attached node has exactly one parent, and the tree is acyclic.
//! 2. [`NodeId`]s are never reused. A released id simply stops resolving.
//! 3. No internal borrow is held while an event handler runs, so handlers
//!    may mutate the document (including releasing the nodes being
//!    dispatched to).
//! 4. Released subtrees are dropped outside the internal borrow, so handler
//!    closures that own other document handles can tear down safely.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Stale id | Node released | Queries return `None`/`false`, mutations `Err(NodeNotFound)` |
//! | Wrong parent | `remove_child` on a non-child | `Err(NotAChild)` |
//! | Cycle | Inserting an ancestor below its descendant | `Err(HierarchyRequest)` |
//! | Text as element | Class/attribute call on a text node | `Err(NotAnElement)` |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::error::DomError;
use crate::event::{Event, EventKind, Handler, ListenerId};

/// Tag of the document root.
pub const BODY_TAG: &str = "body";

thread_local! {
    static GLOBAL_DOCUMENT: Document = Document::new();
}

/// Identifier of a node within one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw id value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
struct ElementData {
    tag: String,
    class_name: String,
    attributes: Vec<(String, String)>,
    style: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(ElementData),
    Text(String),
}

struct Listener {
    id: ListenerId,
    kind: EventKind,
    handler: Handler,
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<Listener>,
}

struct Tree {
    nodes: AHashMap<NodeId, NodeData>,
    body: NodeId,
    next_node: u64,
    next_listener: u64,
}

impl Tree {
    fn new() -> Self {
        let mut tree = Self {
            nodes: AHashMap::new(),
            body: NodeId(0),
            next_node: 0,
            next_listener: 0,
        };
        tree.body = tree.insert(NodeKind::Element(ElementData {
            tag: BODY_TAG.to_owned(),
            ..ElementData::default()
        }));
        tree
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            id,
            NodeData {
                kind,
                parent: None,
                children: Vec::new(),
                listeners: Vec::new(),
            },
        );
        id
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(&id).ok_or(DomError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes.get_mut(&id).ok_or(DomError::NodeNotFound(id))
    }

    fn element(&self, id: NodeId) -> Result<&ElementData, DomError> {
        match &self.node(id)?.kind {
            NodeKind::Element(element) => Ok(element),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(element) => Ok(element),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Ancestors of `node`, nearest first, starting with `node` itself.
    fn path(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(data) = self.nodes.get(&id) else {
                break;
            };
            path.push(id);
            current = data.parent;
        }
        path
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get(&child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = None;
        }
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.element(parent)?;
        self.node(child)?;
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if reference == Some(child) {
            return Ok(());
        }
        if let Some(reference) = reference
            && self.node(reference)?.parent != Some(parent)
        {
            return Err(DomError::NotAChild {
                parent,
                child: reference,
            });
        }

        self.detach(child);
        let siblings = &mut self.node_mut(parent)?.children;
        let index = reference
            .and_then(|r| siblings.iter().position(|c| *c == r))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach `id` and remove its whole subtree, handing the data back so
    /// the caller can drop it after releasing the borrow.
    fn release(&mut self, id: NodeId) -> Vec<NodeData> {
        self.detach(id);
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(data) = self.nodes.remove(&next) {
                stack.extend(data.children.iter().copied());
                removed.push(data);
            }
        }
        removed
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(&id) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) => escape_into(text, false, out),
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                if !element.class_name.is_empty() {
                    out.push_str(" class=\"");
                    escape_into(&element.class_name, true, out);
                    out.push('"');
                }
                for (name, value) in &element.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                if !element.style.is_empty() {
                    let style = element
                        .style
                        .iter()
                        .map(|(k, v)| format!("{k}: {v}"))
                        .collect::<Vec<_>>()
                        .join("; ");
                    out.push_str(" style=\"");
                    escape_into(&style, true, out);
                    out.push('"');
                }
                out.push('>');
                for child in &data.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }

    fn write_text(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(&id) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for child in &data.children {
                    self.write_text(*child, out);
                }
            }
        }
    }
}

fn escape_into(raw: &str, attribute: bool, out: &mut String) {
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// CSS initial value for properties the components read back.
fn initial_style_value(property: &str) -> &'static str {
    match property {
        "overflow" | "visibility" => "visible",
        "opacity" => "1",
        "display" => "inline",
        _ => "",
    }
}

/// Shared handle to a document tree.
///
/// Cloning is cheap and yields another handle to the same tree.
#[derive(Clone)]
pub struct Document {
    tree: Rc<RefCell<Tree>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("body", &self.body())
            .field("nodes", &self.len())
            .finish()
    }
}

impl Document {
    /// Create an empty document containing only `<body>`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: Rc::new(RefCell::new(Tree::new())),
        }
    }

    /// The ambient document for the current thread.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_DOCUMENT.with(Clone::clone)
    }

    /// Whether two handles refer to the same tree.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }

    /// The `<body>` element.
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.tree.borrow().body
    }

    /// Number of live nodes (attached or detached).
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.borrow().nodes.len()
    }

    /// Always false: a document has at least its body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.borrow().nodes.is_empty()
    }

    /// Whether `node` still resolves.
    #[must_use]
    pub fn exists(&self, node: NodeId) -> bool {
        self.tree.borrow().nodes.contains_key(&node)
    }

    // --- Construction ---

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.tree.borrow_mut().insert(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            ..ElementData::default()
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: impl Into<String>) -> NodeId {
        self.tree.borrow_mut().insert(NodeKind::Text(text.into()))
    }

    /// Detach `node` and free it together with its subtree and listeners.
    ///
    /// Releasing an unknown node is a no-op.
    pub fn release(&self, node: NodeId) {
        let removed = self.tree.borrow_mut().release(node);
        drop(removed);
    }

    // --- Structure ---

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.tree.borrow_mut().insert_child(parent, child, None)
    }

    /// Insert `child` before `reference` (or last when `None`).
    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.tree.borrow_mut().insert_child(parent, child, reference)
    }

    /// Detach `child` from `parent`. The node stays alive.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        tree.node(parent)?;
        if tree.node(child)?.parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        tree.detach(child);
        Ok(())
    }

    /// Parent of `node`, if attached.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.borrow().nodes.get(&node).and_then(|n| n.parent)
    }

    /// Children of `node` in order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Whether `node` is `ancestor` or lies below it.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let tree = self.tree.borrow();
        tree.nodes.contains_key(&ancestor) && tree.contains(ancestor, node)
    }

    /// All nodes below `node` in document order.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = tree
            .nodes
            .get(&node)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(data) = tree.nodes.get(&next) {
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    // --- Element data ---

    /// Lowercase tag name, or `None` for text and unknown nodes.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.tree.borrow().element(node).ok().map(|e| e.tag.clone())
    }

    /// Whether `node` is a text node.
    #[must_use]
    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(
            self.tree.borrow().nodes.get(&node).map(|n| &n.kind),
            Some(NodeKind::Text(_))
        )
    }

    /// Replace the full `class` attribute.
    pub fn set_class_name(&self, node: NodeId, class_name: &str) -> Result<(), DomError> {
        self.tree.borrow_mut().element_mut(node)?.class_name = class_name.to_owned();
        Ok(())
    }

    /// Raw `class` attribute.
    #[must_use]
    pub fn class_name(&self, node: NodeId) -> Option<String> {
        self.tree
            .borrow()
            .element(node)
            .ok()
            .map(|e| e.class_name.clone())
    }

    /// Whitespace-separated class tokens.
    #[must_use]
    pub fn class_list(&self, node: NodeId) -> Vec<String> {
        self.class_name(node)
            .map(|c| c.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    /// Whether the class token is present.
    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.tree
            .borrow()
            .element(node)
            .map(|e| e.class_name.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Append a class token if missing.
    pub fn add_class(&self, node: NodeId, class: &str) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        let element = tree.element_mut(node)?;
        if element.class_name.split_whitespace().any(|c| c == class) {
            return Ok(());
        }
        if !element.class_name.is_empty() {
            element.class_name.push(' ');
        }
        element.class_name.push_str(class);
        Ok(())
    }

    /// Set an attribute, keeping its original position when it exists.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        let attributes = &mut tree.element_mut(node)?.attributes;
        match attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_owned(),
            None => attributes.push((name.to_owned(), value.to_owned())),
        }
        Ok(())
    }

    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree.borrow().element(node).ok().and_then(|e| {
            e.attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), DomError> {
        self.tree
            .borrow_mut()
            .element_mut(node)?
            .attributes
            .retain(|(k, _)| k != name);
        Ok(())
    }

    /// Set an inline style property.
    pub fn set_style(&self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        let style = &mut tree.element_mut(node)?.style;
        match style.iter_mut().find(|(k, _)| k == property) {
            Some((_, v)) => *v = value.to_owned(),
            None => style.push((property.to_owned(), value.to_owned())),
        }
        Ok(())
    }

    /// Inline style property, if set.
    #[must_use]
    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.tree.borrow().element(node).ok().and_then(|e| {
            e.style
                .iter()
                .find(|(k, _)| k == property)
                .map(|(_, v)| v.clone())
        })
    }

    pub fn remove_style(&self, node: NodeId, property: &str) -> Result<(), DomError> {
        self.tree
            .borrow_mut()
            .element_mut(node)?
            .style
            .retain(|(k, _)| k != property);
        Ok(())
    }

    /// Effective value: the inline style or the property's initial value.
    #[must_use]
    pub fn computed_style(&self, node: NodeId, property: &str) -> String {
        self.style(node, property)
            .unwrap_or_else(|| initial_style_value(property).to_owned())
    }

    // --- Text ---

    /// Replace the data of a text node.
    pub fn set_text(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.tree.borrow_mut().node_mut(node)?.kind {
            NodeKind::Text(data) => {
                text.clone_into(data);
                Ok(())
            }
            NodeKind::Element(_) => Err(DomError::NotAnElement(node)),
        }
    }

    /// Concatenated text of `node` and its descendants.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.tree.borrow().write_text(node, &mut out);
        out
    }

    /// Serialize `node` and its subtree as HTML.
    #[must_use]
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.tree.borrow().write_html(node, &mut out);
        out
    }

    // --- Events ---

    /// Register a listener on `node`.
    pub fn add_event_listener(
        &self,
        node: NodeId,
        kind: EventKind,
        handler: Handler,
    ) -> Result<ListenerId, DomError> {
        let mut tree = self.tree.borrow_mut();
        let id = ListenerId(tree.next_listener);
        tree.node_mut(node)?.listeners.push(Listener { id, kind, handler });
        tree.next_listener += 1;
        Ok(id)
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn remove_event_listener(&self, node: NodeId, listener: ListenerId) -> bool {
        let removed = {
            let mut tree = self.tree.borrow_mut();
            let Some(data) = tree.nodes.get_mut(&node) else {
                return false;
            };
            let Some(index) = data.listeners.iter().position(|l| l.id == listener) else {
                return false;
            };
            data.listeners.remove(index)
        };
        drop(removed);
        true
    }

    /// Dispatch an event at `target`, bubbling through its ancestors.
    ///
    /// The propagation path is fixed before the first handler runs. Nodes
    /// released by an earlier handler are skipped. Returns how many
    /// handlers ran.
    pub fn dispatch(&self, target: NodeId, kind: EventKind) -> usize {
        let path = self.tree.borrow().path(target);
        let mut invoked = 0;
        for current in path {
            let handlers: Vec<Handler> = {
                let tree = self.tree.borrow();
                let Some(data) = tree.nodes.get(&current) else {
                    continue;
                };
                data.listeners
                    .iter()
                    .filter(|l| l.kind == kind)
                    .map(|l| Rc::clone(&l.handler))
                    .collect()
            };
            let event = Event {
                kind,
                target,
                current_target: current,
            };
            for handler in handlers {
                handler(&event);
                invoked += 1;
            }
        }
        tracing::trace!(%target, event = kind.name(), invoked, "dispatched event");
        invoked
    }
}
