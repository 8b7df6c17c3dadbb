#![forbid(unsafe_code)]

//! Declarative views and the position-keyed reconciler.
//!
//! A [`View`] describes what a container should hold. A [`Root`] turns that
//! description into document nodes and, on every later [`Root::render`],
//! patches the existing nodes instead of recreating them. Components rely on
//! this: a node handed out once (for example the dialog surface) keeps its
//! identity while its classes move between states.
//!
//! # Reconciliation rules
//!
//! - Fragments are flattened and `Empty` views are skipped before matching.
//! - Children are matched by position. Same tag (or text against text)
//!   patches in place; anything else replaces the old subtree.
//! - Listeners are replaced wholesale on every patch, so closures always
//!   observe the latest render.
//! - Surplus old nodes are released (detached and freed with their
//!   listeners).
//!
//! # Example
//!
//! ```
//! use bx_core::dom::Document;
//! use bx_core::view::{Element, Root, View};
//!
//! let doc = Document::new();
//! let mut root = Root::new(&doc, doc.body());
//! root.render(Element::new("p").class("greeting").child("Hello").into()).unwrap();
//! let p = doc.children(doc.body())[0];
//!
//! root.render(Element::new("p").class("farewell").child("Bye").into()).unwrap();
//! assert_eq!(doc.children(doc.body())[0], p);
//! assert_eq!(doc.to_html(p), "<p class=\"farewell\">Bye</p>");
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::dom::{Document, NodeId};
use crate::error::DomError;
use crate::event::{Event, EventKind, Handler, ListenerId};

/// A declarative description of document content.
#[derive(Clone, Default)]
pub enum View {
    /// Renders nothing.
    #[default]
    Empty,
    Element(Element),
    Text(String),
    /// Several siblings without a wrapper.
    Fragment(Vec<View>),
}

impl View {
    /// A text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Siblings without a wrapper element.
    pub fn fragment(children: impl IntoIterator<Item = impl Into<View>>) -> Self {
        Self::Fragment(children.into_iter().map(Into::into).collect())
    }

    /// The element, if this view is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Number of nodes this view places directly in its container.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Element(_) | Self::Text(_) => 1,
            Self::Fragment(children) => children.iter().map(View::node_count).sum(),
        }
    }

    fn flatten_into(self, out: &mut Vec<Flat>) {
        match self {
            Self::Empty => {}
            Self::Element(element) => out.push(Flat::Element(element)),
            Self::Text(text) => out.push(Flat::Text(text)),
            Self::Fragment(children) => {
                for child in children {
                    child.flatten_into(out);
                }
            }
        }
    }

    fn flatten(self) -> Vec<Flat> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Element(element) => element.fmt(f),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
        }
    }
}

impl From<Element> for View {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<View>> for View {
    fn from(children: Vec<View>) -> Self {
        Self::Fragment(children)
    }
}

/// An element description built fluently.
#[derive(Clone)]
pub struct Element {
    tag: String,
    class: Option<String>,
    attributes: Vec<(String, String)>,
    style: Vec<(String, String)>,
    listeners: Vec<(EventKind, Handler)>,
    children: Vec<View>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("class", &self.class)
            .field("attributes", &self.attributes)
            .field("style", &self.style)
            .field(
                "listeners",
                &self.listeners.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            )
            .field("children", &self.children)
            .finish()
    }
}

impl Element {
    /// Create an element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            class: None,
            attributes: Vec::new(),
            style: Vec::new(),
            listeners: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Set the class attribute. An empty string clears it.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.set_class(Some(class.into()));
        self
    }

    /// Current class attribute.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn set_class(&mut self, class: Option<String>) {
        self.class = class.filter(|c| !c.is_empty());
    }

    /// Set an attribute, replacing any previous value.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an inline style property.
    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        let property = property.into();
        let value = value.into();
        match self.style.iter_mut().find(|(k, _)| *k == property) {
            Some((_, v)) => *v = value,
            None => self.style.push((property, value)),
        }
        self
    }

    /// Attach an event listener.
    pub fn on(self, kind: EventKind, handler: impl Fn(&Event) + 'static) -> Self {
        self.on_handler(kind, Rc::new(handler))
    }

    /// Attach an already shared event listener.
    pub fn on_handler(mut self, kind: EventKind, handler: Handler) -> Self {
        self.listeners.push((kind, handler));
        self
    }

    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = impl Into<View>>) -> Self {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn child_views(&self) -> &[View] {
        &self.children
    }
}

/// A view with fragments and empties stripped: one node each.
enum Flat {
    Element(Element),
    Text(String),
}

/// Bookkeeping for one rendered node.
struct Rendered {
    node: NodeId,
    shape: Shape,
    attributes: Vec<String>,
    style: Vec<String>,
    listeners: Vec<ListenerId>,
    children: Vec<Rendered>,
}

#[derive(PartialEq, Eq)]
enum Shape {
    Element(String),
    Text,
}

impl Rendered {
    fn matches(&self, view: &Flat) -> bool {
        match (&self.shape, view) {
            (Shape::Text, Flat::Text(_)) => true,
            (Shape::Element(tag), Flat::Element(element)) => *tag == element.tag,
            _ => false,
        }
    }
}

fn create(doc: &Document, view: Flat) -> Result<Rendered, DomError> {
    match view {
        Flat::Element(element) => {
            let node = doc.create_element(&element.tag);
            let mut rendered = Rendered {
                node,
                shape: Shape::Element(element.tag.clone()),
                attributes: Vec::new(),
                style: Vec::new(),
                listeners: Vec::new(),
                children: Vec::new(),
            };
            if let Err(error) = apply(doc, &mut rendered, element) {
                doc.release(node);
                return Err(error);
            }
            Ok(rendered)
        }
        Flat::Text(text) => Ok(Rendered {
            node: doc.create_text(text),
            shape: Shape::Text,
            attributes: Vec::new(),
            style: Vec::new(),
            listeners: Vec::new(),
            children: Vec::new(),
        }),
    }
}

/// Bring an existing element node in line with `element`.
fn apply(doc: &Document, rendered: &mut Rendered, element: Element) -> Result<(), DomError> {
    let node = rendered.node;
    doc.set_class_name(node, element.class.as_deref().unwrap_or(""))?;

    for stale in rendered
        .attributes
        .iter()
        .filter(|name| !element.attributes.iter().any(|(k, _)| k == *name))
    {
        doc.remove_attribute(node, stale)?;
    }
    for (name, value) in &element.attributes {
        doc.set_attribute(node, name, value)?;
    }
    rendered.attributes = element.attributes.into_iter().map(|(k, _)| k).collect();

    for stale in rendered
        .style
        .iter()
        .filter(|name| !element.style.iter().any(|(k, _)| k == *name))
    {
        doc.remove_style(node, stale)?;
    }
    for (property, value) in &element.style {
        doc.set_style(node, property, value)?;
    }
    rendered.style = element.style.into_iter().map(|(k, _)| k).collect();

    for listener in rendered.listeners.drain(..) {
        doc.remove_event_listener(node, listener);
    }
    for (kind, handler) in element.listeners {
        rendered
            .listeners
            .push(doc.add_event_listener(node, kind, handler)?);
    }

    let children = std::mem::take(&mut rendered.children);
    let next = View::Fragment(element.children).flatten();
    rendered.children = reconcile(doc, node, children, next)?;
    Ok(())
}

fn patch(doc: &Document, mut rendered: Rendered, view: Flat) -> Result<Rendered, DomError> {
    match view {
        Flat::Text(text) => doc.set_text(rendered.node, &text)?,
        Flat::Element(element) => apply(doc, &mut rendered, element)?,
    }
    Ok(rendered)
}

/// Match `next` against `previous` by position under `parent`.
///
/// On failure every node of this level is released, so nothing is left
/// behind that the caller no longer tracks.
fn reconcile(
    doc: &Document,
    parent: NodeId,
    previous: Vec<Rendered>,
    next: Vec<Flat>,
) -> Result<Vec<Rendered>, DomError> {
    let mut previous = previous.into_iter();
    let mut out: Vec<Rendered> = Vec::with_capacity(next.len());
    for view in next {
        let old = previous.next();
        let stale = old.as_ref().map(|r| r.node);
        match place(doc, parent, old, view) {
            Ok(rendered) => out.push(rendered),
            Err(error) => {
                let orphans = out
                    .iter()
                    .map(|r| r.node)
                    .chain(stale)
                    .chain(previous.map(|r| r.node));
                for node in orphans {
                    doc.release(node);
                }
                return Err(error);
            }
        }
    }
    for old in previous {
        doc.release(old.node);
    }
    Ok(out)
}

/// Patch `old` into `view`, or put a fresh node in its place.
fn place(
    doc: &Document,
    parent: NodeId,
    old: Option<Rendered>,
    view: Flat,
) -> Result<Rendered, DomError> {
    match old {
        Some(old) if old.matches(&view) => patch(doc, old, view),
        Some(old) => {
            let fresh = create(doc, view)?;
            if let Err(error) = doc.insert_before(parent, fresh.node, Some(old.node)) {
                doc.release(fresh.node);
                return Err(error);
            }
            doc.release(old.node);
            Ok(fresh)
        }
        None => {
            let fresh = create(doc, view)?;
            if let Err(error) = doc.append_child(parent, fresh.node) {
                doc.release(fresh.node);
                return Err(error);
            }
            Ok(fresh)
        }
    }
}

/// Renders views into a container node and keeps them up to date.
pub struct Root {
    doc: Document,
    container: NodeId,
    rendered: Vec<Rendered>,
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("container", &self.container)
            .field("nodes", &self.nodes())
            .finish()
    }
}

impl Root {
    /// Create a root rendering into `container`. Nothing is rendered yet.
    #[must_use]
    pub fn new(doc: &Document, container: NodeId) -> Self {
        Self {
            doc: doc.clone(),
            container,
            rendered: Vec::new(),
        }
    }

    #[must_use]
    pub fn container(&self) -> NodeId {
        self.container
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Top-level nodes currently rendered.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeId> {
        self.rendered.iter().map(|r| r.node).collect()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.rendered.is_empty()
    }

    /// Render `view`, patching whatever the previous render produced.
    ///
    /// On error the previous render is released and the root is left
    /// unmounted.
    pub fn render(&mut self, view: View) -> Result<(), DomError> {
        let previous = std::mem::take(&mut self.rendered);
        self.rendered = reconcile(&self.doc, self.container, previous, view.flatten())?;
        Ok(())
    }

    /// Release everything this root rendered. Idempotent.
    pub fn unmount(&mut self) {
        for rendered in std::mem::take(&mut self.rendered) {
            self.doc.release(rendered.node);
        }
    }
}

/// Content that was mounted imperatively and can be torn down again.
pub trait Mounted {
    /// Remove the content from the document. Must be idempotent.
    fn unmount(&self);
}

/// Content that can be mounted imperatively into a container.
///
/// The returned handle is cheap to clone; one clone is typically kept by
/// the owner of the container so it can unmount later.
pub trait Mount {
    type Handle: Mounted + Clone + 'static;

    fn mount(self, doc: &Document, container: NodeId) -> Result<Self::Handle, DomError>;
}

/// Handle to a [`View`] mounted through [`Mount`].
#[derive(Debug, Clone)]
pub struct ViewHandle {
    root: Rc<RefCell<Root>>,
}

impl ViewHandle {
    /// Re-render the mounted content.
    pub fn update(&self, view: View) -> Result<(), DomError> {
        self.root.borrow_mut().render(view)
    }

    /// Top-level nodes currently rendered.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeId> {
        self.root.borrow().nodes()
    }
}

impl Mounted for ViewHandle {
    fn unmount(&self) {
        self.root.borrow_mut().unmount();
    }
}

impl Mount for View {
    type Handle = ViewHandle;

    fn mount(self, doc: &Document, container: NodeId) -> Result<ViewHandle, DomError> {
        let mut root = Root::new(doc, container);
        root.render(self)?;
        Ok(ViewHandle {
            root: Rc::new(RefCell::new(root)),
        })
    }
}
