#![forbid(unsafe_code)]

//! Test harness for bx.
//!
//! [`Screen`] queries a [`Document`] the way a user would find things
//! (by test id, by visible text) and fires the events a browser would
//! deliver. [`assert_snapshot!`] compares serialized HTML against files
//! under the calling crate's `tests/snapshots/`.
//!
//! Run `BLESS=1 cargo test` to create or update snapshots.
//!
//! # Example
//!
//! ```
//! use bx_core::dom::Document;
//! use bx_core::view::{Element, Root};
//! use bx_harness::Screen;
//!
//! let doc = Document::new();
//! let mut root = Root::new(&doc, doc.body());
//! root.render(Element::new("button").attr("data-testid", "ok").child("OK").into())
//!     .unwrap();
//!
//! let screen = Screen::new(&doc);
//! let button = screen.find_by_test_id("ok").unwrap();
//! assert_eq!(screen.find_by_text("OK").unwrap(), button);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use bx_core::dom::{Document, NodeId};
use bx_core::event::EventKind;

const TEST_ID_ATTR: &str = "data-testid";

/// Query failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("no element matches {0}")]
    NotFound(String),
    #[error("{count} elements match {query}")]
    Multiple { query: String, count: usize },
}

/// Read-and-poke view of a document.
#[derive(Debug, Clone)]
pub struct Screen {
    doc: Document,
}

impl Screen {
    #[must_use]
    pub fn new(doc: &Document) -> Self {
        Self { doc: doc.clone() }
    }

    /// Screen over the thread's global document.
    #[must_use]
    pub fn global() -> Self {
        Self::new(&Document::global())
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    #[must_use]
    pub fn body(&self) -> NodeId {
        self.doc.body()
    }

    /// Every element under the body with `data-testid="id"`.
    #[must_use]
    pub fn query_all_by_test_id(&self, id: &str) -> Vec<NodeId> {
        self.elements()
            .filter(|&node| self.doc.attribute(node, TEST_ID_ATTR).as_deref() == Some(id))
            .collect()
    }

    #[must_use]
    pub fn query_by_test_id(&self, id: &str) -> Option<NodeId> {
        self.query_all_by_test_id(id).into_iter().next()
    }

    /// The single element with `data-testid="id"`.
    pub fn find_by_test_id(&self, id: &str) -> Result<NodeId, QueryError> {
        exactly_one(format!("data-testid={id:?}"), self.query_all_by_test_id(id))
    }

    /// Innermost elements whose text content is exactly `text`.
    #[must_use]
    pub fn query_all_by_text(&self, text: &str) -> Vec<NodeId> {
        let matches = |node: NodeId| self.doc.text_content(node) == text;
        self.elements()
            .filter(|&node| {
                matches(node)
                    && !self
                        .doc
                        .children(node)
                        .into_iter()
                        .any(|child| !self.doc.is_text(child) && matches(child))
            })
            .collect()
    }

    #[must_use]
    pub fn query_by_text(&self, text: &str) -> Option<NodeId> {
        self.query_all_by_text(text).into_iter().next()
    }

    /// The single innermost element whose text content is `text`.
    pub fn find_by_text(&self, text: &str) -> Result<NodeId, QueryError> {
        exactly_one(format!("text {text:?}"), self.query_all_by_text(text))
    }

    /// Elements under the body carrying `class`.
    #[must_use]
    pub fn query_all_by_class(&self, class: &str) -> Vec<NodeId> {
        self.elements()
            .filter(|&node| self.doc.has_class(node, class))
            .collect()
    }

    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.doc.has_class(node, class)
    }

    /// Whether `node` is still attached under the body.
    #[must_use]
    pub fn is_in_document(&self, node: NodeId) -> bool {
        self.doc.contains(self.doc.body(), node)
    }

    /// Fire a click at `node`. Returns how many handlers ran.
    pub fn click(&self, node: NodeId) -> usize {
        self.fire(node, EventKind::Click)
    }

    /// Fire `animationend` at `node`. Returns how many handlers ran.
    pub fn animation_end(&self, node: NodeId) -> usize {
        self.fire(node, EventKind::AnimationEnd)
    }

    pub fn fire(&self, node: NodeId, kind: EventKind) -> usize {
        tracing::trace!(%node, event = kind.name(), "firing event");
        self.doc.dispatch(node, kind)
    }

    /// Serialized body.
    #[must_use]
    pub fn html(&self) -> String {
        self.doc.to_html(self.doc.body())
    }

    fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.doc
            .descendants(self.doc.body())
            .into_iter()
            .filter(|&node| !self.doc.is_text(node))
    }
}

fn exactly_one(query: String, found: Vec<NodeId>) -> Result<NodeId, QueryError> {
    match found.as_slice() {
        [node] => Ok(*node),
        [] => Err(QueryError::NotFound(query)),
        _ => Err(QueryError::Multiple {
            query,
            count: found.len(),
        }),
    }
}

/// Snapshot file for `name` under `manifest_dir`.
#[must_use]
pub fn snapshot_path(manifest_dir: &str, name: &str) -> PathBuf {
    Path::new(manifest_dir)
        .join("tests")
        .join("snapshots")
        .join(format!("{name}.html"))
}

fn is_bless() -> bool {
    std::env::var("BLESS").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Compare `actual` against the stored snapshot, or write it under `BLESS=1`.
///
/// # Panics
///
/// When the snapshot is missing or differs, or when blessing cannot write.
pub fn assert_html_snapshot(name: &str, actual: &str, manifest_dir: &str) {
    let path = snapshot_path(manifest_dir, name);
    let actual = actual.trim_end();

    if is_bless() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("failed to create snapshot dir {}: {e}", parent.display())
            });
        }
        fs::write(&path, format!("{actual}\n"))
            .unwrap_or_else(|e| panic!("failed to write snapshot {}: {e}", path.display()));
        tracing::info!(snapshot = name, "blessed snapshot");
        return;
    }

    let expected = match fs::read_to_string(&path) {
        Ok(expected) => expected,
        Err(_) => panic!(
            "snapshot '{name}' not found at {}\nrun with BLESS=1 to create it\nactual:\n{actual}",
            path.display()
        ),
    };
    let expected = expected.trim_end();
    if expected != actual {
        panic!(
            "snapshot '{name}' mismatch\n--- expected\n{expected}\n+++ actual\n{actual}\n\nrun with BLESS=1 to update"
        );
    }
}

/// Assert that HTML matches `tests/snapshots/<name>.html` of the calling
/// crate.
///
/// ```ignore
/// assert_snapshot!("dialog_open", &screen.html());
/// ```
#[macro_export]
macro_rules! assert_snapshot {
    ($name:expr, $html:expr) => {
        $crate::assert_html_snapshot($name, AsRef::<str>::as_ref($html), env!("CARGO_MANIFEST_DIR"))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use bx_core::view::{Element, Root, View};

    fn screen() -> (Screen, Root) {
        let doc = Document::new();
        let mut root = Root::new(&doc, doc.body());
        root.render(View::fragment([
            View::from(
                Element::new("div")
                    .attr(TEST_ID_ATTR, "card")
                    .class("card")
                    .child(Element::new("p").child(Element::new("b").child("Title")))
                    .child(Element::new("button").child("Close")),
            ),
            View::from(Element::new("span").class("card").child("Title")),
        ]))
        .unwrap();
        (Screen::new(&doc), root)
    }

    #[test]
    fn find_by_test_id() {
        let (screen, _root) = screen();
        let card = screen.find_by_test_id("card").unwrap();
        assert_eq!(screen.document().tag(card).as_deref(), Some("div"));
        assert_eq!(
            screen.find_by_test_id("missing"),
            Err(QueryError::NotFound("data-testid=\"missing\"".into()))
        );
    }

    #[test]
    fn find_by_text_picks_innermost() {
        let (screen, _root) = screen();
        let close = screen.find_by_text("Close").unwrap();
        assert_eq!(screen.document().tag(close).as_deref(), Some("button"));
        let titles = screen.query_all_by_text("Title");
        let tags: Vec<_> = titles
            .iter()
            .filter_map(|&n| screen.document().tag(n))
            .collect();
        assert_eq!(tags, ["b", "span"]);
        assert!(matches!(
            screen.find_by_text("Title"),
            Err(QueryError::Multiple { count: 2, .. })
        ));
    }

    #[test]
    fn query_by_class_and_click() {
        let (screen, _root) = screen();
        assert_eq!(screen.query_all_by_class("card").len(), 2);
        let close = screen.find_by_text("Close").unwrap();
        assert_eq!(screen.click(close), 0);
        assert!(screen.is_in_document(close));
    }

    #[test]
    fn snapshot_path_layout() {
        let path = snapshot_path("/tmp/crate", "dialog_open");
        assert_eq!(path, Path::new("/tmp/crate/tests/snapshots/dialog_open.html"));
    }
}
