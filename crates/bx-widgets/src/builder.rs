#![forbid(unsafe_code)]

//! Fluent builder for dialogs opened outside any parent tree.
//!
//! ```
//! use bx_core::dom::Document;
//! use bx_core::view::Element;
//! use bx_widgets::DialogBuilder;
//!
//! let doc = Document::new();
//! let dialog = DialogBuilder::new_dialog(Element::new("p").child("Saved"))
//!     .in_document(&doc)
//!     .add_class_name("toast")
//!     .dismissible()
//!     .open();
//! dialog.run_after_closed(|| println!("gone"));
//! dialog.close();
//! assert_eq!(doc.style(doc.body(), "overflow"), None);
//! ```
//!
//! `open()` is terminal. It hides the body overflow, creates a
//! [`PortalRenderer`] on the body and mounts a [`Dialog`] configured from the
//! accumulated [`DialogSpec`]. The returned [`DialogRef`] closes the dialog
//! and registers the after-closed callback.
//!
//! Dialogs opened while another is still open share the body overflow: the
//! second saves `hidden` and restores it. Callers serialize open/close pairs.

use std::rc::Rc;

use bx_core::dom::Document;
use bx_core::view::View;

use crate::dialog::{Dialog, DialogProps};
use crate::dialog_ref::{DialogRef, Session};
use crate::error::WidgetError;
use crate::portal::{PortalConfig, PortalRenderer};

/// Options accumulated by a [`DialogBuilder`].
#[derive(Debug, Clone, Default)]
pub struct DialogSpec {
    class_names: Vec<String>,
    content: View,
    dismissible: bool,
    transparent_backdrop: bool,
}

impl DialogSpec {
    #[must_use]
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Class names joined for the surface, `None` when there are none.
    #[must_use]
    pub fn joined_class_names(&self) -> Option<String> {
        let joined = self
            .class_names
            .iter()
            .filter(|name| !name.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    }

    #[must_use]
    pub fn content(&self) -> &View {
        &self.content
    }

    #[must_use]
    pub fn is_dismissible(&self) -> bool {
        self.dismissible
    }

    #[must_use]
    pub fn has_transparent_backdrop(&self) -> bool {
        self.transparent_backdrop
    }
}

/// Accumulates dialog options, then opens the dialog.
#[derive(Debug, Clone)]
#[must_use]
pub struct DialogBuilder {
    spec: DialogSpec,
    doc: Option<Document>,
}

impl DialogBuilder {
    /// Start a builder for a dialog showing `content`.
    pub fn new_dialog(content: impl Into<View>) -> Self {
        Self {
            spec: DialogSpec {
                content: content.into(),
                ..DialogSpec::default()
            },
            doc: None,
        }
    }

    /// Open into `doc` instead of [`Document::global`].
    pub fn in_document(mut self, doc: &Document) -> Self {
        self.doc = Some(doc.clone());
        self
    }

    /// Add a class to the dialog surface. Classes accumulate.
    pub fn add_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.spec.class_names.push(class_name.into());
        self
    }

    /// Close the dialog when the backdrop is clicked.
    pub fn dismissible(mut self) -> Self {
        self.spec.dismissible = true;
        self
    }

    pub fn transparent_backdrop(mut self) -> Self {
        self.spec.transparent_backdrop = true;
        self
    }

    #[must_use]
    pub fn spec(&self) -> &DialogSpec {
        &self.spec
    }

    /// Open the dialog.
    ///
    /// Mount failures are logged and yield a handle whose dialog is already
    /// gone. Use [`DialogBuilder::try_open`] to observe them.
    #[must_use]
    pub fn open(self) -> DialogRef {
        let doc = self.doc.clone().unwrap_or_else(Document::global);
        match open_session(self.spec, &doc) {
            Ok(dialog) => dialog,
            Err((session, error)) => {
                tracing::warn!(%error, "dialog failed to open");
                DialogRef::new(session)
            }
        }
    }

    /// Open the dialog, reporting mount failures.
    pub fn try_open(self) -> Result<DialogRef, WidgetError> {
        let doc = self.doc.clone().unwrap_or_else(Document::global);
        open_session(self.spec, &doc).map_err(|(_, error)| error)
    }
}

fn open_session(spec: DialogSpec, doc: &Document) -> Result<DialogRef, (Rc<Session>, WidgetError)> {
    let session = Session::begin(doc);
    match mount_dialog(&session, spec, doc) {
        Ok(()) => {
            tracing::debug!("dialog opened");
            Ok(DialogRef::new(session))
        }
        Err(error) => {
            session.abort();
            Err((session, error))
        }
    }
}

fn mount_dialog(session: &Rc<Session>, spec: DialogSpec, doc: &Document) -> Result<(), WidgetError> {
    let class_name = spec.joined_class_names();
    let mut props = DialogProps::new(spec.content)
        .open(true)
        .transparent_backdrop(spec.transparent_backdrop);
    if let Some(class_name) = class_name {
        props = props.class_name(class_name);
    }

    let weak = Rc::downgrade(session);
    let dismissible = spec.dismissible;
    props = props.on_backdrop_clicked(move || {
        if !dismissible {
            return;
        }
        if let Some(session) = weak.upgrade() {
            tracing::debug!("backdrop dismissed dialog");
            session.close();
        }
    });

    // Holds the session until the dialog has left the document.
    let owner = Rc::clone(session);
    props = props.on_after_closed(move || owner.finish());

    let mut portal = PortalRenderer::new(doc, PortalConfig::new())?;
    let dialog: Dialog = match portal.mount(props) {
        Ok(dialog) => dialog,
        Err(error) => {
            portal.unmount();
            return Err(error.into());
        }
    };
    session.attach(&dialog, portal);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bx_core::event::EventKind;
    use bx_core::view::Element;
    use std::cell::Cell;

    fn content() -> Element {
        Element::new("p").child("Hello World")
    }

    #[test]
    fn options_accumulate() {
        let builder = DialogBuilder::new_dialog(content())
            .add_class_name("a")
            .add_class_name("b")
            .dismissible()
            .transparent_backdrop();
        let spec = builder.spec();
        assert_eq!(spec.class_names(), ["a", "b"]);
        assert_eq!(spec.joined_class_names().as_deref(), Some("a b"));
        assert!(spec.is_dismissible());
        assert!(spec.has_transparent_backdrop());
        assert_eq!(spec.content().node_count(), 1);
    }

    #[test]
    fn defaults_are_off() {
        let builder = DialogBuilder::new_dialog(content());
        let spec = builder.spec();
        assert!(spec.class_names().is_empty());
        assert_eq!(spec.joined_class_names(), None);
        assert!(!spec.is_dismissible());
        assert!(!spec.has_transparent_backdrop());
    }

    #[test]
    fn open_mounts_into_body_portal() {
        let doc = Document::new();
        let dialog = DialogBuilder::new_dialog(content())
            .in_document(&doc)
            .try_open()
            .unwrap();
        let container = dialog.container().unwrap();
        assert_eq!(doc.parent(container), Some(doc.body()));
        assert!(dialog.is_open());
        assert_eq!(doc.style(doc.body(), "overflow").as_deref(), Some("hidden"));
    }

    #[test]
    fn session_survives_dropped_handle() {
        let doc = Document::new();
        let fired = Rc::new(Cell::new(false));
        {
            let dialog = DialogBuilder::new_dialog(content()).in_document(&doc).open();
            let fired = Rc::clone(&fired);
            dialog.run_after_closed(move || fired.set(true));
            dialog.close();
        }
        let surface = doc
            .descendants(doc.body())
            .into_iter()
            .find(|&n| doc.attribute(n, "data-testid").as_deref() == Some("dialog"))
            .unwrap();
        doc.dispatch(surface, EventKind::AnimationEnd);
        assert!(fired.get());
        assert!(doc.children(doc.body()).is_empty());
    }

    #[test]
    fn open_in_global_document() {
        let doc = Document::global();
        let dialog = DialogBuilder::new_dialog(content()).open();
        assert!(dialog.document().ptr_eq(&doc));
        dialog.close();
        let surface = dialog.dialog().unwrap().surface_node().unwrap();
        doc.dispatch(surface, EventKind::AnimationEnd);
        assert!(dialog.is_closed());
        assert!(doc.children(doc.body()).is_empty());
    }
}
