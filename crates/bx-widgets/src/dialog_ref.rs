#![forbid(unsafe_code)]

//! Handle to a dialog opened through [`DialogBuilder`](crate::DialogBuilder).
//!
//! Every `open()` creates one session that owns the portal, the saved body
//! overflow and the after-closed slot. [`DialogRef`] is a cheap handle onto
//! that session.
//!
//! # Lifecycle
//!
//! 1. `open()` saves the body's inline `overflow` and sets it to `hidden`.
//! 2. [`DialogRef::close`] (or a dismissible backdrop click) moves the
//!    dialog to leaving and restores the saved overflow.
//! 3. The surface's `animationend` finishes the session: the portal is
//!    unmounted and the callback from [`DialogRef::run_after_closed`] runs.
//!
//! # Invariants
//!
//! - The overflow is restored exactly once per session.
//! - The after-closed callback runs at most once, after the portal is gone.
//! - An open session keeps itself alive through the dialog's after-closed
//!   hook, so dropping every `DialogRef` does not tear the dialog down.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use bx_core::dom::{Document, NodeId};

use crate::dialog::{Dialog, WeakDialog};
use crate::portal::PortalRenderer;

const OVERFLOW: &str = "overflow";

type AfterClosed = Box<dyn FnOnce()>;

/// State shared by a [`DialogRef`] and the callbacks wired into its dialog.
pub(crate) struct Session {
    doc: Document,
    body: NodeId,
    saved_overflow: Option<String>,
    overflow_restored: Cell<bool>,
    finished: Cell<bool>,
    dialog: RefCell<WeakDialog>,
    portal: RefCell<Option<PortalRenderer>>,
    after_closed: RefCell<Option<AfterClosed>>,
}

impl Session {
    /// Save the body overflow and hide it.
    pub(crate) fn begin(doc: &Document) -> Rc<Self> {
        let body = doc.body();
        let saved_overflow = doc.style(body, OVERFLOW);
        if let Err(error) = doc.set_style(body, OVERFLOW, "hidden") {
            tracing::warn!(%error, "could not hide body overflow");
        }
        tracing::debug!(saved = ?saved_overflow, "body overflow saved");
        Rc::new(Self {
            doc: doc.clone(),
            body,
            saved_overflow,
            overflow_restored: Cell::new(false),
            finished: Cell::new(false),
            dialog: RefCell::new(WeakDialog::new()),
            portal: RefCell::new(None),
            after_closed: RefCell::new(None),
        })
    }

    pub(crate) fn attach(&self, dialog: &Dialog, portal: PortalRenderer) {
        *self.dialog.borrow_mut() = dialog.downgrade();
        *self.portal.borrow_mut() = Some(portal);
    }

    pub(crate) fn close(&self) {
        let dialog = self.dialog.borrow().upgrade();
        if let Some(dialog) = dialog {
            dialog.close();
        }
        self.restore_overflow();
    }

    /// Tear down after the exit animation.
    pub(crate) fn finish(&self) {
        if self.finished.replace(true) {
            return;
        }
        let portal = self.portal.borrow_mut().take();
        if let Some(mut portal) = portal {
            portal.unmount();
        }
        self.restore_overflow();
        tracing::debug!("dialog session finished");

        let callback = self.after_closed.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Abandon a session whose dialog never mounted.
    pub(crate) fn abort(&self) {
        self.finished.set(true);
        let portal = self.portal.borrow_mut().take();
        if let Some(mut portal) = portal {
            portal.unmount();
        }
        self.restore_overflow();
    }

    pub(crate) fn restore_overflow(&self) {
        if self.overflow_restored.replace(true) {
            return;
        }
        let restored = match &self.saved_overflow {
            Some(value) => self.doc.set_style(self.body, OVERFLOW, value),
            None => self.doc.remove_style(self.body, OVERFLOW),
        };
        match restored {
            Ok(()) => tracing::debug!(value = ?self.saved_overflow, "body overflow restored"),
            Err(error) => tracing::warn!(%error, "could not restore body overflow"),
        }
    }
}

/// Handle returned by [`DialogBuilder::open`](crate::DialogBuilder::open).
///
/// Clones refer to the same dialog.
#[derive(Clone)]
pub struct DialogRef {
    session: Rc<Session>,
}

impl fmt::Debug for DialogRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogRef")
            .field("open", &self.is_open())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl DialogRef {
    pub(crate) fn new(session: Rc<Session>) -> Self {
        Self { session }
    }

    /// Start closing the dialog and give the body its overflow back.
    ///
    /// Calling this again, or after the dialog is gone, does nothing.
    pub fn close(&self) {
        tracing::debug!("dialog ref close");
        self.session.close();
    }

    /// Run `f` once the dialog has finished its exit animation and left the
    /// document. A later registration replaces an earlier one.
    pub fn run_after_closed(&self, f: impl FnOnce() + 'static) {
        if self.session.finished.get() {
            tracing::trace!("after-closed registered on a finished dialog");
        }
        *self.session.after_closed.borrow_mut() = Some(Box::new(f));
    }

    /// The live dialog, until it has been unmounted.
    #[must_use]
    pub fn dialog(&self) -> Option<Dialog> {
        self.session.dialog.borrow().upgrade()
    }

    /// Whether the dialog is still in its entering phase.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.dialog().is_some_and(|d| d.is_open())
    }

    /// Whether the dialog has finished closing and left the document.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.session.finished.get()
    }

    /// The portal container, while mounted.
    #[must_use]
    pub fn container(&self) -> Option<NodeId> {
        self.session.portal.borrow().as_ref().map(PortalRenderer::container)
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.session.doc
    }
}
