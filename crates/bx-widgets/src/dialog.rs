#![forbid(unsafe_code)]

//! Modal dialog surface with a backdrop and entering/leaving phases.
//!
//! A mounted [`Dialog`] renders:
//!
//! ```text
//! <div class="bx-dialog-container[ bx-active]">
//!     <div class="bx-backdrop[ bx-transparent] bx-fade-in|bx-fade-out" data-testid="backdrop">
//!     <div class="bx-dialog bx-dialog--entering|bx-dialog--leaving[ extra]" data-testid="dialog">
//!         content
//!     </div>
//! </div>
//! ```
//!
//! # State machine
//!
//! Entering ⇄ Leaving, driven from two places:
//!
//! - the external `open` input ([`Dialog::set_open`]), and
//! - the imperative [`Dialog::close`], which only ever moves to Leaving.
//!
//! The leaving phase renders first so the stylesheet can play the exit
//! animation. The `animationend` signal from the surface then fires
//! `on_after_closed`. That signal is ignored while entering, which keeps the
//! entrance animation of the initial mount from reporting a close.
//!
//! # Invariants
//!
//! - `close()` on a leaving dialog is a no-op.
//! - `on_after_closed` fires at most once per close. Re-opening through
//!   `set_open(true)` re-arms it.
//! - The wrapper carries `bx-active` iff the external `open` input is true;
//!   `close()` does not touch it.
//! - The surface node keeps its identity across phase changes.
//! - Backdrop clicks are relayed to `on_backdrop_clicked` and never close
//!   the dialog by themselves.
//!
//! # Failure Modes
//!
//! - Any operation after [`Mounted::unmount`] is a no-op.
//! - A render failure (the container was released behind the dialog's back)
//!   is logged and leaves the state change in place.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use bx_core::dom::{Document, NodeId};
use bx_core::error::DomError;
use bx_core::event::EventKind;
use bx_core::view::{Element, Mount, Mounted, Root, View};

use crate::Callback;
use crate::backdrop::Backdrop;
use crate::classes::{
    ACTIVE, DIALOG, DIALOG_CONTAINER, DIALOG_ENTERING, DIALOG_LEAVING, DIALOG_TEST_ID,
    TEST_ID_ATTR,
};

/// Phase of the dialog surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    /// Open, playing or done with the entrance animation.
    Entering,
    /// Closing, waiting for the exit animation to finish.
    Leaving,
}

impl DialogPhase {
    fn from_open(open: bool) -> Self {
        if open { Self::Entering } else { Self::Leaving }
    }

    #[inline]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Entering)
    }

    /// Surface modifier class for this phase.
    pub const fn surface_class(self) -> &'static str {
        match self {
            Self::Entering => DIALOG_ENTERING,
            Self::Leaving => DIALOG_LEAVING,
        }
    }
}

/// Inputs of a dialog.
#[derive(Clone, Default)]
pub struct DialogProps {
    open: bool,
    class_name: Option<String>,
    transparent_backdrop: bool,
    on_after_closed: Option<Callback>,
    on_backdrop_clicked: Option<Callback>,
    content: View,
}

impl fmt::Debug for DialogProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogProps")
            .field("open", &self.open)
            .field("class_name", &self.class_name)
            .field("transparent_backdrop", &self.transparent_backdrop)
            .field("on_after_closed", &self.on_after_closed.is_some())
            .field("on_backdrop_clicked", &self.on_backdrop_clicked.is_some())
            .field("content", &self.content)
            .finish()
    }
}

impl DialogProps {
    /// Closed dialog with the given content.
    pub fn new(content: impl Into<View>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    /// Extra classes for the surface. Empty means none.
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        self.class_name = (!class_name.is_empty()).then_some(class_name);
        self
    }

    pub fn transparent_backdrop(mut self, transparent: bool) -> Self {
        self.transparent_backdrop = transparent;
        self
    }

    /// Called once the exit animation finishes.
    pub fn on_after_closed(mut self, f: impl Fn() + 'static) -> Self {
        self.on_after_closed = Some(Rc::new(f));
        self
    }

    /// Called on every backdrop click.
    pub fn on_backdrop_clicked(mut self, f: impl Fn() + 'static) -> Self {
        self.on_backdrop_clicked = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }
}

struct DialogInner {
    props: DialogProps,
    phase: DialogPhase,
    after_closed_sent: bool,
    unmounted: bool,
    root: Root,
}

/// Handle to a mounted dialog. Clones share the same dialog.
#[derive(Clone)]
pub struct Dialog {
    inner: Rc<RefCell<DialogInner>>,
}

/// Non-owning dialog handle, used by callbacks to avoid reference cycles.
#[derive(Clone, Default)]
pub struct WeakDialog {
    inner: Weak<RefCell<DialogInner>>,
}

impl WeakDialog {
    /// A handle that never upgrades.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn upgrade(&self) -> Option<Dialog> {
        self.inner.upgrade().map(|inner| Dialog { inner })
    }
}

impl fmt::Debug for WeakDialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDialog")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Dialog")
            .field("phase", &inner.phase)
            .field("props", &inner.props)
            .field("unmounted", &inner.unmounted)
            .finish()
    }
}

impl Dialog {
    /// Mount a dialog into `container`.
    pub fn mount(doc: &Document, container: NodeId, props: DialogProps) -> Result<Self, DomError> {
        Mount::mount(props, doc, container)
    }

    #[must_use]
    pub fn phase(&self) -> DialogPhase {
        self.inner.borrow().phase
    }

    /// Whether the surface is in the entering phase.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.phase().is_open()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.inner.borrow().unmounted
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakDialog {
        WeakDialog {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// The `bx-dialog-container` wrapper.
    #[must_use]
    pub fn container_node(&self) -> Option<NodeId> {
        self.inner.borrow().root.nodes().first().copied()
    }

    /// The `bx-dialog` surface.
    #[must_use]
    pub fn surface_node(&self) -> Option<NodeId> {
        let inner = self.inner.borrow();
        let wrapper = inner.root.nodes().first().copied()?;
        inner.root.document().children(wrapper).get(1).copied()
    }

    /// The backdrop under the surface.
    #[must_use]
    pub fn backdrop_node(&self) -> Option<NodeId> {
        let inner = self.inner.borrow();
        let wrapper = inner.root.nodes().first().copied()?;
        inner.root.document().children(wrapper).first().copied()
    }

    /// Update the external `open` input.
    pub fn set_open(&self, open: bool) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.unmounted || inner.props.open == open {
                return;
            }
            inner.props.open = open;
        }
        self.transition(DialogPhase::from_open(open));
    }

    /// Start closing. No-op when already leaving.
    pub fn close(&self) {
        {
            let inner = self.inner.borrow();
            if inner.unmounted || inner.phase == DialogPhase::Leaving {
                tracing::trace!("dialog close ignored");
                return;
            }
        }
        self.transition(DialogPhase::Leaving);
    }

    fn transition(&self, next: DialogPhase) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.phase != next {
                tracing::debug!(from = ?inner.phase, to = ?next, "dialog phase change");
                inner.phase = next;
                if next == DialogPhase::Entering {
                    inner.after_closed_sent = false;
                }
            }
        }
        if let Err(error) = self.render() {
            tracing::warn!(%error, "dialog render failed");
        }
    }

    fn handle_animation_end(&self) {
        let callback = {
            let mut inner = self.inner.borrow_mut();
            if inner.unmounted || inner.phase == DialogPhase::Entering || inner.after_closed_sent {
                return;
            }
            inner.after_closed_sent = true;
            inner.props.on_after_closed.clone()
        };
        tracing::debug!("dialog exit animation finished");
        if let Some(callback) = callback {
            callback();
        }
    }

    fn render(&self) -> Result<(), DomError> {
        let view = {
            let inner = self.inner.borrow();
            if inner.unmounted {
                return Ok(());
            }
            dialog_view(&inner, self.downgrade())
        };
        self.inner.borrow_mut().root.render(view)
    }
}

fn dialog_view(inner: &DialogInner, handle: WeakDialog) -> View {
    let props = &inner.props;

    let wrapper_class = if props.open {
        format!("{DIALOG_CONTAINER} {ACTIVE}")
    } else {
        DIALOG_CONTAINER.to_owned()
    };

    let backdrop = Backdrop::new(inner.phase.is_open())
        .transparent(props.transparent_backdrop)
        .on_click_callback(props.on_backdrop_clicked.clone());

    let mut surface_class = format!("{DIALOG} {}", inner.phase.surface_class());
    if let Some(extra) = &props.class_name {
        surface_class.push(' ');
        surface_class.push_str(extra);
    }
    let surface = Element::new("div")
        .class(surface_class)
        .attr(TEST_ID_ATTR, DIALOG_TEST_ID)
        .on(EventKind::AnimationEnd, move |event| {
            // Animations of the content bubble up here too.
            if event.target != event.current_target {
                return;
            }
            if let Some(dialog) = handle.upgrade() {
                dialog.handle_animation_end();
            }
        })
        .child(props.content.clone());

    Element::new("div")
        .class(wrapper_class)
        .child(backdrop.view())
        .child(surface)
        .into()
}

impl Mounted for Dialog {
    fn unmount(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.unmounted {
            return;
        }
        inner.unmounted = true;
        inner.root.unmount();
        tracing::debug!("dialog unmounted");
    }
}

impl Mount for DialogProps {
    type Handle = Dialog;

    fn mount(self, doc: &Document, container: NodeId) -> Result<Dialog, DomError> {
        let phase = DialogPhase::from_open(self.open);
        let dialog = Dialog {
            inner: Rc::new(RefCell::new(DialogInner {
                props: self,
                phase,
                after_closed_sent: false,
                unmounted: false,
                root: Root::new(doc, container),
            })),
        };
        dialog.render()?;
        tracing::debug!(%container, ?phase, "dialog mounted");
        Ok(dialog)
    }
}
