#![forbid(unsafe_code)]

//! bx: modal dialogs that live outside the component tree.
//!
//! This crate re-exports [`bx_core`] and [`bx_widgets`]. Most callers only
//! need the [`prelude`].
//!
//! ```
//! use bx::prelude::*;
//!
//! let doc = Document::new();
//! let dialog = DialogBuilder::new_dialog(Element::new("p").child("Saved"))
//!     .in_document(&doc)
//!     .dismissible()
//!     .open();
//! dialog.close();
//! ```

pub use bx_core;
pub use bx_widgets;

pub use bx_core::{Document, DomError, Element, EventKind, NodeId, View};
pub use bx_widgets::{
    Backdrop, Dialog, DialogBuilder, DialogPhase, DialogProps, DialogRef, Fade, PortalConfig,
    PortalHost, PortalRenderer, WidgetError,
};

#[cfg(feature = "tracing-json")]
pub use bx_core::logging;

pub mod prelude {
    pub use bx_core::{Document, Element, EventKind, Mount, Mounted, NodeId, View};
    pub use bx_widgets::{
        Backdrop, Dialog, DialogBuilder, DialogProps, DialogRef, Fade, PortalConfig,
        PortalRenderer,
    };
}
