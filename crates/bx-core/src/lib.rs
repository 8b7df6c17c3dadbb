#![forbid(unsafe_code)]

//! Core types for bx: a headless document, event dispatch, and declarative
//! views reconciled into that document.
//!
//! The widgets in `bx-widgets` are written against this crate only, so
//! everything they do (mount a portal container, flip a dialog from
//! entering to leaving, wait for an animation end) can be driven and
//! observed without a browser.

pub mod dom;
pub mod error;
pub mod event;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod view;

pub use dom::{Document, NodeId};
pub use error::DomError;
pub use event::{Event, EventKind, Handler, ListenerId};
pub use view::{Element, Mount, Mounted, Root, View, ViewHandle};
