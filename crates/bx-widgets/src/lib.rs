#![forbid(unsafe_code)]

//! Dialog components for bx.
//!
//! - [`Fade`] puts one element into a fade-in or fade-out state.
//! - [`Backdrop`] is the overlay under a dialog. It reports clicks.
//! - [`Dialog`] is the modal surface with entering/leaving phases.
//! - [`PortalRenderer`] places content in a container on the body.
//! - [`DialogBuilder`] opens a dialog from anywhere and hands back a
//!   [`DialogRef`].
//!
//! All class names the stylesheet depends on live in [`classes`].

use std::rc::Rc;

pub mod backdrop;
pub mod builder;
pub mod classes;
pub mod dialog;
pub mod dialog_ref;
pub mod error;
pub mod fade;
pub mod portal;

pub use backdrop::Backdrop;
pub use builder::{DialogBuilder, DialogSpec};
pub use dialog::{Dialog, DialogPhase, DialogProps, WeakDialog};
pub use dialog_ref::DialogRef;
pub use error::WidgetError;
pub use fade::Fade;
pub use portal::{PortalConfig, PortalHost, PortalRenderer};

/// Shared callback without arguments.
pub type Callback = Rc<dyn Fn()>;
