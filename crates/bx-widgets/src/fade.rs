#![forbid(unsafe_code)]

//! Fade-in/fade-out wrapper.
//!
//! `Fade` decorates exactly one child element with either [`FADE_IN`] or
//! [`FADE_OUT`], keeping whatever classes the child already had. The
//! stylesheet animates between the two.
//!
//! The child count is checked once, when the wrapper is built. Re-rendering
//! an existing `Fade` never re-validates.
//!
//! # Example
//!
//! ```
//! use bx_core::view::Element;
//! use bx_widgets::fade::Fade;
//!
//! let view = Fade::new(true, Element::new("p").class("note")).into_element();
//! assert_eq!(view.class_name(), Some("note bx-fade-in"));
//! ```

use bx_core::view::{Element, View};

use crate::classes::{FADE_IN, FADE_OUT};
use crate::error::WidgetError;

/// Wraps a single element in a fade state.
#[derive(Debug, Clone)]
pub struct Fade {
    fade_in: bool,
    child: Element,
}

impl Fade {
    /// Wrap a single element.
    pub fn new(fade_in: bool, child: Element) -> Self {
        Self { fade_in, child }
    }

    /// Wrap arbitrary children, failing unless they are exactly one element.
    pub fn try_new(fade_in: bool, children: impl Into<View>) -> Result<Self, WidgetError> {
        let children = children.into();
        let found = children.node_count();
        if found != 1 {
            tracing::warn!(found, "fade rejected its children");
            return Err(WidgetError::FadeChildCount { found });
        }
        match single(children) {
            Some(View::Element(child)) => Ok(Self::new(fade_in, child)),
            _ => Err(WidgetError::FadeChildNotElement),
        }
    }

    #[must_use]
    pub fn is_in(&self) -> bool {
        self.fade_in
    }

    /// Change the fade intent without revalidating the child.
    pub fn set_in(&mut self, fade_in: bool) {
        self.fade_in = fade_in;
    }

    /// Class for the given intent.
    #[must_use]
    pub const fn state_class(fade_in: bool) -> &'static str {
        if fade_in { FADE_IN } else { FADE_OUT }
    }

    /// The child with the state class appended.
    #[must_use]
    pub fn into_element(self) -> Element {
        let state = Self::state_class(self.fade_in);
        let class = match self.child.class_name() {
            Some(existing) => format!("{existing} {state}"),
            None => state.to_owned(),
        };
        self.child.class(class)
    }
}

impl From<Fade> for View {
    fn from(fade: Fade) -> Self {
        View::Element(fade.into_element())
    }
}

fn single(view: View) -> Option<View> {
    match view {
        View::Empty => None,
        View::Fragment(children) => children.into_iter().find_map(single),
        node => Some(node),
    }
}
