#![forbid(unsafe_code)]

//! Clickable overlay rendered beneath a dialog.
//!
//! The backdrop only reports clicks. Whether a click dismisses anything is
//! decided by whoever supplied the callback.

use std::fmt;
use std::rc::Rc;

use bx_core::event::EventKind;
use bx_core::view::{Element, View};

use crate::Callback;
use crate::classes::{BACKDROP, BACKDROP_TEST_ID, TEST_ID_ATTR, TRANSPARENT};
use crate::fade::Fade;

/// Backdrop configuration.
#[derive(Clone, Default)]
pub struct Backdrop {
    visible: bool,
    transparent: bool,
    on_click: Option<Callback>,
}

impl fmt::Debug for Backdrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backdrop")
            .field("visible", &self.visible)
            .field("transparent", &self.transparent)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

impl Backdrop {
    /// Create a backdrop fading in when `visible`, out otherwise.
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            ..Self::default()
        }
    }

    /// Use the untinted variant.
    pub fn transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Invoke `f` on click.
    pub fn on_click(self, f: impl Fn() + 'static) -> Self {
        self.on_click_callback(Some(Rc::new(f)))
    }

    pub fn on_click_callback(mut self, callback: Option<Callback>) -> Self {
        self.on_click = callback;
        self
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// Describe the backdrop element.
    #[must_use]
    pub fn view(&self) -> View {
        let class = if self.transparent {
            format!("{BACKDROP} {TRANSPARENT}")
        } else {
            BACKDROP.to_owned()
        };
        let mut surface = Element::new("div")
            .class(class)
            .attr(TEST_ID_ATTR, BACKDROP_TEST_ID);
        if let Some(callback) = &self.on_click {
            let callback = Rc::clone(callback);
            surface = surface.on(EventKind::Click, move |_| callback());
        }
        Fade::new(self.visible, surface).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{FADE_IN, FADE_OUT};
    use bx_core::dom::{Document, NodeId};
    use bx_core::view::Root;
    use std::cell::Cell;

    fn render(backdrop: &Backdrop) -> (Document, Root, NodeId) {
        let doc = Document::new();
        let mut root = Root::new(&doc, doc.body());
        root.render(backdrop.view()).unwrap();
        let node = root.nodes()[0];
        (doc, root, node)
    }

    #[test]
    fn opaque_by_default() {
        let (doc, _root, node) = render(&Backdrop::new(true));
        assert_eq!(doc.attribute(node, TEST_ID_ATTR).as_deref(), Some("backdrop"));
        assert!(doc.has_class(node, BACKDROP));
        assert!(!doc.has_class(node, TRANSPARENT));
        assert!(doc.has_class(node, FADE_IN));
    }

    #[test]
    fn transparent_variant() {
        let (doc, _root, node) = render(&Backdrop::new(true).transparent(true));
        assert_eq!(
            doc.class_name(node).as_deref(),
            Some("bx-backdrop bx-transparent bx-fade-in")
        );
    }

    #[test]
    fn hidden_backdrop_fades_out() {
        let (doc, _root, node) = render(&Backdrop::new(false));
        assert!(doc.has_class(node, FADE_OUT));
        assert!(!doc.has_class(node, FADE_IN));
    }

    #[test]
    fn click_invokes_callback() {
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        let (doc, _root, node) =
            render(&Backdrop::new(true).on_click(move || counter.set(counter.get() + 1)));
        doc.dispatch(node, EventKind::Click);
        doc.dispatch(node, EventKind::Click);
        assert_eq!(clicks.get(), 2);
    }

    #[test]
    fn click_without_callback_is_harmless() {
        let (doc, _root, node) = render(&Backdrop::new(true));
        assert_eq!(doc.dispatch(node, EventKind::Click), 0);
    }
}
