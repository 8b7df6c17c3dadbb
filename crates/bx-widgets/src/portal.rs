#![forbid(unsafe_code)]

//! Render content into a container that lives outside the caller's tree.
//!
//! A [`PortalRenderer`] owns one `div.bx-portal-renderer` container. The
//! container is created and appended to the host (the body by default) when
//! the renderer is constructed, so content always ends up two levels below
//! the host: container, then content.
//!
//! Content reaches the container in one of two ways:
//!
//! - [`PortalRenderer::render`] projects a [`View`] and patches it on every
//!   later call, like any declarative subtree.
//! - [`PortalRenderer::mount`] mounts anything implementing [`Mount`] and
//!   keeps its handle, so the builder can place a dialog that has no parent
//!   component.
//!
//! # Invariants
//!
//! - The container is removed from the host at most once.
//! - The container class list is always `bx-portal-renderer` plus the
//!   current custom class, never an accumulation of past ones.
//! - With a custom host, [`PortalRenderer::unmount`] also detaches the host
//!   from its own parent.
//!
//! # Failure Modes
//!
//! | Situation | Behavior |
//! |-----------|----------|
//! | `unmount()` twice | second call is a no-op |
//! | container detached by someone else | `unmount()` skips the removal |
//! | custom host already detached | nothing to remove, no error |
//! | `mount`/`render` after `unmount()` | `DomError::NodeNotFound` for the container |
//! | renderer dropped without `unmount()` | content unmounted, container removed and released |

use std::fmt;

use bx_core::dom::{Document, NodeId};
use bx_core::error::DomError;
use bx_core::view::{Mount, Mounted, View, ViewHandle};

use crate::classes::PORTAL_RENDERER;

/// Where the portal container is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PortalHost {
    /// The document body.
    #[default]
    Body,
    /// A caller-supplied element. Removed from its parent on unmount.
    Custom(NodeId),
}

/// Portal configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortalConfig {
    pub host: PortalHost,
    /// Extra class for the container.
    pub container_class_name: Option<String>,
}

impl PortalConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn host(mut self, host: NodeId) -> Self {
        self.host = PortalHost::Custom(host);
        self
    }

    #[must_use]
    pub fn container_class_name(mut self, class_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        self.container_class_name = (!class_name.is_empty()).then_some(class_name);
        self
    }
}

/// Owns a container appended to a host and whatever was rendered into it.
pub struct PortalRenderer {
    doc: Document,
    host: NodeId,
    custom_host: bool,
    container: NodeId,
    container_class_name: Option<String>,
    projected: Option<ViewHandle>,
    mounted: Option<Box<dyn Mounted>>,
    unmounted: bool,
}

impl fmt::Debug for PortalRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalRenderer")
            .field("host", &self.host)
            .field("custom_host", &self.custom_host)
            .field("container", &self.container)
            .field("container_class_name", &self.container_class_name)
            .field("mounted", &self.mounted.is_some())
            .field("unmounted", &self.unmounted)
            .finish()
    }
}

impl PortalRenderer {
    /// Create the container and append it to the configured host.
    pub fn new(doc: &Document, config: PortalConfig) -> Result<Self, DomError> {
        let (host, custom_host) = match config.host {
            PortalHost::Body => (doc.body(), false),
            PortalHost::Custom(node) => (node, true),
        };
        let container = doc.create_element("div");
        let class = container_class(config.container_class_name.as_deref());
        doc.set_class_name(container, &class)?;
        if let Err(error) = doc.append_child(host, container) {
            doc.release(container);
            return Err(error);
        }
        tracing::debug!(%host, %container, custom_host, "portal container created");
        Ok(Self {
            doc: doc.clone(),
            host,
            custom_host,
            container,
            container_class_name: config.container_class_name,
            projected: None,
            mounted: None,
            unmounted: false,
        })
    }

    #[must_use]
    pub fn container(&self) -> NodeId {
        self.container
    }

    #[must_use]
    pub fn host(&self) -> NodeId {
        self.host
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    #[must_use]
    pub fn container_class_name(&self) -> Option<&str> {
        self.container_class_name.as_deref()
    }

    #[must_use]
    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    /// Replace the custom container class.
    pub fn set_container_class_name(&mut self, class_name: Option<&str>) -> Result<(), DomError> {
        let class_name = class_name.filter(|c| !c.is_empty());
        if self.container_class_name.as_deref() == class_name {
            return Ok(());
        }
        self.doc
            .set_class_name(self.container, &container_class(class_name))?;
        self.container_class_name = class_name.map(str::to_owned);
        Ok(())
    }

    /// Project `view` into the container, patching the previous projection.
    pub fn render(&mut self, view: impl Into<View>) -> Result<(), DomError> {
        let view = view.into();
        if let Some(projected) = &self.projected {
            return projected.update(view);
        }
        self.ensure_live()?;
        self.projected = Some(view.mount(&self.doc, self.container)?);
        Ok(())
    }

    /// Mount `content` into the container. Previously mounted content is
    /// unmounted first.
    pub fn mount<M: Mount>(&mut self, content: M) -> Result<M::Handle, DomError> {
        self.ensure_live()?;
        if let Some(previous) = self.mounted.take() {
            previous.unmount();
        }
        let handle = content.mount(&self.doc, self.container)?;
        self.mounted = Some(Box::new(handle.clone()));
        Ok(handle)
    }

    /// Remove the container, and a custom host, from the document.
    pub fn unmount(&mut self) {
        if self.unmounted {
            tracing::trace!(container = %self.container, "portal already unmounted");
            return;
        }
        self.unmounted = true;

        self.detach_container();
        if self.custom_host
            && let Some(parent) = self.doc.parent(self.host)
            && self.doc.remove_child(parent, self.host).is_ok()
        {
            tracing::debug!(host = %self.host, "custom portal host removed");
        }

        if let Some(mounted) = self.mounted.take() {
            mounted.unmount();
        }
        if let Some(projected) = self.projected.take() {
            projected.unmount();
        }
        self.doc.release(self.container);
    }

    fn ensure_live(&self) -> Result<(), DomError> {
        if self.unmounted || !self.doc.exists(self.container) {
            return Err(DomError::NodeNotFound(self.container));
        }
        Ok(())
    }

    fn detach_container(&self) {
        if self.doc.parent(self.container) == Some(self.host)
            && self.doc.remove_child(self.host, self.container).is_ok()
        {
            tracing::debug!(container = %self.container, "portal container removed");
        }
    }
}

impl Drop for PortalRenderer {
    fn drop(&mut self) {
        if self.unmounted {
            return;
        }
        self.detach_container();
        if let Some(mounted) = self.mounted.take() {
            mounted.unmount();
        }
        if let Some(projected) = self.projected.take() {
            projected.unmount();
        }
        self.doc.release(self.container);
    }
}

fn container_class(custom: Option<&str>) -> String {
    match custom {
        Some(custom) => format!("{PORTAL_RENDERER} {custom}"),
        None => PORTAL_RENDERER.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bx_core::view::Element;

    fn hello() -> View {
        Element::new("p").child("Hello World").into()
    }

    #[test]
    fn container_appended_to_body() {
        let doc = Document::new();
        let portal = PortalRenderer::new(&doc, PortalConfig::new()).unwrap();
        assert_eq!(doc.parent(portal.container()), Some(doc.body()));
        assert_eq!(
            doc.class_name(portal.container()).as_deref(),
            Some(PORTAL_RENDERER)
        );
    }

    #[test]
    fn rendered_content_two_levels_below_body() {
        let doc = Document::new();
        let mut portal = PortalRenderer::new(&doc, PortalConfig::new()).unwrap();
        portal.render(hello()).unwrap();
        let p = doc.children(portal.container())[0];
        let container = doc.parent(p).unwrap();
        assert_eq!(doc.parent(container), Some(doc.body()));
    }

    #[test]
    fn render_patches_projection() {
        let doc = Document::new();
        let mut portal = PortalRenderer::new(&doc, PortalConfig::new()).unwrap();
        portal.render(hello()).unwrap();
        let p = doc.children(portal.container())[0];
        portal.render(Element::new("p").child("Bye")).unwrap();
        assert_eq!(doc.children(portal.container()), vec![p]);
        assert_eq!(doc.text_content(p), "Bye");
    }

    #[test]
    fn custom_host_is_removed_on_unmount() {
        let doc = Document::new();
        let host = doc.create_element("section");
        doc.append_child(doc.body(), host).unwrap();
        let mut portal = PortalRenderer::new(&doc, PortalConfig::new().host(host)).unwrap();
        portal.render(hello()).unwrap();
        assert_eq!(doc.parent(portal.container()), Some(host));

        portal.unmount();
        assert_eq!(doc.parent(host), None);
        assert!(doc.children(host).is_empty());
    }

    #[test]
    fn detached_custom_host_is_tolerated() {
        let doc = Document::new();
        let host = doc.create_element("section");
        let mut portal = PortalRenderer::new(&doc, PortalConfig::new().host(host)).unwrap();
        portal.unmount();
        assert!(portal.is_unmounted());
    }

    #[test]
    fn unmount_twice_is_noop() {
        let doc = Document::new();
        let mut portal = PortalRenderer::new(&doc, PortalConfig::new()).unwrap();
        portal.render(hello()).unwrap();
        portal.unmount();
        portal.unmount();
        assert!(doc.children(doc.body()).is_empty());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn unmount_after_external_removal() {
        let doc = Document::new();
        let mut portal = PortalRenderer::new(&doc, PortalConfig::new()).unwrap();
        doc.remove_child(doc.body(), portal.container()).unwrap();
        portal.unmount();
        assert!(!doc.exists(portal.container()));
    }

    #[test]
    fn class_name_is_recomputed() {
        let doc = Document::new();
        let mut portal =
            PortalRenderer::new(&doc, PortalConfig::new().container_class_name("first")).unwrap();
        let container = portal.container();
        assert_eq!(
            doc.class_name(container).as_deref(),
            Some("bx-portal-renderer first")
        );
        portal.set_container_class_name(Some("second")).unwrap();
        assert_eq!(
            doc.class_name(container).as_deref(),
            Some("bx-portal-renderer second")
        );
        portal.set_container_class_name(None).unwrap();
        assert_eq!(doc.class_name(container).as_deref(), Some(PORTAL_RENDERER));
        assert_eq!(portal.container_class_name(), None);
    }

    #[test]
    fn mount_replaces_previous_content() {
        let doc = Document::new();
        let mut portal = PortalRenderer::new(&doc, PortalConfig::new()).unwrap();
        let first = portal.mount(hello()).unwrap();
        portal.mount(View::from(Element::new("span"))).unwrap();
        assert!(!doc.exists(first.nodes()[0]));
        let children = doc.children(portal.container());
        assert_eq!(children.len(), 1);
        assert_eq!(doc.tag(children[0]).as_deref(), Some("span"));
    }

    #[test]
    fn mount_after_unmount_fails() {
        let doc = Document::new();
        let mut portal = PortalRenderer::new(&doc, PortalConfig::new()).unwrap();
        let container = portal.container();
        portal.unmount();
        assert_eq!(
            portal.mount(hello()).unwrap_err(),
            DomError::NodeNotFound(container)
        );
    }

    #[test]
    fn drop_removes_attached_container() {
        let doc = Document::new();
        {
            let mut portal = PortalRenderer::new(&doc, PortalConfig::new()).unwrap();
            portal.render(hello()).unwrap();
        }
        assert!(doc.children(doc.body()).is_empty());
    }

    #[test]
    fn dropped_portals_free_their_nodes() {
        let doc = Document::new();
        for _ in 0..5 {
            let mut portal = PortalRenderer::new(&doc, PortalConfig::new()).unwrap();
            portal.render(hello()).unwrap();
            let dialog = portal
                .mount(crate::dialog::DialogProps::new(hello()).open(true))
                .unwrap();
            drop(portal);
            assert!(!dialog.is_mounted());
        }
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.to_html(doc.body()), "<body></body>");
    }
}
