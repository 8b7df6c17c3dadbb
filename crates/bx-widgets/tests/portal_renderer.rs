#![forbid(unsafe_code)]

//! Integration tests: portal placement and teardown.

use bx_core::dom::Document;
use bx_core::view::{Element, View};
use bx_harness::Screen;
use bx_widgets::{Dialog, DialogProps, PortalConfig, PortalRenderer};

fn hello() -> View {
    Element::new("p")
        .attr("data-testid", "hello")
        .child("Hello World")
        .into()
}

#[test]
fn content_nests_two_levels_below_body() {
    let doc = Document::new();
    let screen = Screen::new(&doc);
    let mut portal = PortalRenderer::new(&doc, PortalConfig::new()).unwrap();
    portal.render(hello()).unwrap();

    let p = screen.find_by_text("Hello World").unwrap();
    let container = doc.parent(p).unwrap();
    assert_eq!(container, portal.container());
    assert_eq!(doc.parent(container), Some(doc.body()));
}

#[test]
fn content_nests_two_levels_below_custom_host() {
    let doc = Document::new();
    let screen = Screen::new(&doc);
    let host = doc.create_element("aside");
    doc.append_child(doc.body(), host).unwrap();

    let mut portal = PortalRenderer::new(&doc, PortalConfig::new().host(host)).unwrap();
    portal.render(hello()).unwrap();
    let p = screen.find_by_test_id("hello").unwrap();
    assert_eq!(doc.parent(doc.parent(p).unwrap()), Some(host));

    portal.unmount();
    assert!(!screen.is_in_document(host));
    assert!(screen.query_by_test_id("hello").is_none());
}

#[test]
fn unmount_twice_does_not_fail() {
    let doc = Document::new();
    let mut portal = PortalRenderer::new(&doc, PortalConfig::new()).unwrap();
    portal.render(hello()).unwrap();
    portal.unmount();
    portal.unmount();
    assert_eq!(Screen::new(&doc).html(), "<body></body>");
}

#[test]
fn mounted_dialog_is_torn_down_with_portal() {
    let doc = Document::new();
    let screen = Screen::new(&doc);
    let mut portal = PortalRenderer::new(&doc, PortalConfig::new()).unwrap();
    let dialog: Dialog = portal.mount(DialogProps::new(hello()).open(true)).unwrap();
    assert!(screen.find_by_test_id("dialog").is_ok());

    portal.unmount();
    assert!(!dialog.is_mounted());
    assert!(screen.query_by_test_id("dialog").is_none());
    assert_eq!(doc.len(), 1);
}

#[test]
fn container_class_is_recomputed_not_accumulated() {
    let doc = Document::new();
    let mut portal =
        PortalRenderer::new(&doc, PortalConfig::new().container_class_name("one")).unwrap();
    for class in ["two", "three"] {
        portal.set_container_class_name(Some(class)).unwrap();
    }
    assert_eq!(
        doc.class_list(portal.container()),
        ["bx-portal-renderer", "three"]
    );
}
