#![forbid(unsafe_code)]

//! Integration tests: the builder lifecycle as a user drives it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bx_core::dom::Document;
use bx_core::view::{Element, View};
use bx_harness::Screen;
use bx_widgets::DialogBuilder;
use bx_widgets::classes::{
    ACTIVE, DIALOG_CONTAINER, DIALOG_ENTERING, DIALOG_LEAVING, FADE_IN, FADE_OUT, TRANSPARENT,
};

fn content() -> View {
    View::fragment([
        View::from(Element::new("p").child("Creating dialogs can never be easier")),
        View::from(Element::new("button").child("Close")),
    ])
}

fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
    let count = Rc::new(Cell::new(0));
    let inner = Rc::clone(&count);
    (count, move || inner.set(inner.get() + 1))
}

#[test]
fn open_shows_entering_dialog() {
    let doc = Document::new();
    let screen = Screen::new(&doc);
    let _dialog = DialogBuilder::new_dialog(content()).in_document(&doc).open();

    let surface = screen.find_by_test_id("dialog").unwrap();
    assert!(screen.has_class(surface, DIALOG_ENTERING));
    assert!(screen.find_by_text("Creating dialogs can never be easier").is_ok());
    let wrapper = screen.query_all_by_class(DIALOG_CONTAINER)[0];
    assert!(screen.has_class(wrapper, ACTIVE));
    let backdrop = screen.find_by_test_id("backdrop").unwrap();
    assert!(screen.has_class(backdrop, FADE_IN));
    assert!(!screen.has_class(backdrop, TRANSPARENT));
}

#[test]
fn close_then_animation_end_runs_after_closed_once() {
    let doc = Document::new();
    let screen = Screen::new(&doc);
    let (count, on_closed) = counter();
    let dialog = DialogBuilder::new_dialog(content()).in_document(&doc).open();
    dialog.run_after_closed(on_closed);

    let surface = screen.find_by_test_id("dialog").unwrap();
    screen.animation_end(surface);
    assert_eq!(count.get(), 0, "entrance animation is not a close");

    dialog.close();
    assert!(screen.has_class(surface, DIALOG_LEAVING));
    assert!(screen.has_class(screen.find_by_test_id("backdrop").unwrap(), FADE_OUT));
    assert_eq!(count.get(), 0, "callback waits for the exit animation");

    screen.animation_end(surface);
    assert_eq!(count.get(), 1);
    assert!(dialog.is_closed());
    assert!(screen.query_by_test_id("dialog").is_none());

    dialog.close();
    screen.animation_end(surface);
    assert_eq!(count.get(), 1);
}

#[test]
fn last_registered_after_closed_wins() {
    let doc = Document::new();
    let screen = Screen::new(&doc);
    let calls = Rc::new(RefCell::new(Vec::new()));
    let dialog = DialogBuilder::new_dialog(content()).in_document(&doc).open();
    for label in ["first", "second"] {
        let calls = Rc::clone(&calls);
        dialog.run_after_closed(move || calls.borrow_mut().push(label));
    }
    dialog.close();
    screen.animation_end(screen.find_by_test_id("dialog").unwrap());
    assert_eq!(*calls.borrow(), ["second"]);
}

#[test]
fn run_after_closed_registered_after_close_fires_once() {
    let doc = Document::new();
    let screen = Screen::new(&doc);
    let (count, on_closed) = counter();
    let dialog = DialogBuilder::new_dialog(content()).in_document(&doc).open();

    dialog.close();
    dialog.run_after_closed(on_closed);
    assert_eq!(count.get(), 0);

    let surface = screen.find_by_test_id("dialog").unwrap();
    screen.animation_end(surface);
    screen.animation_end(surface);
    assert_eq!(count.get(), 1);
}

#[test]
fn run_after_closed_on_finished_dialog_never_fires() {
    let doc = Document::new();
    let screen = Screen::new(&doc);
    let dialog = DialogBuilder::new_dialog(content()).in_document(&doc).open();
    dialog.close();
    let surface = screen.find_by_test_id("dialog").unwrap();
    screen.animation_end(surface);
    assert!(dialog.is_closed());

    let (count, on_closed) = counter();
    dialog.run_after_closed(on_closed);
    dialog.close();
    screen.animation_end(surface);
    assert_eq!(count.get(), 0);
    assert_eq!(screen.html(), "<body></body>");
}

#[test]
fn close_button_inside_content() {
    let doc = Document::new();
    let screen = Screen::new(&doc);
    let slot: Rc<RefCell<Option<bx_widgets::DialogRef>>> = Rc::new(RefCell::new(None));
    let handle = Rc::clone(&slot);
    let content = Element::new("button")
        .child("Close")
        .on(bx_core::EventKind::Click, move |_| {
            if let Some(dialog) = handle.borrow().as_ref() {
                dialog.close();
            }
        });
    let dialog = DialogBuilder::new_dialog(content).in_document(&doc).open();
    *slot.borrow_mut() = Some(dialog.clone());

    screen.click(screen.find_by_text("Close").unwrap());
    assert!(screen.has_class(screen.find_by_test_id("dialog").unwrap(), DIALOG_LEAVING));
    assert_eq!(doc.style(doc.body(), "overflow"), None);
    slot.borrow_mut().take();
}

#[test]
fn dismissible_backdrop_click_closes() {
    let doc = Document::new();
    let screen = Screen::new(&doc);
    let (count, on_closed) = counter();
    let dialog = DialogBuilder::new_dialog(content())
        .in_document(&doc)
        .dismissible()
        .open();
    dialog.run_after_closed(on_closed);

    screen.click(screen.find_by_test_id("backdrop").unwrap());
    let surface = screen.find_by_test_id("dialog").unwrap();
    assert!(screen.has_class(surface, DIALOG_LEAVING));
    assert_eq!(doc.style(doc.body(), "overflow"), None);

    screen.animation_end(surface);
    assert_eq!(count.get(), 1);
    assert!(screen.query_by_test_id("backdrop").is_none());
}

#[test]
fn non_dismissible_backdrop_click_is_ignored() {
    let doc = Document::new();
    let screen = Screen::new(&doc);
    let dialog = DialogBuilder::new_dialog(content()).in_document(&doc).open();

    screen.click(screen.find_by_test_id("backdrop").unwrap());
    assert!(screen.has_class(screen.find_by_test_id("dialog").unwrap(), DIALOG_ENTERING));
    assert!(dialog.is_open());
    assert_eq!(doc.style(doc.body(), "overflow").as_deref(), Some("hidden"));
}

#[test]
fn transparent_backdrop_and_class_names() {
    let doc = Document::new();
    let screen = Screen::new(&doc);
    let _dialog = DialogBuilder::new_dialog(content())
        .in_document(&doc)
        .add_class_name("wide")
        .add_class_name("tall")
        .transparent_backdrop()
        .open();

    assert!(screen.has_class(screen.find_by_test_id("backdrop").unwrap(), TRANSPARENT));
    let surface = screen.find_by_test_id("dialog").unwrap();
    assert_eq!(
        doc.class_name(surface).as_deref(),
        Some("bx-dialog bx-dialog--entering wide tall")
    );
}

#[test]
fn overflow_is_hidden_while_open_and_restored_after() {
    let doc = Document::new();
    doc.set_style(doc.body(), "overflow", "auto").unwrap();
    let screen = Screen::new(&doc);

    let dialog = DialogBuilder::new_dialog(content()).in_document(&doc).open();
    assert_eq!(doc.computed_style(doc.body(), "overflow"), "hidden");

    dialog.close();
    assert_eq!(doc.style(doc.body(), "overflow").as_deref(), Some("auto"));
    screen.animation_end(screen.find_by_test_id("dialog").unwrap());
    assert_eq!(doc.style(doc.body(), "overflow").as_deref(), Some("auto"));
}

#[test]
fn document_returns_to_baseline() {
    let doc = Document::new();
    let baseline = doc.len();
    let screen = Screen::new(&doc);

    for _ in 0..3 {
        let dialog = DialogBuilder::new_dialog(content())
            .in_document(&doc)
            .dismissible()
            .open();
        screen.click(screen.find_by_test_id("backdrop").unwrap());
        screen.animation_end(screen.find_by_test_id("dialog").unwrap());
        assert!(dialog.is_closed());
        assert!(dialog.dialog().is_none());
        assert_eq!(doc.len(), baseline);
        assert_eq!(screen.html(), "<body></body>");
    }
}
