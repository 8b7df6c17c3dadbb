#![forbid(unsafe_code)]

//! Visual-test app for bx dialogs.
//!
//! Renders a page with a trigger button, opens a dismissible dialog through
//! [`DialogBuilder`], closes it with the dialog's own button or a backdrop
//! click, finishes the exit animation, and prints the document after every
//! step.
//!
//! ```text
//! bx-demo-showcase --dismiss-via backdrop --transparent --class-name wide
//! BX_LOG=debug bx-demo-showcase --log-format json
//! ```

use std::cell::{Cell, RefCell};
use std::process::ExitCode;
use std::rc::Rc;

use bx_core::dom::{Document, NodeId};
use bx_core::error::DomError;
use bx_core::event::EventKind;
use bx_core::logging::{self, LogFormat};
use bx_core::view::{Element, Root, View};
use bx_widgets::classes::TEST_ID_ATTR;
use bx_widgets::{DialogBuilder, DialogRef};
use clap::{Parser, ValueEnum};

const TRIGGER_TEST_ID: &str = "open-dialog";
const CLOSE_TEST_ID: &str = "close-dialog";

#[derive(Debug, Parser)]
#[command(
    name = "bx-demo-showcase",
    version,
    about = "Open and close a bx dialog, printing the document at each step"
)]
struct Args {
    /// How the dialog gets dismissed.
    #[arg(long, value_enum, default_value_t = DismissVia::Button)]
    dismiss_via: DismissVia,
    /// Use the transparent backdrop.
    #[arg(long)]
    transparent: bool,
    /// Extra class for the dialog surface. Repeatable.
    #[arg(long = "class-name")]
    class_names: Vec<String>,
    #[arg(long, value_enum, default_value_t = LogFormatArg::Pretty)]
    log_format: LogFormatArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DismissVia {
    /// The Close button inside the dialog.
    Button,
    /// A click on the backdrop.
    Backdrop,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("no element with data-testid={0:?}")]
    Missing(&'static str),
    #[error("the trigger did not open a dialog")]
    NotOpened,
    #[error("the dialog never reported that it closed")]
    NotClosed,
}

/// Document state after one step.
#[derive(Debug)]
struct Step {
    label: &'static str,
    html: String,
}

impl Step {
    fn capture(label: &'static str, doc: &Document) -> Self {
        Self {
            label,
            html: doc.to_html(doc.body()),
        }
    }
}

type Slot = Rc<RefCell<Option<DialogRef>>>;

fn dialog_content(slot: &Slot) -> View {
    let slot = Rc::clone(slot);
    View::fragment([
        View::from(Element::new("p").child("Creating dialogs can never be easier")),
        View::from(
            Element::new("button")
                .attr(TEST_ID_ATTR, CLOSE_TEST_ID)
                .child("Close")
                .on(EventKind::Click, move |_| {
                    if let Some(dialog) = slot.borrow().as_ref() {
                        dialog.close();
                    }
                }),
        ),
    ])
}

fn app_view(args: &Args, doc: &Document, slot: &Slot, closed: &Rc<Cell<bool>>) -> View {
    let doc = doc.clone();
    let slot = Rc::clone(slot);
    let closed = Rc::clone(closed);
    let transparent = args.transparent;
    let class_names = args.class_names.clone();

    let open = move |_: &bx_core::Event| {
        let mut builder = DialogBuilder::new_dialog(dialog_content(&slot))
            .in_document(&doc)
            .dismissible();
        if transparent {
            builder = builder.transparent_backdrop();
        }
        for class_name in &class_names {
            builder = builder.add_class_name(class_name.clone());
        }
        let dialog = builder.open();
        let closed = Rc::clone(&closed);
        dialog.run_after_closed(move || {
            tracing::info!("Dialog was closed");
            closed.set(true);
        });
        *slot.borrow_mut() = Some(dialog);
    };

    Element::new("main")
        .class("demo")
        .child(Element::new("h1").child("bx dialog showcase"))
        .child(
            Element::new("button")
                .attr(TEST_ID_ATTR, TRIGGER_TEST_ID)
                .child("Open dialog")
                .on(EventKind::Click, open),
        )
        .into()
}

fn find_test_id(doc: &Document, id: &'static str) -> Result<NodeId, DemoError> {
    doc.descendants(doc.body())
        .into_iter()
        .find(|&node| doc.attribute(node, TEST_ID_ATTR).as_deref() == Some(id))
        .ok_or(DemoError::Missing(id))
}

fn run(args: &Args, doc: &Document) -> Result<Vec<Step>, DemoError> {
    let slot: Slot = Rc::default();
    let closed = Rc::new(Cell::new(false));
    let mut root = Root::new(doc, doc.body());
    root.render(app_view(args, doc, &slot, &closed))?;
    let mut steps = vec![Step::capture("initial", doc)];

    doc.dispatch(find_test_id(doc, TRIGGER_TEST_ID)?, EventKind::Click);
    let dialog = slot
        .borrow()
        .as_ref()
        .and_then(DialogRef::dialog)
        .ok_or(DemoError::NotOpened)?;
    steps.push(Step::capture("open", doc));

    let dismiss = match args.dismiss_via {
        DismissVia::Button => find_test_id(doc, CLOSE_TEST_ID)?,
        DismissVia::Backdrop => dialog.backdrop_node().ok_or(DemoError::Missing("backdrop"))?,
    };
    tracing::debug!(via = ?args.dismiss_via, "dismissing dialog");
    doc.dispatch(dismiss, EventKind::Click);
    steps.push(Step::capture("closing", doc));

    let surface = dialog.surface_node().ok_or(DemoError::Missing("dialog"))?;
    drop(dialog);
    doc.dispatch(surface, EventKind::AnimationEnd);
    steps.push(Step::capture("closed", doc));

    slot.borrow_mut().take();
    root.unmount();
    if closed.get() {
        Ok(steps)
    } else {
        Err(DemoError::NotClosed)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(error) = logging::init(args.log_format.into()) {
        eprintln!("{error}");
    }

    match run(&args, &Document::global()) {
        Ok(steps) => {
            for step in steps {
                println!("== {}", step.label);
                println!("{}", step.html);
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(%error, "demo failed");
            ExitCode::FAILURE
        }
    }
}
