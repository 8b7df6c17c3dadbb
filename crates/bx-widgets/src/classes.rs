//! Class names and test ids read by the stylesheets and by tests.
//!
//! These strings are a compatibility contract with the published CSS and
//! must stay verbatim.

/// Portal container.
pub const PORTAL_RENDERER: &str = "bx-portal-renderer";

/// Dialog wrapper holding the backdrop and the surface.
pub const DIALOG_CONTAINER: &str = "bx-dialog-container";
/// Added to the wrapper while the `open` input is true.
pub const ACTIVE: &str = "bx-active";

/// Dialog surface.
pub const DIALOG: &str = "bx-dialog";
pub const DIALOG_ENTERING: &str = "bx-dialog--entering";
pub const DIALOG_LEAVING: &str = "bx-dialog--leaving";

pub const BACKDROP: &str = "bx-backdrop";
/// Backdrop variant without tint.
pub const TRANSPARENT: &str = "bx-transparent";

pub const FADE_IN: &str = "bx-fade-in";
pub const FADE_OUT: &str = "bx-fade-out";

/// Attribute carrying the test id.
pub const TEST_ID_ATTR: &str = "data-testid";
pub const DIALOG_TEST_ID: &str = "dialog";
pub const BACKDROP_TEST_ID: &str = "backdrop";
