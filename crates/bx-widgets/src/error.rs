//! Widget errors.

use bx_core::DomError;

/// Errors from building or mounting widgets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    /// `Fade` wraps exactly one element.
    #[error("fade can only accept one child element, got {found}")]
    FadeChildCount { found: usize },
    /// The single `Fade` child was text rather than an element.
    #[error("fade child must be an element, not text")]
    FadeChildNotElement,
    #[error(transparent)]
    Dom(#[from] DomError),
}
