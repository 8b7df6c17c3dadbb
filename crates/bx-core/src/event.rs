//! Event kinds and listener plumbing for the document model.

use std::fmt;
use std::rc::Rc;

use crate::dom::NodeId;

/// The events components listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Primary pointer activation.
    Click,
    /// A CSS animation on the target finished.
    AnimationEnd,
    /// A CSS transition on the target finished.
    TransitionEnd,
}

impl EventKind {
    /// DOM event type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::AnimationEnd => "animationend",
            Self::TransitionEnd => "transitionend",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dispatched event as seen by one listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    /// Node the event was dispatched at.
    pub target: NodeId,
    /// Node whose listener is currently running (bubbling).
    pub current_target: NodeId,
}

/// Shared event handler.
pub type Handler = Rc<dyn Fn(&Event)>;

/// Identifies a registered listener so it can be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

impl ListenerId {
    /// Raw id value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}
