//! Observable application state types.

use std::fmt;

/// Generation id of an open chat widget.
///
/// Every chat I/O request carries the id of the widget that issued it. Replies
/// tagged with an id other than the open widget's are stale and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub u64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chat-{}", self.0)
    }
}

/// Which pane receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Contact list and search box.
    #[default]
    Contacts,
    /// Compose box of the open chat.
    Compose,
}
