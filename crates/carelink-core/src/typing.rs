//! Typing indicator.
//!
//! [`TypingIndicator`] tracks the viewer's own composing state and decides when
//! to signal start/stop. [`RemoteTyping`] records what the counterparty last
//! said about theirs.
//!
//! # State Machine
//!
//! ```text
//!          keystroke (emit Start)
//!   ┌──────┐ ────────────────────> ┌───────────┐ ──┐ keystroke
//!   │ Idle │                       │ Composing │   │ (reset window)
//!   └──────┘ <──────────────────── └───────────┘ <─┘
//!          debounce expiry or send (emit Stop)
//! ```

use std::{collections::HashMap, ops::Sub, time::Duration};

use carelink_proto::UserId;

/// Quiet period after the last keystroke before a stop is signalled.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

/// Typing configuration.
#[derive(Debug, Clone)]
pub struct TypingConfig {
    /// Quiet period after the last keystroke before a stop is signalled.
    pub debounce: Duration,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self { debounce: DEFAULT_DEBOUNCE }
    }
}

/// Signal to send to the counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    /// Emit `typing {is_typing: true}`.
    Start,
    /// Emit `typing {is_typing: false}`.
    Stop,
}

impl TypingSignal {
    /// Wire value of the signal.
    pub fn is_typing(self) -> bool {
        matches!(self, Self::Start)
    }
}

/// Local composing state with a fixed debounce window.
///
/// # Invariants
///
/// - Exactly one `Start` per idle-to-composing transition.
/// - While composing, `tick` yields `Stop` once the window since the last
///   keystroke has elapsed, then the indicator is idle again.
/// - [`TypingIndicator::on_send`] always yields `Stop`, even when idle.
#[derive(Debug, Clone)]
pub struct TypingIndicator<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    config: TypingConfig,
    last_keystroke: Option<I>,
}

impl<I> TypingIndicator<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create an idle indicator.
    pub fn new(config: TypingConfig) -> Self {
        Self { config, last_keystroke: None }
    }

    /// Whether the viewer is currently composing.
    pub fn is_composing(&self) -> bool {
        self.last_keystroke.is_some()
    }

    /// Record a keystroke at `now`.
    pub fn keystroke(&mut self, now: I) -> Option<TypingSignal> {
        let was_idle = self.last_keystroke.replace(now).is_none();
        was_idle.then_some(TypingSignal::Start)
    }

    /// Advance time. Yields `Stop` when the debounce window has elapsed.
    pub fn tick(&mut self, now: I) -> Option<TypingSignal> {
        let last = self.last_keystroke?;
        if now - last >= self.config.debounce {
            self.last_keystroke = None;
            return Some(TypingSignal::Stop);
        }
        None
    }

    /// The viewer sent a message.
    pub fn on_send(&mut self) -> TypingSignal {
        self.last_keystroke = None;
        TypingSignal::Stop
    }
}

/// Composing state reported by other room members.
///
/// Last write wins per user. No local expiry: a member stays "typing" until
/// they say otherwise.
#[derive(Debug, Clone, Default)]
pub struct RemoteTyping {
    states: HashMap<UserId, bool>,
}

impl RemoteTyping {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `user_typing` event.
    pub fn apply(&mut self, user_id: UserId, is_typing: bool) {
        self.states.insert(user_id, is_typing);
    }

    /// Whether `user_id` last reported composing.
    pub fn is_typing(&self, user_id: &UserId) -> bool {
        self.states.get(user_id).copied().unwrap_or(false)
    }

    /// Whether any member is composing.
    pub fn anyone(&self) -> bool {
        self.states.values().any(|typing| *typing)
    }

    /// Forget all state.
    pub fn clear(&mut self) {
        self.states.clear();
    }
}
