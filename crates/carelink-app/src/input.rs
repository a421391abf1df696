//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples application logic from terminal libraries (crossterm, termion,
/// etc.) enabling deterministic simulation testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Character typed with Control held.
    Ctrl(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key.
    Backspace,
    /// Tab key (switch focus).
    Tab,
    /// Escape key (close chat, or quit from the roster).
    Esc,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
}
