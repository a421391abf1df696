//! Status bar
//!
//! Displays the chat connection state, transient messages and key hints.

use std::{ops::Sub, time::Duration};

use carelink_app::{App, Focus};
use carelink_core::channel::ChannelState;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render<I>(frame: &mut Frame, app: &App<I>, area: Rect)
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    let connection = match app.chat().map(|chat| chat.channel_state()) {
        None => Span::styled("No chat", Style::default().fg(Color::Gray)),
        Some(ChannelState::Disconnected | ChannelState::Closed) => {
            Span::styled("Disconnected", Style::default().fg(Color::Red))
        },
        Some(ChannelState::Connecting) => {
            Span::styled("Connecting...", Style::default().fg(Color::Yellow))
        },
        Some(ChannelState::Connected) => {
            Span::styled("Connected", Style::default().fg(Color::Green))
        },
        Some(ChannelState::Joined(room_id)) => Span::styled(
            format!("Live ({room_id})"),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Some(ChannelState::Failed) => Span::styled("Offline", Style::default().fg(Color::Red)),
    };

    let hints = match app.focus() {
        Focus::Contacts => " | ↑↓ move · Enter open · Tab compose · Esc quit",
        Focus::Compose => " | Enter send · Tab contacts · Esc close · Ctrl-R retry",
    };
    let message = app.status_message().map_or_else(String::new, |m| format!(" | {m}"));

    let status_line = Line::from(vec![
        Span::raw(" "),
        connection,
        Span::styled(message, Style::default().fg(Color::Yellow)),
        Span::raw(hints),
    ]);

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(paragraph, area);
}
