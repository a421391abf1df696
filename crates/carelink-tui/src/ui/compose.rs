//! Compose box
//!
//! Displays the message being written, or the search query when the contact
//! list has focus.

use std::{ops::Sub, time::Duration};

use carelink_app::{App, Focus};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

const PROMPT_WIDTH: u16 = 3; // "> "
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the compose box.
pub fn render<I>(frame: &mut Frame, app: &App<I>, area: Rect)
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    let (title, text) = match app.focus() {
        Focus::Compose if app.chat().is_some() => (" Message ", app.compose()),
        _ => (" Search ", app.roster().search()),
    };

    let block = Block::default().borders(Borders::ALL).title(title);
    let paragraph =
        Paragraph::new(format!("> {text}")).style(Style::default().fg(Color::White)).block(block);
    frame.render_widget(paragraph, area);

    let available_width = area.width.saturating_sub(PROMPT_WIDTH + RIGHT_PADDING);
    let cursor_offset = (text.chars().count() as u16).min(available_width);

    let cursor_x = area.x.saturating_add(PROMPT_WIDTH).saturating_add(cursor_offset);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);
    frame.set_cursor_position((cursor_x.min(max_x), cursor_y));
}
