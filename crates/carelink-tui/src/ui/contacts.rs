//! Contacts sidebar
//!
//! Lists the viewer's contacts with unread badges and a preview of the latest
//! message. The highlighted row is the keyboard cursor; the open chat's
//! contact is marked.

use std::{ops::Sub, time::Duration};

use carelink_app::{App, Focus};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

const OPEN_PREFIX: &str = "> ";
const CLOSED_PREFIX: &str = "  ";
const PREVIEW_CHARS: usize = 22;

/// Render the contacts sidebar.
pub fn render<I>(frame: &mut Frame, app: &App<I>, area: Rect)
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    let roster = app.roster();
    let title = if roster.search().is_empty() {
        " Contacts ".to_string()
    } else {
        format!(" Contacts /{} ", roster.search())
    };
    let border = if app.focus() == Focus::Contacts {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default().borders(Borders::ALL).border_style(border).title(title);

    if let Some(error) = roster.contacts_error() {
        let text = Paragraph::new(error.to_string()).style(Style::default().fg(Color::Red));
        frame.render_widget(text.block(block), area);
        return;
    }
    if roster.is_loading() {
        let text = Paragraph::new("Loading...").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(text.block(block), area);
        return;
    }

    let items: Vec<ListItem> = app
        .visible_contacts()
        .into_iter()
        .map(|contact| {
            let open = roster.selected() == Some(&contact.id);
            let prefix = if open { OPEN_PREFIX } else { CLOSED_PREFIX };
            let name_style = if open {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let mut spans =
                vec![Span::raw(prefix), Span::styled(contact.full_name.clone(), name_style)];
            let unread = roster.unread_for(&contact.id);
            if unread > 0 {
                spans.push(Span::styled(format!(" ({unread})"), Style::default().fg(Color::Red)));
            }

            let mut lines = vec![
                Line::from(spans),
                Line::from(Span::styled(
                    format!("{CLOSED_PREFIX}{}", contact.subtitle()),
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            if let Some(message) = roster.last_message(&contact.id) {
                let author = if message.is_from(app.context().viewer()) { "You: " } else { "" };
                lines.push(Line::from(Span::styled(
                    format!("{CLOSED_PREFIX}{author}{}", preview(&message.content)),
                    Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(app.cursor()));
    frame.render_stateful_widget(list, area, &mut state);
}

/// First line of `content`, cut to the sidebar width.
fn preview(content: &str) -> String {
    let line = content.lines().next().unwrap_or_default().trim();
    if line.chars().count() <= PREVIEW_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(PREVIEW_CHARS - 1).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_first_line_and_truncates() {
        assert_eq!(preview("  hi there \nsecond"), "hi there");
        assert_eq!(preview(""), "");
        let long = "a".repeat(40);
        let cut = preview(&long);
        assert_eq!(cut.chars().count(), PREVIEW_CHARS);
        assert!(cut.ends_with('…'));
    }
}
