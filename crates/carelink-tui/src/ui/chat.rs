//! Chat area
//!
//! Shows the open conversation: day headers, messages aligned by author with
//! their attachments, and the counterparty's typing state. A chat error
//! replaces the transcript.

use std::{ops::Sub, time::Duration};

use carelink_app::App;
use carelink_client::ChatSession;
use carelink_core::transcript::{self, DayGroup};
use carelink_proto::{Attachment, AttachmentKind, DeliveryStatus, UserId};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::Clock;

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render<I>(frame: &mut Frame, app: &App<I>, clock: &Clock, area: Rect)
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    let Some(chat) = app.chat() else {
        let hint = Paragraph::new("Select a contact to start chatting")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(hint, area);
        return;
    };

    let title = match chat.counterparty_profile() {
        Some(profile) => format!(" {} · {} ", profile.full_name, profile.subtitle()),
        None => format!(" {} ", chat.counterparty()),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let lines = body(chat, app.context().viewer(), clock);
    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = lines.len().saturating_sub(visible_height);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();

    let paragraph = Paragraph::new(visible).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn body<I>(chat: &ChatSession<I>, viewer: &UserId, clock: &Clock) -> Vec<Line<'static>>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    if let Some(error) = chat.error() {
        return vec![
            Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red))),
            Line::from(Span::styled("Ctrl-R to retry", Style::default().fg(Color::DarkGray))),
        ];
    }
    if chat.is_loading() {
        return vec![Line::from(Span::styled(
            "Loading messages...",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let name = chat.counterparty_profile().map_or("Contact", |p| p.full_name.as_str());
    let mut lines = Vec::new();
    if chat.messages().is_empty() {
        lines.push(Line::from(Span::styled(
            "No messages yet. Say hello!",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for group in transcript::group_by_day(chat.messages(), clock.today, clock.offset) {
        lines.extend(day(&group, viewer, name, clock));
    }
    if chat.is_counterparty_typing() {
        lines.push(Line::from(Span::styled(
            format!("{name} is typing..."),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

fn day(group: &DayGroup<'_>, viewer: &UserId, name: &str, clock: &Clock) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("── {} ──", group.label),
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center),
    ];

    for message in &group.messages {
        let time = transcript::time_label(message, clock.offset);
        let own = transcript::is_own(message, viewer);
        let line = if own {
            Line::from(vec![
                Span::raw(message.content.clone()),
                Span::styled(format!(" {time}"), Style::default().fg(Color::DarkGray)),
                Span::styled(status_mark(message.status), Style::default().fg(Color::Cyan)),
            ])
            .alignment(Alignment::Right)
        } else {
            Line::from(vec![
                Span::styled(
                    format!("{name}: "),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
                Span::raw(message.content.clone()),
                Span::styled(format!(" {time}"), Style::default().fg(Color::DarkGray)),
            ])
        };
        lines.push(line);

        let align = if own { Alignment::Right } else { Alignment::Left };
        lines.extend(message.attachments.iter().map(|a| attachment(a).alignment(align)));
    }
    lines
}

fn attachment(attachment: &Attachment) -> Line<'static> {
    let tag = match attachment.kind {
        AttachmentKind::Image => "[image]",
        AttachmentKind::Document => "[doc]",
        AttachmentKind::File => "[file]",
    };
    Line::from(vec![
        Span::styled(format!("  {tag} "), Style::default().fg(Color::Magenta)),
        Span::styled(attachment.name.clone(), Style::default().add_modifier(Modifier::UNDERLINED)),
        Span::styled(format!(" ({})", attachment.size), Style::default().fg(Color::DarkGray)),
    ])
}

fn status_mark(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Sent => " ✓",
        DeliveryStatus::Delivered => " ✓✓",
        DeliveryStatus::Read => " ✓✓ read",
    }
}
