//! UI rendering
//!
//! Rendering functions that convert App state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! returning widget trees.

mod chat;
mod compose;
mod contacts;
mod status;

use chrono::{FixedOffset, Local, NaiveDate};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};

use crate::App;

/// Viewer's calendar, for transcript day headers and timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    /// Local date.
    pub today: NaiveDate,
    /// Local UTC offset.
    pub offset: FixedOffset,
}

impl Clock {
    /// Read the system's local date and offset.
    pub fn local() -> Self {
        let now = Local::now();
        Self { today: now.date_naive(), offset: *now.offset() }
    }
}

/// Render the entire UI.
pub fn render<I>(frame: &mut Frame, app: &App<I>, clock: &Clock)
where
    I: Copy + Ord + Send + Sync + std::ops::Sub<Output = std::time::Duration>,
{
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const COMPOSE_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(COMPOSE_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, compose_area, status_area] = chunks.as_ref() else {
        return;
    };

    render_main_area(frame, app, clock, *main_area);
    compose::render(frame, app, *compose_area);
    status::render(frame, app, *status_area);
}

/// Render the main area (contacts sidebar + chat).
fn render_main_area<I>(frame: &mut Frame, app: &App<I>, clock: &Clock, area: Rect)
where
    I: Copy + Ord + Send + Sync + std::ops::Sub<Output = std::time::Duration>,
{
    const CONTACTS_WIDTH: u16 = 28;
    const CHAT_AREA_MIN_WIDTH: u16 = 20;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(CONTACTS_WIDTH), Constraint::Min(CHAT_AREA_MIN_WIDTH)])
        .split(area);

    let [contacts_area, chat_area] = chunks.as_ref() else {
        return;
    };

    contacts::render(frame, app, *contacts_area);
    chat::render(frame, app, clock, *chat_area);
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use carelink_app::{AppEvent, ChatId, KeyInput};
    use carelink_client::{RosterConfig, SessionConfig, SessionContext, SessionEvent};
    use carelink_proto::{
        Attachment, AttachmentKind, DeliveryStatus, Inbound, Member, Message, MessageId, Profile,
        Role, Room, RoomId, TEXT_MESSAGE, UserId,
    };
    use chrono::{TimeZone, Utc};
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    fn profile(id: u64, name: &str, role: Role) -> Profile {
        Profile {
            id: UserId::from(id),
            full_name: name.into(),
            role: Some(role),
            specialization: None,
        }
    }

    fn clock() -> Clock {
        Clock {
            today: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    fn message(id: u64, sender: u64, day: u32, content: &str) -> Message {
        Message {
            id: MessageId::from(id),
            room_id: RoomId::from("r1"),
            sender_id: UserId::from(sender),
            content: content.into(),
            message_type: TEXT_MESSAGE.into(),
            attachments: Vec::new(),
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap(),
            status: DeliveryStatus::Sent,
        }
    }

    fn app() -> App<Instant> {
        let ctx = SessionContext::new(UserId::from(1), Role::Doctor, "tok").unwrap();
        let mut app = App::new(ctx, RosterConfig::default(), SessionConfig::default());
        let now = Instant::now();
        app.handle(AppEvent::Start { now });
        app.handle(AppEvent::ContactsLoaded(vec![
            profile(7, "Sam Patient", Role::Patient),
            profile(8, "Alex Patient", Role::Patient),
        ]));
        app
    }

    fn open_chat(app: &mut App<Instant>) {
        let now = Instant::now();
        app.handle(AppEvent::Key { key: KeyInput::Enter, now });
        let chat = ChatId(1);
        let room = Room {
            id: RoomId::from("r1"),
            members: vec![
                Member { user_id: UserId::from(1), user: profile(1, "Dr. Ada", Role::Doctor) },
                Member { user_id: UserId::from(7), user: profile(7, "Sam Patient", Role::Patient) },
            ],
        };
        for event in [SessionEvent::SocketOpened, SessionEvent::RoomResolved(room)] {
            app.handle(AppEvent::Chat { chat, event });
        }
    }

    fn screen(app: &App<Instant>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| render(frame, app, &clock())).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn roster_lists_contacts() {
        let screen = screen(&app());
        assert!(screen.contains("Sam Patient"));
        assert!(screen.contains("Alex Patient"));
        assert!(screen.contains("Select a contact"));
    }

    #[test]
    fn transcript_is_grouped_by_day() {
        let mut app = app();
        open_chat(&mut app);
        let chat = ChatId(1);
        let event = SessionEvent::HistoryLoaded {
            room_id: RoomId::from("r1"),
            messages: vec![message(1, 7, 14, "how are you?"), message(2, 1, 15, "better today")],
        };
        app.handle(AppEvent::Chat { chat, event });

        let screen = screen(&app);
        assert!(screen.contains("Sam Patient"));
        assert!(screen.contains("Yesterday"));
        assert!(screen.contains("Today"));
        assert!(screen.contains("how are you?"));
        assert!(screen.contains("better today"));
    }

    #[test]
    fn error_replaces_transcript() {
        let mut app = app();
        open_chat(&mut app);
        let event =
            SessionEvent::HistoryFailed { room_id: RoomId::from("r1"), reason: "503".into() };
        app.handle(AppEvent::Chat { chat: ChatId(1), event });

        let screen = screen(&app);
        assert!(screen.contains("Failed to load messages"));
    }

    #[test]
    fn counterparty_typing_is_shown() {
        let mut app = app();
        open_chat(&mut app);
        let loaded = SessionEvent::HistoryLoaded { room_id: RoomId::from("r1"), messages: vec![] };
        app.handle(AppEvent::Chat { chat: ChatId(1), event: loaded });
        let event = SessionEvent::Inbound(Inbound::UserTyping {
            user_id: UserId::from(7),
            room_id: Some(RoomId::from("r1")),
            is_typing: true,
        });
        app.handle(AppEvent::Chat { chat: ChatId(1), event });

        assert!(screen(&app).contains("is typing"));
    }

    #[test]
    fn attachments_and_sidebar_preview_are_shown() {
        let mut app = app();
        open_chat(&mut app);
        let mut results = message(1, 7, 15, "bp 120/80");
        results.attachments = vec![Attachment {
            kind: AttachmentKind::Document,
            name: "labs.pdf".into(),
            size: "1.2 MB".into(),
            url: "/files/labs.pdf".into(),
        }];
        let event =
            SessionEvent::HistoryLoaded { room_id: RoomId::from("r1"), messages: vec![results] };
        app.handle(AppEvent::Chat { chat: ChatId(1), event });

        let screen = screen(&app);
        assert!(screen.contains("[doc] labs.pdf (1.2 MB)"));
        assert!(screen.contains("│  bp 120/80"));
    }
}
