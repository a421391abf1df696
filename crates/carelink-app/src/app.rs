//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the interactive
//! state of the chat UI completely decoupled from I/O.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Owns the contact roster and at most one open [`ChatSession`].
//! - Tags every chat request with the open widget's [`ChatId`] and drops
//!   replies addressed to a widget that has since been closed.
//! - Routes keys to the roster (navigation, search) or the compose box.
//! - Reports the open chat's newest message to the roster for ordering and
//!   previews.

use std::{ops::Sub, time::Duration};

use carelink_client::{
    ChatSession, ContactRoster, RosterAction, RosterConfig, RosterEvent, SessionAction,
    SessionConfig, SessionContext, SessionEvent,
};
use carelink_proto::{Inbound, Profile, UserId};

use crate::{AppAction, AppEvent, ChatId, Focus, KeyInput};

/// Open chat widget and its generation id.
#[derive(Debug, Clone)]
struct OpenChat<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    id: ChatId,
    session: ChatSession<I>,
}

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Authenticated viewer.
    ctx: SessionContext,
    /// Contacts, unread badges, selection.
    roster: ContactRoster<I>,
    /// Open chat. `None` if no contact is selected.
    chat: Option<OpenChat<I>>,
    /// Next chat generation id.
    next_chat: u64,
    /// Settings for new chat sessions.
    session_config: SessionConfig,
    /// Pane receiving keys.
    focus: Focus,
    /// Highlighted row in the visible contact list.
    cursor: usize,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl<I> App<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a new App for the authenticated viewer.
    pub fn new(ctx: SessionContext, roster: RosterConfig, session_config: SessionConfig) -> Self {
        let roster = ContactRoster::new(ctx.role(), roster);
        Self {
            ctx,
            roster,
            chat: None,
            next_chat: 1,
            session_config,
            focus: Focus::Contacts,
            cursor: 0,
            terminal_size: (80, 24),
            status_message: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent<I>) -> Vec<AppAction> {
        match event {
            AppEvent::Start { now } => {
                let actions = self.roster.handle(RosterEvent::Mount { now });
                self.roster_actions(actions, now)
            },
            AppEvent::Key { key, now } => self.handle_key(key, now),
            AppEvent::Tick { now } => {
                let actions = self.roster.handle(RosterEvent::Tick { now });
                let mut out = self.roster_actions(actions, now);
                out.extend(self.chat_event(None, SessionEvent::Tick { now }));
                out
            },
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::ContactsLoaded(contacts) => {
                self.roster.handle(RosterEvent::ContactsLoaded(contacts));
                self.clamp_cursor();
                vec![AppAction::Render]
            },
            AppEvent::ContactsFailed { reason } => {
                self.roster.handle(RosterEvent::ContactsFailed { reason });
                vec![AppAction::Render]
            },
            AppEvent::UnreadLoaded(counts) => {
                self.roster.handle(RosterEvent::UnreadLoaded(counts));
                vec![AppAction::Render]
            },
            AppEvent::UnreadFailed { reason } => {
                self.roster.handle(RosterEvent::UnreadFailed { reason });
                vec![]
            },
            AppEvent::Chat { chat, event } => self.chat_event(Some(chat), event),
        }
    }

    fn handle_key(&mut self, key: KeyInput, now: I) -> Vec<AppAction> {
        if key == KeyInput::Ctrl('c') {
            return self.quit();
        }

        match (self.focus, key) {
            (_, KeyInput::Tab) => {
                self.focus = match self.focus {
                    Focus::Contacts if self.chat.is_some() => Focus::Compose,
                    _ => Focus::Contacts,
                };
                vec![AppAction::Render]
            },
            (Focus::Contacts, KeyInput::Esc) => self.quit(),
            (Focus::Contacts, KeyInput::Up) => {
                self.cursor = self.cursor.saturating_sub(1);
                vec![AppAction::Render]
            },
            (Focus::Contacts, KeyInput::Down) => {
                self.cursor = self.cursor.saturating_add(1);
                self.clamp_cursor();
                vec![AppAction::Render]
            },
            (Focus::Contacts, KeyInput::Enter) => {
                let Some(user_id) = self.roster.visible().get(self.cursor).map(|p| p.id.clone())
                else {
                    return vec![];
                };
                self.select(user_id, now)
            },
            (Focus::Contacts, KeyInput::Char(c)) => {
                let mut query = self.roster.search().to_string();
                query.push(c);
                self.search(query)
            },
            (Focus::Contacts, KeyInput::Backspace) => {
                let mut query = self.roster.search().to_string();
                query.pop();
                self.search(query)
            },
            (Focus::Compose, KeyInput::Esc) => self.close_chat(),
            (Focus::Compose, KeyInput::Enter) => self.chat_event(None, SessionEvent::Submit),
            (Focus::Compose, KeyInput::Ctrl('r')) => self.chat_event(None, SessionEvent::Retry),
            (Focus::Compose, KeyInput::Char(c)) => {
                let mut text = self.compose().to_string();
                text.push(c);
                self.chat_event(None, SessionEvent::Input { text, now })
            },
            (Focus::Compose, KeyInput::Backspace) => {
                let mut text = self.compose().to_string();
                text.pop();
                self.chat_event(None, SessionEvent::Input { text, now })
            },
            _ => vec![],
        }
    }

    /// Open a chat with `user_id`, replacing any open chat.
    pub fn select(&mut self, user_id: UserId, now: I) -> Vec<AppAction> {
        let actions = self.roster.handle(RosterEvent::Select(user_id));
        self.roster_actions(actions, now)
    }

    /// Close the open chat, if any.
    pub fn close_chat(&mut self) -> Vec<AppAction> {
        let actions = self.roster.handle(RosterEvent::CloseChat);
        let mut out = Vec::new();
        for action in actions {
            if action == RosterAction::CloseChat {
                out.extend(self.teardown_chat());
            }
        }
        self.focus = Focus::Contacts;
        out.push(AppAction::Render);
        out
    }

    /// Tear everything down and quit.
    pub fn quit(&mut self) -> Vec<AppAction> {
        let actions = self.roster.handle(RosterEvent::Unmount);
        let mut out = Vec::new();
        for action in actions {
            if action == RosterAction::CloseChat {
                out.extend(self.teardown_chat());
            }
        }
        out.push(AppAction::Quit);
        out
    }

    fn search(&mut self, query: String) -> Vec<AppAction> {
        self.roster.handle(RosterEvent::Search(query));
        self.cursor = 0;
        vec![AppAction::Render]
    }

    fn roster_actions(&mut self, actions: Vec<RosterAction>, now: I) -> Vec<AppAction> {
        let mut out = Vec::new();
        for action in actions {
            match action {
                RosterAction::FetchContacts { role } => out.push(AppAction::FetchContacts { role }),
                RosterAction::FetchUnread => out.push(AppAction::FetchUnread),
                RosterAction::OpenChat { counterparty } => {
                    out.extend(self.open_chat(counterparty, now));
                },
                RosterAction::CloseChat => out.extend(self.teardown_chat()),
            }
        }
        if !out.is_empty() && out.last() != Some(&AppAction::Render) {
            out.push(AppAction::Render);
        }
        out
    }

    fn open_chat(&mut self, counterparty: UserId, now: I) -> Vec<AppAction> {
        let session =
            match ChatSession::new(self.ctx.clone(), counterparty, self.session_config.clone()) {
                Ok(session) => session,
                Err(error) => {
                    tracing::warn!(%error, "cannot open chat");
                    self.status_message = Some(error.to_string());
                    self.roster.handle(RosterEvent::CloseChat);
                    return vec![];
                },
            };

        let id = ChatId(self.next_chat);
        self.next_chat += 1;
        tracing::debug!(chat = %id, counterparty = %session.counterparty(), "opening chat");
        self.chat = Some(OpenChat { id, session });
        self.focus = Focus::Compose;
        self.status_message = None;
        self.chat_event(Some(id), SessionEvent::Mount { now })
    }

    fn teardown_chat(&mut self) -> Vec<AppAction> {
        let Some(mut open) = self.chat.take() else {
            return vec![];
        };
        let actions = open.session.handle(SessionEvent::Unmount);
        lift(open.id, actions)
    }

    /// Feed `event` to the open chat. `chat` of `None` means "whichever is
    /// open"; a tagged event for a closed chat is discarded.
    fn chat_event(&mut self, chat: Option<ChatId>, event: SessionEvent<I>) -> Vec<AppAction> {
        let Some(open) = self.chat.as_mut() else {
            return stale(chat, &event);
        };
        if chat.is_some_and(|id| id != open.id) {
            return stale(chat, &event);
        }

        let render = !matches!(event, SessionEvent::Tick { .. });
        let grew = matches!(
            event,
            SessionEvent::HistoryLoaded { .. } | SessionEvent::Inbound(Inbound::NewMessage(_))
        );
        let id = open.id;
        let actions = open.session.handle(event);
        if grew
            && let Some(newest) = open.session.messages().iter().max_by(|a, b| a.display_cmp(b))
        {
            self.roster.handle(RosterEvent::MessageSeen {
                counterparty: open.session.counterparty().clone(),
                message: newest.clone(),
            });
        }
        let mut out = lift(id, actions);
        if render || !out.is_empty() {
            out.push(AppAction::Render);
        }
        out
    }

    fn clamp_cursor(&mut self) {
        let len = self.roster.visible().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Authenticated viewer.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Contact roster.
    pub fn roster(&self) -> &ContactRoster<I> {
        &self.roster
    }

    /// Contacts visible under the current search.
    pub fn visible_contacts(&self) -> Vec<&Profile> {
        self.roster.visible()
    }

    /// Open chat session. `None` if no contact is selected.
    pub fn chat(&self) -> Option<&ChatSession<I>> {
        self.chat.as_ref().map(|open| &open.session)
    }

    /// Generation id of the open chat.
    pub fn chat_id(&self) -> Option<ChatId> {
        self.chat.as_ref().map(|open| open.id)
    }

    /// Compose buffer of the open chat.
    pub fn compose(&self) -> &str {
        self.chat().map_or("", ChatSession::input)
    }

    /// Pane receiving keys.
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Highlighted contact row.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}

fn lift(chat: ChatId, actions: Vec<SessionAction>) -> Vec<AppAction> {
    actions
        .into_iter()
        .map(|action| match action {
            SessionAction::OpenSocket { token } => AppAction::OpenSocket { chat, token },
            SessionAction::ResolveRoom { counterparty } => {
                AppAction::ResolveRoom { chat, counterparty }
            },
            SessionAction::FetchHistory { room_id } => AppAction::FetchHistory { chat, room_id },
            SessionAction::Emit(event) => AppAction::Emit { chat, event },
            SessionAction::CloseSocket => AppAction::CloseSocket { chat },
        })
        .collect()
}

/// Reply for a chat that is no longer open. A socket that finished opening
/// after its chat closed is closed again so it does not leak.
fn stale<I>(chat: Option<ChatId>, event: &SessionEvent<I>) -> Vec<AppAction> {
    let Some(chat) = chat else {
        return vec![];
    };
    tracing::debug!(%chat, "dropping event for closed chat");
    match event {
        SessionEvent::SocketOpened => vec![AppAction::CloseSocket { chat }],
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use carelink_proto::{Outbound, Role};

    use super::*;

    fn profile(id: u64, name: &str) -> Profile {
        Profile { id: UserId::from(id), full_name: name.into(), role: None, specialization: None }
    }

    fn app() -> App<Instant> {
        let ctx = SessionContext::new(UserId::from(1), Role::Doctor, "tok").unwrap();
        let mut app = App::new(ctx, RosterConfig::default(), SessionConfig::default());
        app.handle(AppEvent::Start { now: Instant::now() });
        app.handle(AppEvent::ContactsLoaded(vec![profile(7, "Sam"), profile(8, "Alex")]));
        app
    }

    #[test]
    fn start_fetches_contacts_and_unread() {
        let ctx = SessionContext::new(UserId::from(1), Role::Doctor, "tok").unwrap();
        let mut app: App<Instant> =
            App::new(ctx, RosterConfig::default(), SessionConfig::default());
        let actions = app.handle(AppEvent::Start { now: Instant::now() });
        assert_eq!(actions, vec![
            AppAction::FetchContacts { role: Role::Doctor },
            AppAction::FetchUnread,
            AppAction::Render,
        ]);
    }

    #[test]
    fn enter_opens_highlighted_contact() {
        let mut app = app();
        let now = Instant::now();
        app.handle(AppEvent::Key { key: KeyInput::Down, now });
        let actions = app.handle(AppEvent::Key { key: KeyInput::Enter, now });

        assert!(matches!(actions.as_slice(), [
            AppAction::OpenSocket { chat: ChatId(1), .. },
            AppAction::ResolveRoom { chat: ChatId(1), .. },
            AppAction::Render,
        ]));
        assert_eq!(app.chat().map(|c| c.counterparty().clone()), Some(UserId::from(8)));
        assert_eq!(app.focus(), Focus::Compose);
    }

    #[test]
    fn switching_contacts_replaces_chat() {
        let mut app = app();
        let now = Instant::now();
        app.select(UserId::from(7), now);
        app.handle(AppEvent::Chat { chat: ChatId(1), event: SessionEvent::SocketOpened });

        let actions = app.select(UserId::from(8), now);
        assert_eq!(actions.first(), Some(&AppAction::CloseSocket { chat: ChatId(1) }));
        assert_eq!(app.chat_id(), Some(ChatId(2)));
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut app = app();
        let now = Instant::now();
        app.select(UserId::from(7), now);
        app.close_chat();
        app.select(UserId::from(8), now);

        // Socket of the first chat finishes opening late
        let actions =
            app.handle(AppEvent::Chat { chat: ChatId(1), event: SessionEvent::SocketOpened });
        assert_eq!(actions, vec![AppAction::CloseSocket { chat: ChatId(1) }]);
        assert_eq!(app.chat().map(|c| c.channel_state().clone()), Some(
            carelink_core::channel::ChannelState::Connecting
        ));
    }

    #[test]
    fn typing_goes_to_open_chat() {
        let mut app = app();
        let now = Instant::now();
        app.select(UserId::from(7), now);

        for c in "hi".chars() {
            app.handle(AppEvent::Key { key: KeyInput::Char(c), now });
        }
        assert_eq!(app.compose(), "hi");

        // Not joined yet: submit keeps the text
        app.handle(AppEvent::Key { key: KeyInput::Enter, now });
        assert_eq!(app.compose(), "hi");
    }

    #[test]
    fn search_narrows_contacts() {
        let mut app = app();
        let now = Instant::now();
        for c in "al".chars() {
            app.handle(AppEvent::Key { key: KeyInput::Char(c), now });
        }
        let names: Vec<&str> =
            app.visible_contacts().iter().map(|p| p.full_name.as_str()).collect();
        assert_eq!(names, vec!["Alex"]);
    }

    #[test]
    fn quit_tears_down_open_chat() {
        let mut app = app();
        let now = Instant::now();
        app.select(UserId::from(7), now);
        app.handle(AppEvent::Chat { chat: ChatId(1), event: SessionEvent::SocketOpened });
        app.handle(AppEvent::Chat {
            chat: ChatId(1),
            event: SessionEvent::RoomResolved(carelink_proto::Room {
                id: "r1".into(),
                members: Vec::new(),
            }),
        });

        let actions = app.handle(AppEvent::Key { key: KeyInput::Ctrl('c'), now });
        assert_eq!(actions, vec![
            AppAction::Emit {
                chat: ChatId(1),
                event: Outbound::LeaveRoom { room_id: "r1".into() },
            },
            AppAction::CloseSocket { chat: ChatId(1) },
            AppAction::Quit,
        ]);
    }

    #[test]
    fn loaded_history_moves_contact_to_top() {
        let mut app = app();
        let now = Instant::now();
        app.select(UserId::from(8), now);
        app.handle(AppEvent::Chat { chat: ChatId(1), event: SessionEvent::SocketOpened });
        app.handle(AppEvent::Chat {
            chat: ChatId(1),
            event: SessionEvent::RoomResolved(carelink_proto::Room {
                id: "r1".into(),
                members: Vec::new(),
            }),
        });

        let message = carelink_proto::Message {
            id: carelink_proto::MessageId::from(5),
            room_id: "r1".into(),
            sender_id: UserId::from(8),
            content: "see you at 3".into(),
            message_type: carelink_proto::TEXT_MESSAGE.into(),
            attachments: Vec::new(),
            created_at: chrono::DateTime::from_timestamp(100, 0).unwrap(),
            status: carelink_proto::DeliveryStatus::Sent,
        };
        app.handle(AppEvent::Chat {
            chat: ChatId(1),
            event: SessionEvent::HistoryLoaded { room_id: "r1".into(), messages: vec![message] },
        });

        let names: Vec<&str> =
            app.visible_contacts().iter().map(|p| p.full_name.as_str()).collect();
        assert_eq!(names, vec!["Alex", "Sam"]);
        let preview = app.roster().last_message(&UserId::from(8)).map(|m| m.content.as_str());
        assert_eq!(preview, Some("see you at 3"));
    }
}
