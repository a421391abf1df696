//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. REST calls go through
//! [`ApiClient`]; each open chat owns one realtime socket. Sockets are opened
//! on spawned tasks so a slow handshake never stalls the event loop.

use std::{
    collections::BTreeMap,
    io::{self, Stdout, stdout},
    time::{Duration, Instant},
};

use carelink_app::{App, AppEvent, ChatId, Driver, KeyInput, SocketEvent};
use carelink_client::transport::{self, ApiClient, ConnectedSocket, TransportError};
use carelink_proto::{Message, Outbound, Profile, Role, Room, RoomId, UnreadCounts, UserId};
use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::{
    sync::mpsc::{self, error::TryRecvError},
    task::AbortHandle,
};

use crate::ui::{self, Clock};

/// How long `poll_event` waits for a key before letting timers run.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The chat has no open socket.
    #[error("{0} has no open socket")]
    NoSocket(ChatId),

    /// Channel send error.
    #[error("channel send error")]
    ChannelSend,
}

/// Outcome of a socket open task.
type Connected = (ChatId, Result<ConnectedSocket, TransportError>);

/// Terminal driver implementing the [`Driver`] trait.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    api: ApiClient,
    ws_url: String,
    connect_timeout: Duration,
    sockets: BTreeMap<ChatId, ConnectedSocket>,
    /// Opens in flight.
    connecting: BTreeMap<ChatId, AbortHandle>,
    connected_tx: mpsc::UnboundedSender<Connected>,
    connected_rx: mpsc::UnboundedReceiver<Connected>,
}

impl TerminalDriver {
    /// Enter raw mode and the alternate screen.
    ///
    /// Socket opens that take longer than `connect_timeout` are abandoned.
    pub fn new(
        api: ApiClient,
        ws_url: String,
        connect_timeout: Duration,
    ) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let (connected_tx, connected_rx) = mpsc::unbounded_channel();

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            api,
            ws_url,
            connect_timeout,
            sockets: BTreeMap::new(),
            connecting: BTreeMap::new(),
            connected_tx,
            connected_rx,
        })
    }

    /// Next finished open for a chat that still wants it.
    fn next_connected(&mut self) -> Option<(ChatId, SocketEvent)> {
        while let Ok((chat, result)) = self.connected_rx.try_recv() {
            if self.connecting.remove(&chat).is_none() {
                // Closed while opening; dropping the socket stops it
                tracing::debug!(%chat, "discarding socket for closed chat");
                continue;
            }
            return Some(match result {
                Ok(socket) => {
                    self.sockets.insert(chat, socket);
                    (chat, SocketEvent::Opened)
                },
                Err(e) => {
                    tracing::warn!(%chat, error = %e, "socket open failed");
                    (chat, SocketEvent::Closed { reason: e.to_string() })
                },
            });
        }
        None
    }

    /// Convert a crossterm key event to `KeyInput`.
    fn convert_key(event: KeyEvent) -> Option<KeyInput> {
        if event.modifiers.contains(KeyModifiers::CONTROL)
            && let KeyCode::Char(c) = event.code
        {
            return Some(KeyInput::Ctrl(c));
        }
        match event.code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Tab => Some(KeyInput::Tab),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Up => Some(KeyInput::Up),
            KeyCode::Down => Some(KeyInput::Down),
            _ => None,
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_event(&mut self) -> Result<Option<AppEvent<Instant>>, Self::Error> {
        tokio::select! {
            biased;

            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                        Ok(Self::convert_key(key_event)
                            .map(|key| AppEvent::Key { key, now: Instant::now() }))
                    },
                    Some(Ok(Event::Resize(cols, rows))) => Ok(Some(AppEvent::Resize(cols, rows))),
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    _ => Ok(None),
                }
            }

            () = tokio::time::sleep(POLL_TIMEOUT) => Ok(None),
        }
    }

    async fn fetch_contacts(&mut self, role: Role) -> Result<Vec<Profile>, Self::Error> {
        Ok(self.api.contacts(role).await?)
    }

    async fn fetch_unread(&mut self) -> Result<UnreadCounts, Self::Error> {
        Ok(self.api.unread().await?)
    }

    async fn resolve_room(&mut self, counterparty: &UserId) -> Result<Room, Self::Error> {
        Ok(self.api.private_room(counterparty).await?)
    }

    async fn fetch_history(&mut self, room_id: &RoomId) -> Result<Vec<Message>, Self::Error> {
        Ok(self.api.history(room_id).await?)
    }

    fn open_socket(&mut self, chat: ChatId, token: &str) {
        self.close_socket(chat);

        let url = self.ws_url.clone();
        let token = token.to_string();
        let timeout = self.connect_timeout;
        let done = self.connected_tx.clone();
        let handle = tokio::spawn(async move {
            let result = transport::connect_within(&url, &token, timeout).await;
            let _ = done.send((chat, result));
        });
        self.connecting.insert(chat, handle.abort_handle());
    }

    async fn emit(&mut self, chat: ChatId, event: Outbound) -> Result<(), Self::Error> {
        let socket = self.sockets.get(&chat).ok_or(TerminalError::NoSocket(chat))?;
        socket.to_server.send(event).await.map_err(|_| TerminalError::ChannelSend)
    }

    async fn recv_socket(&mut self) -> Option<(ChatId, SocketEvent)> {
        if let Some(event) = self.next_connected() {
            return Some(event);
        }

        let mut closed = None;
        for (chat, socket) in &mut self.sockets {
            match socket.from_server.try_recv() {
                Ok(event) => return Some((*chat, SocketEvent::Inbound(event))),
                Err(TryRecvError::Empty) => {},
                Err(TryRecvError::Disconnected) => {
                    closed = Some(*chat);
                    break;
                },
            }
        }

        let chat = closed?;
        self.sockets.remove(&chat);
        tracing::warn!(%chat, "socket closed");
        Some((chat, SocketEvent::Closed { reason: "socket closed".into() }))
    }

    fn close_socket(&mut self, chat: ChatId) {
        if let Some(open) = self.connecting.remove(&chat) {
            open.abort();
        }
        if let Some(socket) = self.sockets.remove(&chat) {
            socket.stop();
        }
    }

    fn render(&mut self, app: &App<Instant>) -> Result<(), Self::Error> {
        let clock = Clock::local();
        self.terminal.draw(|frame| ui::render(frame, app, &clock))?;
        Ok(())
    }

    fn stop(&mut self) {
        for open in std::mem::take(&mut self.connecting).into_values() {
            open.abort();
        }
        for socket in std::mem::take(&mut self.sockets).into_values() {
            socket.stop();
        }
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
