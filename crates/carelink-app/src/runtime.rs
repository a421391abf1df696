//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`Driver`]: Platform-specific I/O
//! - [`Environment`]: time source

use carelink_client::{Environment, SessionEvent};
use carelink_proto::Outbound;

use crate::{App, AppAction, AppEvent, ChatId, Driver, SocketEvent};

/// Generic runtime that orchestrates App and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment providing time
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    env: E,
    app: App<E::Instant>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    /// Create a new runtime around `app`.
    pub fn new(driver: D, env: E, app: App<E::Instant>) -> Self {
        Self { driver, env, app }
    }

    /// Run the main event loop.
    ///
    /// This is the core orchestration loop that:
    /// 1. Polls for input events from the driver
    /// 2. Receives socket events (open completions, frames, closes)
    /// 3. Ticks the App so debounce and polling timers fire
    /// 4. Executes the resulting actions through the driver
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        if !self.start().await? {
            loop {
                if self.process_cycle().await? {
                    break;
                }
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Render the first frame and mount the roster.
    ///
    /// Returns `true` if the application should quit.
    pub async fn start(&mut self) -> Result<bool, D::Error> {
        self.driver.render(&self.app)?;
        let now = self.env.now();
        self.dispatch(AppEvent::Start { now }).await
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    pub async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        if let Some(event) = self.driver.poll_event().await?
            && self.dispatch(event).await?
        {
            return Ok(true);
        }

        while let Some((chat, event)) = self.driver.recv_socket().await {
            let event = match event {
                SocketEvent::Opened => SessionEvent::SocketOpened,
                SocketEvent::Inbound(inbound) => SessionEvent::Inbound(inbound),
                SocketEvent::Closed { reason } => SessionEvent::SocketFailed { reason },
            };
            if self.dispatch(AppEvent::Chat { chat, event }).await? {
                return Ok(true);
            }
        }

        let now = self.env.now();
        self.dispatch(AppEvent::Tick { now }).await
    }

    /// Feed one event to the App and execute what it asks for.
    ///
    /// Returns `true` if should quit.
    pub async fn dispatch(&mut self, event: AppEvent<E::Instant>) -> Result<bool, D::Error> {
        let actions = self.app.handle(event);
        self.process_actions(actions).await
    }

    /// Process actions returned by the App.
    ///
    /// I/O completions are fed back to the App as events, and the actions they
    /// produce are processed in turn. Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                let Some(event) = self.execute(action).await? else {
                    continue;
                };
                match event {
                    Step::Quit => return Ok(true),
                    Step::Event(event) => pending_actions.extend(self.app.handle(event)),
                }
            }
        }
        Ok(false)
    }

    /// Execute one action, returning the completion event if any.
    async fn execute(&mut self, action: AppAction) -> Result<Option<Step<E::Instant>>, D::Error> {
        let event = match action {
            AppAction::Render => {
                self.driver.render(&self.app)?;
                return Ok(None);
            },
            AppAction::Quit => return Ok(Some(Step::Quit)),
            AppAction::FetchContacts { role } => match self.driver.fetch_contacts(role).await {
                Ok(contacts) => AppEvent::ContactsLoaded(contacts),
                Err(e) => AppEvent::ContactsFailed { reason: e.to_string() },
            },
            AppAction::FetchUnread => match self.driver.fetch_unread().await {
                Ok(counts) => AppEvent::UnreadLoaded(counts),
                Err(e) => AppEvent::UnreadFailed { reason: e.to_string() },
            },
            AppAction::ResolveRoom { chat, counterparty } => {
                let event = match self.driver.resolve_room(&counterparty).await {
                    Ok(room) => SessionEvent::RoomResolved(room),
                    Err(e) => SessionEvent::RoomFailed { reason: e.to_string() },
                };
                AppEvent::Chat { chat, event }
            },
            AppAction::FetchHistory { chat, room_id } => {
                let event = match self.driver.fetch_history(&room_id).await {
                    Ok(messages) => SessionEvent::HistoryLoaded { room_id, messages },
                    Err(e) => SessionEvent::HistoryFailed { room_id, reason: e.to_string() },
                };
                AppEvent::Chat { chat, event }
            },
            AppAction::OpenSocket { chat, token } => {
                self.driver.open_socket(chat, &token);
                return Ok(None);
            },
            AppAction::Emit { chat, event } => return self.emit(chat, event).await,
            AppAction::CloseSocket { chat } => {
                self.driver.close_socket(chat);
                return Ok(None);
            },
        };
        Ok(Some(Step::Event(event)))
    }

    async fn emit(
        &mut self,
        chat: ChatId,
        event: Outbound,
    ) -> Result<Option<Step<E::Instant>>, D::Error> {
        let is_send = matches!(event, Outbound::SendMessage { .. });
        let name = event.name();
        match self.driver.emit(chat, event).await {
            Ok(()) => Ok(None),
            Err(e) => {
                tracing::warn!(%chat, event = name, error = %e, "emit failed");
                if !is_send {
                    return Ok(None);
                }
                let event = SessionEvent::SendFailed { reason: e.to_string() };
                Ok(Some(Step::Event(AppEvent::Chat { chat, event })))
            },
        }
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App<E::Instant> {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App<E::Instant> {
        &mut self.app
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

/// Outcome of executing one action.
enum Step<I> {
    /// Stop the loop.
    Quit,
    /// Feed this completion back into the App.
    Event(AppEvent<I>),
}
