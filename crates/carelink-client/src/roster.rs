//! Contact roster with unread badges.
//!
//! Lists the people the viewer can chat with (patients for a doctor, doctors
//! for a patient), keeps their unread counts fresh by polling, and decides
//! which single chat widget is open. Contacts with a known latest message
//! sort first, most recent on top.

use std::{cmp::Ordering, collections::HashMap, ops::Sub, time::Duration};

use carelink_core::poll::{DEFAULT_UNREAD_POLL_INTERVAL, PollTimer};
use carelink_proto::{Message, Profile, Role, UnreadCounts, UserId};

use crate::event::{RosterAction, RosterEvent};

/// Roster configuration.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    /// Time between unread-count polls.
    pub unread_poll_interval: Duration,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self { unread_poll_interval: DEFAULT_UNREAD_POLL_INTERVAL }
    }
}

/// Contact roster state machine.
///
/// # Invariants
///
/// - Contacts are fetched once per mount.
/// - Unread counts are polled on a fixed interval only while mounted.
/// - At most one chat is open. Opening another closes the current one first.
#[derive(Debug, Clone)]
pub struct ContactRoster<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    role: Role,
    contacts: Vec<Profile>,
    unread: UnreadCounts,
    latest: HashMap<UserId, Message>,
    poll: PollTimer<I>,
    selected: Option<UserId>,
    search: String,
    contacts_error: Option<String>,
    loading: bool,
    mounted: bool,
}

impl<I> ContactRoster<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create an unmounted roster for a viewer with `role`.
    pub fn new(role: Role, config: RosterConfig) -> Self {
        Self {
            role,
            contacts: Vec::new(),
            unread: UnreadCounts::new(),
            latest: HashMap::new(),
            poll: PollTimer::new(config.unread_poll_interval),
            selected: None,
            search: String::new(),
            contacts_error: None,
            loading: false,
            mounted: false,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: RosterEvent<I>) -> Vec<RosterAction> {
        match event {
            RosterEvent::Mount { now } => {
                if self.mounted {
                    return Vec::new();
                }
                self.mounted = true;
                self.loading = true;
                self.poll.start(now);
                vec![RosterAction::FetchContacts { role: self.role }, RosterAction::FetchUnread]
            },
            RosterEvent::ContactsLoaded(contacts) => {
                tracing::debug!(count = contacts.len(), "contacts loaded");
                self.contacts = contacts;
                self.contacts_error = None;
                self.loading = false;
                Vec::new()
            },
            RosterEvent::ContactsFailed { reason } => {
                tracing::warn!(%reason, "contacts fetch failed");
                self.contacts_error = Some(reason);
                self.loading = false;
                Vec::new()
            },
            RosterEvent::UnreadLoaded(counts) => {
                self.unread = counts;
                Vec::new()
            },
            RosterEvent::UnreadFailed { reason } => {
                tracing::warn!(%reason, "unread fetch failed");
                Vec::new()
            },
            RosterEvent::Tick { now } => {
                if self.mounted && self.poll.due(now) {
                    vec![RosterAction::FetchUnread]
                } else {
                    Vec::new()
                }
            },
            RosterEvent::Select(user_id) => self.select(user_id),
            RosterEvent::CloseChat => match self.selected.take() {
                Some(_) => vec![RosterAction::CloseChat],
                None => Vec::new(),
            },
            RosterEvent::Search(query) => {
                self.search = query;
                Vec::new()
            },
            RosterEvent::MessageSeen { counterparty, message } => {
                let newer = self
                    .latest
                    .get(&counterparty)
                    .is_none_or(|known| message.display_cmp(known) == Ordering::Greater);
                if newer {
                    self.latest.insert(counterparty, message);
                }
                Vec::new()
            },
            RosterEvent::Unmount => {
                self.mounted = false;
                self.poll.stop();
                match self.selected.take() {
                    Some(_) => vec![RosterAction::CloseChat],
                    None => Vec::new(),
                }
            },
        }
    }

    fn select(&mut self, user_id: UserId) -> Vec<RosterAction> {
        if !self.mounted || self.selected.as_ref() == Some(&user_id) {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if self.selected.is_some() {
            actions.push(RosterAction::CloseChat);
        }
        self.selected = Some(user_id.clone());
        actions.push(RosterAction::OpenChat { counterparty: user_id });
        actions
    }

    /// Contacts matching the search box, case-insensitively by name.
    ///
    /// Most recent conversation first; contacts without one keep server order.
    pub fn visible(&self) -> Vec<&Profile> {
        let needle = self.search.trim().to_lowercase();
        let mut visible: Vec<&Profile> = self
            .contacts
            .iter()
            .filter(|profile| {
                needle.is_empty() || profile.full_name.to_lowercase().contains(&needle)
            })
            .collect();
        visible.sort_by(|a, b| match (self.latest.get(&a.id), self.latest.get(&b.id)) {
            (Some(a), Some(b)) => b.display_cmp(a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        visible
    }

    /// Latest message seen in the conversation with `user_id`.
    pub fn last_message(&self, user_id: &UserId) -> Option<&Message> {
        self.latest.get(user_id)
    }

    /// All contacts.
    pub fn contacts(&self) -> &[Profile] {
        &self.contacts
    }

    /// Unread count for `user_id`.
    pub fn unread_for(&self, user_id: &UserId) -> u32 {
        self.unread.get(user_id).copied().unwrap_or(0)
    }

    /// Contact whose chat is open.
    pub fn selected(&self) -> Option<&UserId> {
        self.selected.as_ref()
    }

    /// Current search text.
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Contacts fetch failure, if any.
    pub fn contacts_error(&self) -> Option<&str> {
        self.contacts_error.as_deref()
    }

    /// Whether the contact list is still loading.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the roster is mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Viewer role.
    pub fn role(&self) -> Role {
        self.role
    }
}
