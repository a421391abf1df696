//! REST client for the chat endpoints.

use std::time::Duration;

use carelink_proto::{
    Message, Profile, Role, Room, RoomId, UnreadCounts, UserId,
    api::{
        self, ContactsResponse, HistoryResponse, RoomResponse, UNREAD_PATH, UnreadResponse,
    },
};
use serde::de::DeserializeOwned;

use super::TransportError;
use crate::SessionContext;

/// Upper bound on a single REST request, including the body.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Authenticated REST client.
///
/// Every request carries `Authorization: Bearer <token>`. A non-2xx status
/// and a `success: false` envelope are both failures.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:5000`).
    pub fn new(base_url: impl Into<String>, ctx: &SessionContext) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url, token: ctx.token().to_string() })
    }

    /// Resolve (or create) the private room with `counterparty`.
    pub async fn private_room(&self, counterparty: &UserId) -> Result<Room, TransportError> {
        let response: RoomResponse = self.get(&api::private_room_path(counterparty)).await?;
        Ok(response.into_room()?)
    }

    /// Room history in server order.
    pub async fn history(&self, room_id: &RoomId) -> Result<Vec<Message>, TransportError> {
        let response: HistoryResponse = self.get(&api::history_path(room_id)).await?;
        Ok(response.into_messages()?)
    }

    /// Contacts of a viewer with `role`.
    pub async fn contacts(&self, role: Role) -> Result<Vec<Profile>, TransportError> {
        let response: ContactsResponse = self.get(api::contacts_path(role)).await?;
        Ok(response.into_contacts(role)?)
    }

    /// Unread counts per counterparty.
    pub async fn unread(&self) -> Result<UnreadCounts, TransportError> {
        let response: UnreadResponse = self.get(UNREAD_PATH).await?;
        Ok(response.into_counts()?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "GET");
        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}
