//! Realtime socket transport.
//!
//! Provides [`ConnectedSocket`], which moves decoded events between channels
//! and a websocket. Frames that fail to decode are logged and dropped. When
//! the socket closes, `from_server` yields `None`.

use std::time::Duration;

use carelink_proto::{Inbound, Outbound};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::AUTHORIZATION},
    },
};

use super::TransportError;

/// Handle to an open realtime socket.
pub struct ConnectedSocket {
    /// Send events to the server.
    pub to_server: mpsc::Sender<Outbound>,
    /// Receive events from the server.
    pub from_server: mpsc::Receiver<Inbound>,
    /// Abort handle to stop the socket task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedSocket {
    /// Stop the socket task. Dropping the connection closes the socket.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for ConnectedSocket {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Open an authenticated socket to `url` (e.g. `ws://localhost:5000/ws`).
pub async fn connect(url: &str, token: &str) -> Result<ConnectedSocket, TransportError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| TransportError::Connection(format!("invalid url: {e}")))?;
    let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| TransportError::Connection(format!("invalid token: {e}")))?;
    request.headers_mut().insert(AUTHORIZATION, bearer);

    let (stream, _response) = connect_async(request)
        .await
        .map_err(|e| TransportError::Connection(e.to_string()))?;
    tracing::info!(%url, "socket connected");

    let (to_server_tx, to_server_rx) = mpsc::channel::<Outbound>(32);
    let (from_server_tx, from_server_rx) = mpsc::channel::<Inbound>(64);

    let handle = tokio::spawn(run_socket(stream, to_server_rx, from_server_tx));

    Ok(ConnectedSocket {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// [`connect`], giving up after `timeout`.
pub async fn connect_within(
    url: &str,
    token: &str,
    timeout: Duration,
) -> Result<ConnectedSocket, TransportError> {
    tokio::time::timeout(timeout, connect(url, token))
        .await
        .map_err(|_| TransportError::Timeout(timeout))?
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Bridge between the channels and the websocket until either side closes.
async fn run_socket(
    stream: WsStream,
    mut to_server: mpsc::Receiver<Outbound>,
    from_server: mpsc::Sender<Inbound>,
) {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            outbound = to_server.recv() => {
                let Some(event) = outbound else {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                };
                let text = match event.encode() {
                    Ok(text) => text,
                    Err(error) => {
                        tracing::warn!(event = event.name(), %error, "encode failed");
                        continue;
                    },
                };
                if let Err(error) = write.send(Message::Text(text)).await {
                    tracing::warn!(%error, "socket write failed");
                    break;
                }
            },
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match Inbound::decode(&text) {
                        Ok(event) => {
                            if from_server.send(event).await.is_err() {
                                break;
                            }
                        },
                        Err(error) => tracing::warn!(%error, "dropping undecodable frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("socket closed by server");
                        break;
                    },
                    Some(Ok(_)) => {},
                    Some(Err(error)) => {
                        tracing::warn!(%error, "socket read failed");
                        break;
                    },
                }
            },
        }
    }
}
