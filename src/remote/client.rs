//! Network client for the itemsync server.
//!
//! Writes and deletes are plain HTTP requests against
//! `{base}/{collection}/{key}`; the subscription is a WebSocket on
//! `{base}/{collection}/ws` carrying [`StreamMessage`]s.

use futures::stream::{self, StreamExt};
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::{RemoteError, RemoteStore, StreamMessage, Subscription};
use crate::config::Config;
use crate::models::Item;
use crate::snapshot::Snapshot;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client for one collection on a remote server.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    http: reqwest::Client,
    server_url: String,
    collection: String,
}

impl HttpRemote {
    pub fn new(server_url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
            collection: collection.into().trim_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.server_url.value.clone(),
            config.collection.value.clone(),
        )
    }

    /// Server URL with an http(s) scheme.
    fn http_base(&self) -> String {
        if let Some(rest) = self.server_url.strip_prefix("ws://") {
            format!("http://{}", rest)
        } else if let Some(rest) = self.server_url.strip_prefix("wss://") {
            format!("https://{}", rest)
        } else if !self.server_url.starts_with("http://")
            && !self.server_url.starts_with("https://")
        {
            format!("http://{}", self.server_url)
        } else {
            self.server_url.clone()
        }
    }

    /// Server URL with a ws(s) scheme.
    fn ws_base(&self) -> String {
        if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if !self.server_url.starts_with("ws://") && !self.server_url.starts_with("wss://")
        {
            format!("ws://{}", self.server_url)
        } else {
            self.server_url.clone()
        }
    }

    fn child_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.http_base(),
            self.collection,
            urlencoding::encode(key)
        )
    }

    fn subscribe_url(&self) -> String {
        format!("{}/{}/ws", self.ws_base(), self.collection)
    }

    fn check(response: reqwest::Response) -> Result<(), RemoteError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RemoteError::Status(status.as_u16()))
        }
    }

    /// Reads the next snapshot, answering pings on the way.
    async fn next_snapshot(ws: &mut WsStream) -> Option<Result<Snapshot, RemoteError>> {
        loop {
            match ws.next().await? {
                Ok(Message::Text(text)) => {
                    let msg = match StreamMessage::decode(text.as_str()) {
                        Ok(msg) => msg,
                        Err(e) => return Some(Err(RemoteError::Decode(e.to_string()))),
                    };
                    return Some(match msg {
                        StreamMessage::Snapshot { children } => Ok(Snapshot { children }),
                        StreamMessage::Cancelled { message } => {
                            Err(RemoteError::Cancelled(message))
                        }
                    });
                }
                Ok(Message::Ping(data)) => {
                    if let Err(e) = ws.send(Message::Pong(data)).await {
                        return Some(Err(RemoteError::WebSocket(e.to_string())));
                    }
                }
                Ok(Message::Close(_)) => return Some(Err(RemoteError::Closed)),
                Ok(_) => {
                    // Ignore other message types
                }
                Err(e) => return Some(Err(RemoteError::WebSocket(e.to_string()))),
            }
        }
    }
}

impl RemoteStore for HttpRemote {
    async fn subscribe(&self) -> Result<Subscription, RemoteError> {
        let url = self.subscribe_url();
        tracing::debug!(%url, "Subscribing");

        let (ws, _) = connect_async(&url)
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        // State is None once an error has been yielded
        let events = stream::unfold(Some(ws), |state| async move {
            let mut ws = state?;
            match Self::next_snapshot(&mut ws).await {
                Some(Ok(snapshot)) => Some((Ok(snapshot), Some(ws))),
                Some(Err(e)) => Some((Err(e), None)),
                None => Some((Err(RemoteError::Closed), None)),
            }
        });

        Ok(events.boxed())
    }

    async fn write(&self, key: &str, item: &Item) -> Result<(), RemoteError> {
        let response = self
            .http
            .put(self.child_url(key))
            .json(item)
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        Self::check(response)
    }

    async fn delete(&self, key: &str) -> Result<(), RemoteError> {
        let response = self
            .http
            .delete(self.child_url(key))
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        Self::check(response)
    }
}
