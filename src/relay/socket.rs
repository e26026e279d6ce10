//! WebSocket transport speaking the relay server's named-message protocol.
//!
//! One background task owns the connection. It reconnects with exponential
//! backoff and reports every connect and drop to the [`ConnectionTracker`].

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_stream::wrappers::BroadcastStream;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use url::Url;

use super::connection::{ConnectionState, ConnectionTracker, LifecycleSignal};
use super::protocol::{SocketEvent, SocketMessage};
use super::transport::{FrameStream, Transport};
use crate::error::RelayError;
use crate::events::EventKind;

const PING_INTERVAL: Duration = Duration::from_secs(25);
const RECONNECT_BASE: Duration = Duration::from_secs(2);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);
const INBOUND_CAPACITY: usize = 256;

pub struct SocketTransport {
    url: Url,
    outbound: mpsc::UnboundedSender<SocketMessage>,
    inbound: broadcast::Sender<(EventKind, String)>,
    tracker: ConnectionTracker,
    online: watch::Receiver<usize>,
    task: JoinHandle<()>,
}

impl SocketTransport {
    /// Starts connecting in the background and returns at once.
    pub fn connect(url: &str) -> Result<Self, RelayError> {
        let url = Url::parse(url)?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(RelayError::Config(format!(
                    "socket url must be ws:// or wss://, got {other}://"
                )));
            }
        }

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (inbound, _) = broadcast::channel(INBOUND_CAPACITY);
        let (online_tx, online) = watch::channel(0usize);
        let tracker = ConnectionTracker::new();

        let task = tokio::spawn(run_socket_connection(
            url.clone(),
            outbound_rx,
            inbound.clone(),
            tracker.clone(),
            online_tx,
        ));

        Ok(SocketTransport {
            url,
            outbound,
            inbound,
            tracker,
            online,
            task,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Connected users as last announced by the relay.
    pub fn online_users(&self) -> watch::Receiver<usize> {
        self.online.clone()
    }
}

impl Drop for SocketTransport {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl Transport for SocketTransport {
    fn name(&self) -> &'static str {
        "socket"
    }

    async fn subscribe(&self, kind: EventKind) -> Result<FrameStream, RelayError> {
        let frames = BroadcastStream::new(self.inbound.subscribe()).filter_map(
            move |message| async move {
                match message {
                    Ok((frame_kind, body)) if frame_kind == kind => Some(body),
                    Ok(_) => None,
                    Err(e) => {
                        warn!(%kind, error = %e, "socket subscriber lagged, events skipped");
                        None
                    }
                }
            },
        );
        Ok(frames.boxed())
    }

    async fn send(&self, kind: EventKind, frame: String) -> Result<(), RelayError> {
        if !self.tracker.is_connected() {
            return Err(RelayError::NotConnected);
        }
        let data = serde_json::from_str(&frame)?;
        self.outbound
            .send(SocketMessage::publish(kind, data))
            .map_err(|_| RelayError::Closed)
    }

    fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.tracker.watch()
    }
}

async fn run_socket_connection(
    url: Url,
    mut outbound: mpsc::UnboundedReceiver<SocketMessage>,
    inbound: broadcast::Sender<(EventKind, String)>,
    tracker: ConnectionTracker,
    online: watch::Sender<usize>,
) {
    let mut backoff = RECONNECT_BASE;

    loop {
        tracker.apply(LifecycleSignal::Reconnecting);
        info!(url = %url, "connecting to relay socket");

        match connect_and_stream(&url, &mut outbound, &inbound, &tracker, &online).await {
            Ok(()) => {
                info!("relay socket closed");
                backoff = RECONNECT_BASE;
            }
            Err(e) => {
                error!(error = %e, "relay socket error");
            }
        }

        tracker.apply(LifecycleSignal::Closed);

        info!(delay = ?backoff, "reconnecting to relay socket");
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_RECONNECT_DELAY);
    }
}

async fn connect_and_stream(
    url: &Url,
    outbound: &mut mpsc::UnboundedReceiver<SocketMessage>,
    inbound: &broadcast::Sender<(EventKind, String)>,
    tracker: &ConnectionTracker,
    online: &watch::Sender<usize>,
) -> Result<(), RelayError> {
    let (ws_stream, _response) = connect_async(url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();

    info!("relay socket connected");
    tracker.apply(LifecycleSignal::Subscribed);

    let mut ping = interval(PING_INTERVAL);
    ping.tick().await;

    loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(message) => {
                    let text = serde_json::to_string(&message)?;
                    write.send(Message::Text(text)).await?;
                }
                None => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => handle_incoming(&text, inbound, online),
                Some(Ok(Message::Close(frame))) => {
                    info!(frame = ?frame, "relay sent close frame");
                    return Ok(());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            _ = ping.tick() => {
                write.send(Message::Ping(Vec::new())).await?;
            }
        }
    }
}

fn handle_incoming(
    text: &str,
    inbound: &broadcast::Sender<(EventKind, String)>,
    online: &watch::Sender<usize>,
) {
    let message: SocketMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "unreadable relay message");
            return;
        }
    };

    match message.parse_event() {
        Some(SocketEvent::Notification(kind)) => {
            let _ = inbound.send((kind, message.data.to_string()));
        }
        Some(SocketEvent::UserCount) => {
            if let Some(count) = message.data.as_u64() {
                online.send_replace(count as usize);
            }
        }
        Some(SocketEvent::Publish(_)) | None => {
            debug!(event = %message.event, "ignoring relay message");
        }
    }
}
