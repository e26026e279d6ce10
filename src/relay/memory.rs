use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::watch;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use uuid::Uuid;

use super::connection::{ConnectionState, ConnectionTracker, LifecycleSignal};
use super::hub::{Frame, HubMessage, HubSender, create_relay_hub};
use super::transport::{FrameStream, Transport};
use crate::error::RelayError;
use crate::events::EventKind;

/// In-process transport over a shared hub. Each instance behaves like one
/// connected socket: frames it sends reach every other instance on the same
/// hub, not itself.
pub struct MemoryTransport {
    hub: HubSender,
    source: Uuid,
    tracker: ConnectionTracker,
}

impl MemoryTransport {
    pub fn new(hub: HubSender) -> Self {
        MemoryTransport {
            hub,
            source: Uuid::new_v4(),
            tracker: ConnectionTracker::new(),
        }
    }

    /// A transport on a private hub of its own.
    pub fn standalone(capacity: usize) -> Self {
        Self::new(create_relay_hub(capacity))
    }

    pub fn hub(&self) -> &HubSender {
        &self.hub
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn subscribe(&self, kind: EventKind) -> Result<FrameStream, RelayError> {
        let source = self.source;
        let rx = self.hub.subscribe();
        self.tracker.apply(LifecycleSignal::Subscribed);

        let frames = BroadcastStream::new(rx).filter_map(move |message| async move {
            match message {
                Ok(HubMessage::Event(frame))
                    if frame.kind == kind && frame.source != Some(source) =>
                {
                    Some(frame.body)
                }
                Ok(_) => None,
                Err(e) => {
                    warn!(%kind, error = %e, "memory subscriber lagged, events skipped");
                    None
                }
            }
        });
        Ok(frames.boxed())
    }

    async fn send(&self, kind: EventKind, frame: String) -> Result<(), RelayError> {
        let message = HubMessage::Event(Frame {
            kind,
            body: frame,
            source: Some(self.source),
        });
        if self.hub.send(message).is_err() {
            debug!(%kind, "no subscribers on memory hub");
        }
        Ok(())
    }

    fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.tracker.watch()
    }
}
