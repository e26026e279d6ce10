use tokio::sync::broadcast;
use uuid::Uuid;

use crate::events::EventKind;

/// One encoded envelope in flight, tagged with the connection that sent it.
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: EventKind,
    pub body: String,
    pub source: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub enum HubMessage {
    Event(Frame),
    /// Number of sockets currently connected to the relay.
    Presence(usize),
}

pub type HubSender = broadcast::Sender<HubMessage>;

pub fn create_relay_hub(capacity: usize) -> HubSender {
    let (tx, _rx) = broadcast::channel(capacity);
    tx
}
