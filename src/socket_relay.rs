use crate::error::RelayError;
use crate::events::Envelope;
use crate::relay::hub::{Frame, HubMessage};
use crate::relay::protocol::{SocketEvent, SocketMessage};
use crate::startup::AppState;
use axum::{
    extract::{
        Extension,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::Ordering;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(app_state): Extension<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let client_id = Uuid::new_v4();
    let hub = app_state.hub.clone();
    let (mut sender, mut receiver) = socket.split();
    let mut rx = hub.subscribe();

    let online = app_state.online.fetch_add(1, Ordering::SeqCst) + 1;
    info!(%client_id, online, "client connected");
    let _ = hub.send(HubMessage::Presence(online));

    let mut send_task = tokio::spawn(async move {
        loop {
            let message = match rx.recv().await {
                Ok(HubMessage::Event(frame)) if frame.source != Some(client_id) => {
                    match serde_json::from_str::<Value>(&frame.body) {
                        Ok(data) => SocketMessage::notification(frame.kind, data),
                        Err(e) => {
                            warn!(kind = %frame.kind, error = %e, "unencodable frame on hub");
                            continue;
                        }
                    }
                }
                Ok(HubMessage::Event(_)) => continue,
                Ok(HubMessage::Presence(count)) => SocketMessage::user_count(count),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%client_id, skipped, "client lagged behind the hub");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "failed to encode socket message");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let inbound_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => match inbound_frame(client_id, &text) {
                    Ok(Some(frame)) => {
                        debug!(%client_id, kind = %frame.kind, "relaying event");
                        let _ = inbound_hub.send(HubMessage::Event(frame));
                    }
                    Ok(None) => {}
                    Err(e) => warn!(%client_id, error = %e, "dropping malformed event"),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    let online = app_state
        .online
        .fetch_sub(1, Ordering::SeqCst)
        .saturating_sub(1);
    info!(%client_id, online, "client disconnected");
    let _ = hub.send(HubMessage::Presence(online));
}

/// Turns a client's `*-event` message into a hub frame. Other message names
/// are ignored.
pub fn inbound_frame(client_id: Uuid, text: &str) -> Result<Option<Frame>, RelayError> {
    let message: SocketMessage = serde_json::from_str(text)?;
    let Some(SocketEvent::Publish(kind)) = message.parse_event() else {
        return Ok(None);
    };

    let envelope = Envelope::from_value(message.data)?;
    if envelope.kind() != kind {
        return Err(RelayError::Decode(format!(
            "{} carried a {} envelope",
            message.event,
            envelope.kind()
        )));
    }

    Ok(Some(Frame {
        kind,
        body: envelope.encode()?,
        source: Some(client_id),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use serde_json::json;

    fn vote_envelope() -> Value {
        json!({
            "kind": "vote",
            "payload": {
                "poolId": "flow-3",
                "vote": "yes",
                "actorAddress": "0xA",
                "blockchain": "flow"
            },
            "originId": "0xA"
        })
    }

    #[test]
    fn publish_messages_become_frames() {
        let client = Uuid::new_v4();
        let text = json!({ "event": "vote-event", "data": vote_envelope() }).to_string();
        let frame = inbound_frame(client, &text).unwrap().unwrap();
        assert_eq!(frame.kind, EventKind::Vote);
        assert_eq!(frame.source, Some(client));
        assert_eq!(Envelope::decode(&frame.body).unwrap().kind(), EventKind::Vote);
    }

    #[test]
    fn mismatched_event_name_is_rejected() {
        let text = json!({ "event": "toast-event", "data": vote_envelope() }).to_string();
        assert!(matches!(
            inbound_frame(Uuid::new_v4(), &text),
            Err(RelayError::Decode(_))
        ));
    }

    #[test]
    fn other_messages_are_ignored() {
        let text = json!({ "event": "user-count", "data": 2 }).to_string();
        assert!(inbound_frame(Uuid::new_v4(), &text).unwrap().is_none());
        assert!(inbound_frame(Uuid::new_v4(), "not json").is_err());
    }
}
