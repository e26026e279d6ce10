use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::EventKind;

pub const USER_COUNT_EVENT: &str = "user-count";

/// Named message exchanged with the socket relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketMessage {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// What a socket message name means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketEvent {
    Publish(EventKind),
    Notification(EventKind),
    UserCount,
}

impl SocketEvent {
    pub fn parse(name: &str) -> Option<Self> {
        if name == USER_COUNT_EVENT {
            return Some(SocketEvent::UserCount);
        }
        EventKind::ALL.into_iter().find_map(|kind| {
            if name == kind.publish_event() {
                Some(SocketEvent::Publish(kind))
            } else if name == kind.notification_event() {
                Some(SocketEvent::Notification(kind))
            } else {
                None
            }
        })
    }
}

impl SocketMessage {
    pub fn publish(kind: EventKind, data: Value) -> Self {
        SocketMessage {
            event: kind.publish_event().to_string(),
            data,
        }
    }

    pub fn notification(kind: EventKind, data: Value) -> Self {
        SocketMessage {
            event: kind.notification_event().to_string(),
            data,
        }
    }

    pub fn user_count(count: usize) -> Self {
        SocketMessage {
            event: USER_COUNT_EVENT.to_string(),
            data: Value::from(count),
        }
    }

    pub fn parse_event(&self) -> Option<SocketEvent> {
        SocketEvent::parse(&self.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_names_map_to_kinds() {
        assert_eq!(
            SocketEvent::parse("vote-event"),
            Some(SocketEvent::Publish(EventKind::Vote))
        );
        assert_eq!(
            SocketEvent::parse("pool-created-notification"),
            Some(SocketEvent::Notification(EventKind::PoolCreated))
        );
        assert_eq!(SocketEvent::parse("user-count"), Some(SocketEvent::UserCount));
        assert_eq!(SocketEvent::parse("ping"), None);
    }

    #[test]
    fn messages_serialize_as_event_and_data() {
        let msg = SocketMessage::user_count(3);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "event": "user-count", "data": 3 })
        );
        let parsed: SocketMessage =
            serde_json::from_str(r#"{"event":"toast-event","data":{"title":"x"}}"#).unwrap();
        assert_eq!(parsed.parse_event(), Some(SocketEvent::Publish(EventKind::Toast)));
    }
}
