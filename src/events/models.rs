use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RelayError;

/// Logical channel an event travels on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Vote,
    Toast,
    PoolCreated,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Vote, EventKind::Toast, EventKind::PoolCreated];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Vote => "vote",
            EventKind::Toast => "toast",
            EventKind::PoolCreated => "pool_created",
        }
    }

    /// Socket message a client sends to publish this kind.
    pub fn publish_event(&self) -> &'static str {
        match self {
            EventKind::Vote => "vote-event",
            EventKind::Toast => "toast-event",
            EventKind::PoolCreated => "pool-created-event",
        }
    }

    /// Socket message the relay fans out to the other clients.
    pub fn notification_event(&self) -> &'static str {
        match self {
            EventKind::Vote => "vote-notification",
            EventKind::Toast => "toast-notification",
            EventKind::PoolCreated => "pool-created-notification",
        }
    }

    /// Postgres NOTIFY channel fed by the `events` table trigger.
    pub fn notify_channel(&self) -> String {
        format!("relay_{}", self.as_str())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vote" => Ok(EventKind::Vote),
            "toast" => Ok(EventKind::Toast),
            "pool_created" => Ok(EventKind::PoolCreated),
            other => Err(RelayError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Blockchain {
    Flow,
    Ronin,
}

impl Blockchain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Blockchain::Flow => "flow",
            Blockchain::Ronin => "ronin",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Blockchain::Flow => "Flow",
            Blockchain::Ronin => "Ronin",
        }
    }
}

impl FromStr for Blockchain {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flow" => Ok(Blockchain::Flow),
            "ronin" => Ok(Blockchain::Ronin),
            other => Err(RelayError::Config(format!("unknown blockchain `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    pub pool_id: String,
    pub vote: VoteChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_address: Option<String>,
    pub blockchain: Blockchain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastPayload {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub variant: ToastVariant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolCreatedPayload {
    pub pool_id: String,
    pub question: String,
    pub blockchain: Blockchain,
    pub total_amount: f64,
    pub creator_address: String,
}

/// Typed payload, one variant per [`EventKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Vote(VotePayload),
    Toast(ToastPayload),
    PoolCreated(PoolCreatedPayload),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Vote(_) => EventKind::Vote,
            EventPayload::Toast(_) => EventKind::Toast,
            EventPayload::PoolCreated(_) => EventKind::PoolCreated,
        }
    }

    pub fn pool_id(&self) -> Option<&str> {
        match self {
            EventPayload::Vote(v) => Some(v.pool_id.as_str()),
            EventPayload::PoolCreated(p) => Some(p.pool_id.as_str()),
            EventPayload::Toast(_) => None,
        }
    }

    pub fn blockchain(&self) -> Option<Blockchain> {
        match self {
            EventPayload::Vote(v) => Some(v.blockchain),
            EventPayload::PoolCreated(p) => Some(p.blockchain),
            EventPayload::Toast(_) => None,
        }
    }

    /// Actor embedded in the payload itself, if the kind carries one.
    pub fn actor(&self) -> Option<&str> {
        match self {
            EventPayload::Vote(v) => v.actor_address.as_deref(),
            EventPayload::PoolCreated(p) => Some(p.creator_address.as_str()),
            EventPayload::Toast(_) => None,
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            EventPayload::Vote(v) => serde_json::to_value(v),
            EventPayload::Toast(t) => serde_json::to_value(t),
            EventPayload::PoolCreated(p) => serde_json::to_value(p),
        }
    }

    /// Decodes `value` as the payload of `kind`. This is the only place untyped
    /// JSON becomes a payload.
    pub fn from_value(
        kind: EventKind,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            EventKind::Vote => EventPayload::Vote(serde_json::from_value(value)?),
            EventKind::Toast => EventPayload::Toast(serde_json::from_value(value)?),
            EventKind::PoolCreated => EventPayload::PoolCreated(serde_json::from_value(value)?),
        })
    }
}

impl From<VotePayload> for EventPayload {
    fn from(value: VotePayload) -> Self {
        EventPayload::Vote(value)
    }
}

impl From<ToastPayload> for EventPayload {
    fn from(value: ToastPayload) -> Self {
        EventPayload::Toast(value)
    }
}

impl From<PoolCreatedPayload> for EventPayload {
    fn from(value: PoolCreatedPayload) -> Self {
        EventPayload::PoolCreated(value)
    }
}

/// Wallet address or session id, compared without regard to ASCII case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        ActorId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for ActorId {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for ActorId {}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        ActorId::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_names_round_trip_through_from_str() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert!("votes".parse::<EventKind>().is_err());
        assert_eq!(EventKind::PoolCreated.notify_channel(), "relay_pool_created");
        assert_eq!(EventKind::PoolCreated.publish_event(), "pool-created-event");
    }

    #[test]
    fn vote_payload_uses_camel_case() {
        let value = json!({
            "poolId": "flow-3",
            "vote": "yes",
            "actorAddress": "0xAAA",
            "blockchain": "flow"
        });
        let payload = EventPayload::from_value(EventKind::Vote, value).unwrap();
        assert_eq!(payload.pool_id(), Some("flow-3"));
        assert_eq!(payload.actor(), Some("0xAAA"));
        assert_eq!(payload.blockchain(), Some(Blockchain::Flow));
    }

    #[test]
    fn toast_variant_defaults_when_missing() {
        let payload =
            EventPayload::from_value(EventKind::Toast, json!({ "title": "hello" })).unwrap();
        match payload {
            EventPayload::Toast(t) => {
                assert_eq!(t.variant, ToastVariant::Default);
                assert!(t.description.is_none());
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn payload_of_wrong_shape_is_rejected() {
        let toast = json!({ "title": "hello", "variant": "default" });
        assert!(EventPayload::from_value(EventKind::Vote, toast).is_err());

        let bad_chain = json!({
            "poolId": "p", "vote": "yes", "blockchain": "solana"
        });
        assert!(EventPayload::from_value(EventKind::Vote, bad_chain).is_err());
    }

    #[test]
    fn actor_ids_compare_case_insensitively() {
        let actor = ActorId::new("0xAbCdEf");
        assert!(actor.matches("0xabcdef"));
        assert!(actor.matches("0XABCDEF"));
        assert!(!actor.matches("0xabcde0"));
        assert_eq!(actor, ActorId::from("0xABCDEF"));
    }
}
