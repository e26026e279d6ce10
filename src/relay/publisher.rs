use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::transport::Transport;
use crate::error::RelayError;
use crate::events::{
    ActorId, Blockchain, Envelope, EventPayload, PoolCreatedPayload, ToastPayload, ToastVariant,
    VoteChoice, VotePayload,
};

/// Pushes envelopes stamped with this publisher's actor id.
#[derive(Clone)]
pub struct Publisher {
    transport: Arc<dyn Transport>,
    origin: Option<ActorId>,
}

impl Publisher {
    pub fn new(transport: Arc<dyn Transport>, origin: Option<ActorId>) -> Self {
        Publisher { transport, origin }
    }

    pub fn origin(&self) -> Option<&ActorId> {
        self.origin.as_ref()
    }

    /// Best effort: no retry, no dedup, no ordering across publishers.
    pub async fn publish(&self, payload: impl Into<EventPayload>) -> Result<(), RelayError> {
        let envelope = Envelope::new(payload, self.origin.clone());
        let kind = envelope.kind();
        let frame = envelope.encode()?;
        self.transport.send(kind, frame).await?;
        debug!(%kind, transport = self.transport.name(), "event published");
        Ok(())
    }

    /// Fire-and-forget publish. Failures are logged, never surfaced; the
    /// handle resolves to whether the send went through.
    pub fn notify(&self, payload: impl Into<EventPayload>) -> JoinHandle<bool> {
        let publisher = self.clone();
        let payload = payload.into();
        tokio::spawn(async move {
            match publisher.publish(payload).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "failed to publish notification");
                    false
                }
            }
        })
    }

    pub fn notify_vote(
        &self,
        pool_id: impl Into<String>,
        vote: VoteChoice,
        blockchain: Blockchain,
    ) -> JoinHandle<bool> {
        self.notify(VotePayload {
            pool_id: pool_id.into(),
            vote,
            actor_address: self.origin.as_ref().map(|o| o.as_str().to_string()),
            blockchain,
        })
    }

    pub fn notify_toast(
        &self,
        title: impl Into<String>,
        description: Option<String>,
        variant: ToastVariant,
    ) -> JoinHandle<bool> {
        self.notify(ToastPayload {
            title: title.into(),
            description,
            variant,
        })
    }

    pub fn notify_pool_created(&self, payload: PoolCreatedPayload) -> JoinHandle<bool> {
        self.notify(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::relay::memory::MemoryTransport;
    use crate::relay::transport::FrameStream;
    use crate::relay::{connection::ConnectionState, hub::create_relay_hub};
    use async_trait::async_trait;
    use futures::StreamExt;
    use tokio::sync::watch;

    struct Offline;

    #[async_trait]
    impl Transport for Offline {
        fn name(&self) -> &'static str {
            "offline"
        }

        async fn subscribe(&self, _kind: EventKind) -> Result<FrameStream, RelayError> {
            Err(RelayError::NotConnected)
        }

        async fn send(&self, _kind: EventKind, _frame: String) -> Result<(), RelayError> {
            Err(RelayError::NotConnected)
        }

        fn connection(&self) -> watch::Receiver<ConnectionState> {
            watch::channel(ConnectionState::Connecting).1
        }
    }

    #[tokio::test]
    async fn publish_stamps_origin_and_kind() {
        let hub = create_relay_hub(8);
        let listener = MemoryTransport::new(hub.clone());
        let mut frames = listener.subscribe(EventKind::Vote).await.unwrap();

        let publisher = Publisher::new(
            Arc::new(MemoryTransport::new(hub)),
            Some(ActorId::new("0xAAA")),
        );
        assert!(publisher.notify_vote("flow-3", VoteChoice::No, Blockchain::Flow).await.unwrap());

        let envelope = Envelope::decode(&frames.next().await.unwrap()).unwrap();
        assert_eq!(envelope.origin_id().map(ActorId::as_str), Some("0xAAA"));
        match envelope.payload() {
            EventPayload::Vote(vote) => {
                assert_eq!(vote.vote, VoteChoice::No);
                assert_eq!(vote.actor_address.as_deref(), Some("0xAAA"));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn failures_are_reported_but_swallowed_by_notify() {
        let publisher = Publisher::new(Arc::new(Offline), None);
        let toast = ToastPayload {
            title: "Vote submitted".to_string(),
            description: None,
            variant: ToastVariant::Default,
        };
        assert!(matches!(
            publisher.publish(toast.clone()).await,
            Err(RelayError::NotConnected)
        ));
        assert!(!publisher.notify(toast).await.unwrap());
    }
}
