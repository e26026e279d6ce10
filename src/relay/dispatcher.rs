use tracing::{debug, warn};

use crate::events::{ActorId, Blockchain, Envelope, EventKind, EventPayload};

/// Optional narrowing applied on top of the kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub pool_id: Option<String>,
    pub blockchain: Option<Blockchain>,
}

impl SubscriptionFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn pool(pool_id: impl Into<String>) -> Self {
        SubscriptionFilter {
            pool_id: Some(pool_id.into()),
            blockchain: None,
        }
    }

    pub fn chain(blockchain: Blockchain) -> Self {
        SubscriptionFilter {
            pool_id: None,
            blockchain: Some(blockchain),
        }
    }

    pub fn with_pool(mut self, pool_id: impl Into<String>) -> Self {
        self.pool_id = Some(pool_id.into());
        self
    }

    pub fn with_blockchain(mut self, blockchain: Blockchain) -> Self {
        self.blockchain = Some(blockchain);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Malformed,
    WrongKind,
    SelfOrigin,
    PoolMismatch,
    ChainMismatch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Deliver(EventPayload),
    Drop(DropReason),
}

/// Decides, per inbound frame, whether a viewer's subscription surfaces it.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    kind: EventKind,
    filter: SubscriptionFilter,
    viewer: Option<ActorId>,
}

impl Dispatcher {
    pub fn new(kind: EventKind, filter: SubscriptionFilter, viewer: Option<ActorId>) -> Self {
        Dispatcher {
            kind,
            filter,
            viewer,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Decodes a raw frame and applies [`Dispatcher::admit`]. Malformed frames
    /// are logged and dropped.
    pub fn admit_frame(&self, frame: &str) -> Dispatch {
        match Envelope::decode(frame) {
            Ok(envelope) => self.admit(envelope),
            Err(e) => {
                warn!(kind = %self.kind, error = %e, "dropping malformed event");
                Dispatch::Drop(DropReason::Malformed)
            }
        }
    }

    pub fn admit(&self, envelope: Envelope) -> Dispatch {
        let reason = if envelope.kind() != self.kind {
            Some(DropReason::WrongKind)
        } else if self
            .viewer
            .as_ref()
            .is_some_and(|viewer| envelope.originated_from(viewer))
        {
            Some(DropReason::SelfOrigin)
        } else if self
            .filter
            .pool_id
            .as_deref()
            .is_some_and(|wanted| envelope.payload().pool_id() != Some(wanted))
        {
            Some(DropReason::PoolMismatch)
        } else if self
            .filter
            .blockchain
            .is_some_and(|wanted| envelope.payload().blockchain() != Some(wanted))
        {
            Some(DropReason::ChainMismatch)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                debug!(kind = %self.kind, ?reason, "event filtered");
                Dispatch::Drop(reason)
            }
            None => Dispatch::Deliver(envelope.into_payload()),
        }
    }
}
