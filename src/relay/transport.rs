use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::watch;

use super::connection::ConnectionState;
use crate::error::RelayError;
use crate::events::EventKind;

/// Raw encoded envelopes for one kind, in backend delivery order.
pub type FrameStream = BoxStream<'static, String>;

/// A pub/sub backend the relay can run over. Implementations are
/// interchangeable; which one is used is a configuration decision.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Starts delivering frames of `kind`. Anything sent before this resolves
    /// is not replayed.
    async fn subscribe(&self, kind: EventKind) -> Result<FrameStream, RelayError>;

    async fn send(&self, kind: EventKind, frame: String) -> Result<(), RelayError>;

    fn connection(&self) -> watch::Receiver<ConnectionState>;
}
