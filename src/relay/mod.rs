pub mod binding;
pub mod connection;
pub mod dispatcher;
pub mod hub;
pub mod memory;
pub mod postgres;
pub mod protocol;
pub mod publisher;
pub mod socket;
pub mod transport;

pub use binding::{ChannelBinding, ChannelHandle};
pub use connection::{ConnectionState, ConnectionTracker, LifecycleSignal};
pub use dispatcher::{Dispatch, Dispatcher, DropReason, SubscriptionFilter};
pub use hub::{Frame, HubMessage, HubSender, create_relay_hub};
pub use memory::MemoryTransport;
pub use postgres::PgTransport;
pub use publisher::Publisher;
pub use socket::SocketTransport;
pub use transport::{FrameStream, Transport};

use std::sync::Arc;
use tracing::info;

use crate::config::{BackendKind, ClientConfig, DEFAULT_HUB_CAPACITY};
use crate::error::RelayError;

/// Builds the transport named by `config`.
pub async fn connect_transport(config: &ClientConfig) -> Result<Arc<dyn Transport>, RelayError> {
    let transport: Arc<dyn Transport> = match config.backend {
        BackendKind::Socket => Arc::new(SocketTransport::connect(&config.socket_url)?),
        BackendKind::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                RelayError::Config("DATABASE_URL is required for the postgres backend".to_string())
            })?;
            Arc::new(PgTransport::connect(url).await?)
        }
        BackendKind::Memory => Arc::new(MemoryTransport::standalone(DEFAULT_HUB_CAPACITY)),
    };
    info!(transport = transport.name(), "relay transport ready");
    Ok(transport)
}
