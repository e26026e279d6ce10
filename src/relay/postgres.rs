//! Change-feed transport: publishing inserts into the `events` table, and
//! the table trigger's NOTIFY is what subscribers receive.

use async_trait::async_trait;
use futures::StreamExt;
use sqlx::postgres::PgListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::connection::{ConnectionState, ConnectionTracker, LifecycleSignal};
use super::transport::{FrameStream, Transport};
use crate::db::{self, DbPool};
use crate::error::RelayError;
use crate::events::EventKind;

pub struct PgTransport {
    pool: DbPool,
    tracker: ConnectionTracker,
}

impl PgTransport {
    pub fn new(pool: DbPool) -> Self {
        PgTransport {
            pool,
            tracker: ConnectionTracker::new(),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, RelayError> {
        let pool = db::init_db(database_url).await?;
        Ok(Self::new(pool))
    }

    async fn listen(&self, kind: EventKind) -> Result<PgListener, sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&kind.notify_channel()).await?;
        Ok(listener)
    }
}

#[async_trait]
impl Transport for PgTransport {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn subscribe(&self, kind: EventKind) -> Result<FrameStream, RelayError> {
        let mut listener = match self.listen(kind).await {
            Ok(listener) => listener,
            Err(e) => {
                self.tracker.apply(LifecycleSignal::ChannelError);
                return Err(e.into());
            }
        };
        info!(%kind, channel = %kind.notify_channel(), "listening for events");
        self.tracker.apply(LifecycleSignal::Subscribed);

        let tracker = self.tracker.clone();
        let frames = async_stream::stream! {
            let mut reconnecting = false;
            loop {
                match listener.try_recv().await {
                    Ok(Some(notification)) => {
                        if reconnecting {
                            reconnecting = false;
                            tracker.apply(LifecycleSignal::Subscribed);
                        }
                        yield notification.payload().to_string();
                    }
                    Ok(None) => {
                        warn!(%kind, "change feed connection lost, reconnecting");
                        reconnecting = true;
                        tracker.apply(LifecycleSignal::Reconnecting);
                    }
                    Err(e) => {
                        error!(%kind, error = %e, "change feed failed");
                        tracker.apply(LifecycleSignal::ChannelError);
                        break;
                    }
                }
            }
        };
        Ok(frames.boxed())
    }

    async fn send(&self, kind: EventKind, frame: String) -> Result<(), RelayError> {
        db::insert_event(&self.pool, kind, &frame).await?;
        Ok(())
    }

    fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.tracker.watch()
    }
}
