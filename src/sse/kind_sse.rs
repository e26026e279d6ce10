use crate::error::ApiError;
use crate::events::{ActorId, Blockchain, EventKind};
use crate::relay::dispatcher::{Dispatch, Dispatcher, SubscriptionFilter};
use crate::relay::hub::HubMessage;
use crate::startup::AppState;
use axum::{
    extract::{Extension, Path, Query},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::json;
use std::{convert::Infallible, time::Duration};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SseQuery {
    pub pool_id: Option<String>,
    pub blockchain: Option<String>,
    pub viewer: Option<String>,
}

impl SseQuery {
    /// Builds the dispatcher a browser subscription on `kind` runs through.
    pub fn dispatcher(&self, kind: EventKind) -> Result<Dispatcher, ApiError> {
        let mut filter = SubscriptionFilter::any();
        if let Some(pool_id) = self.pool_id.as_deref().filter(|p| !p.is_empty()) {
            filter = filter.with_pool(pool_id);
        }
        if let Some(chain) = self.blockchain.as_deref().filter(|c| !c.is_empty()) {
            let chain: Blockchain = chain.parse()?;
            filter = filter.with_blockchain(chain);
        }
        let viewer = self
            .viewer
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(ActorId::new);
        Ok(Dispatcher::new(kind, filter, viewer))
    }
}

pub async fn kind_sse(
    Path(kind): Path<String>,
    Query(query): Query<SseQuery>,
    Extension(app_state): Extension<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let kind: EventKind = kind.parse()?;
    let dispatcher = query.dispatcher(kind)?;
    let mut rx = app_state.hub.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("init")
            .data(json!({
                "kind": kind,
                "poolId": query.pool_id,
                "blockchain": query.blockchain,
            }).to_string()));

        loop {
            match rx.recv().await {
                Ok(HubMessage::Event(frame)) if frame.kind == kind => {
                    if let Dispatch::Deliver(payload) = dispatcher.admit_frame(&frame.body) {
                        match payload.to_value() {
                            Ok(data) => {
                                yield Ok(Event::default()
                                    .event(kind.as_str())
                                    .data(data.to_string()));
                            }
                            Err(e) => warn!(%kind, error = %e, "failed to encode payload for sse"),
                        }
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%kind, skipped, "sse subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    ))
}
