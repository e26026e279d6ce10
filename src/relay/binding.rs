use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::connection::ConnectionState;
use super::dispatcher::{Dispatch, Dispatcher, SubscriptionFilter};
use super::transport::Transport;
use crate::events::{ActorId, EventKind, EventPayload};

type Callback = Box<dyn FnMut(EventPayload) + Send + 'static>;
type CallbackSlot = Arc<Mutex<Option<Callback>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Pending,
    Ready,
    Failed,
}

/// Opens subscriptions for one viewer against one transport.
#[derive(Clone)]
pub struct ChannelBinding {
    transport: Arc<dyn Transport>,
    viewer: Option<ActorId>,
}

impl ChannelBinding {
    pub fn new(transport: Arc<dyn Transport>, viewer: Option<ActorId>) -> Self {
        ChannelBinding { transport, viewer }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    pub fn viewer(&self) -> Option<&ActorId> {
        self.viewer.as_ref()
    }

    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.transport.connection()
    }

    /// Registers `on_event` for `kind` and returns without waiting for the
    /// backend. Events sent before the subscription is live are missed.
    pub fn open<F>(&self, kind: EventKind, filter: SubscriptionFilter, on_event: F) -> ChannelHandle
    where
        F: FnMut(EventPayload) + Send + 'static,
    {
        let dispatcher = Dispatcher::new(kind, filter, self.viewer.clone());
        let slot: CallbackSlot = Arc::new(Mutex::new(Some(Box::new(on_event))));
        let (ready_tx, ready) = watch::channel(Readiness::Pending);

        let task = tokio::spawn(run_subscription(
            self.transport.clone(),
            dispatcher,
            slot.clone(),
            ready_tx,
        ));

        ChannelHandle {
            kind,
            slot,
            ready,
            task: Some(task),
        }
    }
}

async fn run_subscription(
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
    slot: CallbackSlot,
    ready: watch::Sender<Readiness>,
) {
    let kind = dispatcher.kind();
    let mut frames = match transport.subscribe(kind).await {
        Ok(frames) => frames,
        Err(e) => {
            warn!(%kind, transport = transport.name(), error = %e, "subscribe failed");
            ready.send_replace(Readiness::Failed);
            return;
        }
    };
    ready.send_replace(Readiness::Ready);

    while let Some(frame) = frames.next().await {
        if let Dispatch::Deliver(payload) = dispatcher.admit_frame(&frame) {
            if !deliver(&slot, payload) {
                break;
            }
        }
    }
    debug!(%kind, "subscription ended");
}

/// Runs the callback unless the handle was closed. The slot lock is held for
/// the call, so a close that returned has already dropped the callback.
fn deliver(slot: &CallbackSlot, payload: EventPayload) -> bool {
    let mut guard = lock(slot);
    match guard.as_mut() {
        Some(callback) => {
            callback(payload);
            true
        }
        None => false,
    }
}

fn lock(slot: &CallbackSlot) -> MutexGuard<'_, Option<Callback>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A live subscription. Closing (or dropping) it guarantees the callback is
/// never invoked again. Do not close a handle from inside its own callback.
pub struct ChannelHandle {
    kind: EventKind,
    slot: CallbackSlot,
    ready: watch::Receiver<Readiness>,
    task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Waits until the backend has accepted the subscription. Returns false
    /// if subscribing failed or the handle was closed first.
    pub async fn ready(&self) -> bool {
        let mut ready = self.ready.clone();
        match ready.wait_for(|state| *state != Readiness::Pending).await {
            Ok(state) => *state == Readiness::Ready,
            Err(_) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.slot).is_none()
    }

    /// Idempotent.
    pub fn close(&mut self) {
        let callback = lock(&self.slot).take();
        drop(callback);
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(kind = %self.kind, "channel closed");
        }
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.close();
    }
}
