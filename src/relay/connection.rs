use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

/// Connectivity shown to views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// Lifecycle callbacks a backend reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// The backend confirmed the subscription or connection.
    Subscribed,
    Reconnecting,
    Closed,
    ChannelError,
    TimedOut,
}

/// Mirrors backend lifecycle into a [`ConnectionState`]. Signals overwrite the
/// current state without any transition checks; only `Subscribed` yields
/// `Connected`.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    tx: watch::Sender<ConnectionState>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Connecting);
        ConnectionTracker { tx }
    }

    pub fn apply(&self, signal: LifecycleSignal) -> ConnectionState {
        let next = match signal {
            LifecycleSignal::Subscribed => ConnectionState::Connected,
            LifecycleSignal::Reconnecting => ConnectionState::Connecting,
            LifecycleSignal::Closed | LifecycleSignal::ChannelError | LifecycleSignal::TimedOut => {
                ConnectionState::Disconnected
            }
        };
        debug!(?signal, state = ?next, "connection lifecycle");
        self.tx.send_replace(next);
        next
    }

    pub fn current(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.current() == ConnectionState::Connected
    }

    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_connecting_and_needs_confirmation() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.current(), ConnectionState::Connecting);

        tracker.apply(LifecycleSignal::Reconnecting);
        assert_eq!(tracker.current(), ConnectionState::Connecting);

        tracker.apply(LifecycleSignal::Subscribed);
        assert_eq!(tracker.current(), ConnectionState::Connected);

        tracker.apply(LifecycleSignal::Closed);
        assert_eq!(tracker.current(), ConnectionState::Disconnected);
    }

    #[test]
    fn every_failure_signal_disconnects() {
        for signal in [
            LifecycleSignal::Closed,
            LifecycleSignal::ChannelError,
            LifecycleSignal::TimedOut,
        ] {
            let tracker = ConnectionTracker::new();
            tracker.apply(LifecycleSignal::Subscribed);
            assert_eq!(tracker.apply(signal), ConnectionState::Disconnected);
        }
    }

    #[tokio::test]
    async fn watchers_observe_each_transition() {
        let tracker = ConnectionTracker::new();
        let mut rx = tracker.watch();
        assert_eq!(*rx.borrow_and_update(), ConnectionState::Connecting);

        tracker.apply(LifecycleSignal::Subscribed);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ConnectionState::Connected);

        tracker.apply(LifecycleSignal::TimedOut);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ConnectionState::Disconnected);
    }
}
