use pool_relay::config::ServerConfig;
use pool_relay::events::{ActorId, Blockchain, EventKind, EventPayload, VoteChoice};
use pool_relay::relay::{
    ChannelBinding, ConnectionState, Publisher, SocketTransport, SubscriptionFilter, Transport,
};
use pool_relay::startup::{AppState, app};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;

const WAIT: Duration = Duration::from_secs(5);

async fn spawn_relay() -> String {
    let config = ServerConfig::from_lookup(|_| None).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(AppState::new(&config, None)))
            .await
            .unwrap();
    });
    format!("ws://{addr}/ws")
}

async fn connected(url: &str) -> Arc<SocketTransport> {
    let transport = Arc::new(SocketTransport::connect(url).unwrap());
    let mut state = transport.connection();
    timeout(WAIT, state.wait_for(|s| *s == ConnectionState::Connected))
        .await
        .unwrap()
        .unwrap();
    transport
}

#[tokio::test]
async fn frames_reach_other_clients_only() {
    let url = spawn_relay().await;
    let alice = connected(&url).await;
    let bob = connected(&url).await;

    let mut online = alice.online_users();
    timeout(WAIT, online.wait_for(|count| *count == 2))
        .await
        .unwrap()
        .unwrap();

    let (alice_tx, mut alice_rx) = mpsc::unbounded_channel();
    let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();
    let alice_binding = ChannelBinding::new(alice.clone(), None);
    let bob_binding = ChannelBinding::new(bob.clone(), Some(ActorId::new("0xBBB")));

    let alice_handle = alice_binding.open(EventKind::Vote, SubscriptionFilter::any(), move |p| {
        let _ = alice_tx.send(p);
    });
    let bob_handle = bob_binding.open(EventKind::Vote, SubscriptionFilter::any(), move |p| {
        let _ = bob_tx.send(p);
    });
    assert!(alice_handle.ready().await);
    assert!(bob_handle.ready().await);

    let publisher = Publisher::new(alice.clone(), Some(ActorId::new("0xAAA")));
    assert!(
        publisher
            .notify_vote("flow-3", VoteChoice::No, Blockchain::Flow)
            .await
            .unwrap()
    );

    match timeout(WAIT, bob_rx.recv()).await.unwrap().unwrap() {
        EventPayload::Vote(vote) => {
            assert_eq!(vote.vote, VoteChoice::No);
            assert_eq!(vote.actor_address.as_deref(), Some("0xAAA"));
        }
        other => panic!("unexpected payload {other:?}"),
    }
    assert!(
        timeout(Duration::from_millis(300), alice_rx.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn user_count_drops_when_a_client_leaves() {
    let url = spawn_relay().await;
    let alice = connected(&url).await;
    let bob = connected(&url).await;

    let mut online = alice.online_users();
    timeout(WAIT, online.wait_for(|count| *count == 2))
        .await
        .unwrap()
        .unwrap();

    drop(bob);
    timeout(WAIT, online.wait_for(|count| *count == 1))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn client_reports_disconnected_when_relay_goes_away() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let relay = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let socket = accept_async(stream).await.unwrap();
        let _ = stop_rx.await;
        drop(socket);
    });

    let client = connected(&format!("ws://{addr}/ws")).await;
    let mut state = client.connection();

    stop_tx.send(()).unwrap();
    relay.await.unwrap();

    timeout(WAIT, state.wait_for(|s| *s == ConnectionState::Disconnected))
        .await
        .unwrap()
        .unwrap();
    assert!(
        client
            .send(EventKind::Toast, r#"{"kind":"toast","payload":{"title":"x"}}"#.to_string())
            .await
            .is_err()
    );
}
