//! Subscribes to every event kind and logs what a browser would toast.

use pool_relay::config::ClientConfig;
use pool_relay::events::{Blockchain, EventKind};
use pool_relay::notify::Notification;
use pool_relay::relay::{ChannelBinding, SubscriptionFilter, connect_transport};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "INFO");
        }
    }
    tracing_subscriber::fmt::init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };

    // Optional filters: relay-watch [pool-id] [blockchain]
    let mut args = std::env::args().skip(1);
    let mut filter = SubscriptionFilter::any();
    if let Some(pool_id) = args.next() {
        filter = filter.with_pool(pool_id);
    }
    if let Some(chain) = args.next() {
        match chain.parse::<Blockchain>() {
            Ok(chain) => filter = filter.with_blockchain(chain),
            Err(e) => {
                error!("{e}");
                std::process::exit(2);
            }
        }
    }

    let transport = match connect_transport(&config).await {
        Ok(transport) => transport,
        Err(e) => {
            error!("failed to connect relay transport: {e}");
            std::process::exit(1);
        }
    };
    let binding = ChannelBinding::new(transport, config.actor.clone());

    let mut state = binding.connection();
    tokio::spawn(async move {
        info!(state = ?*state.borrow(), "relay connection");
        while state.changed().await.is_ok() {
            info!(state = ?*state.borrow(), "relay connection");
        }
    });

    let mut handles: Vec<_> = EventKind::ALL
        .into_iter()
        .map(|kind| {
            binding.open(kind, filter.clone(), move |payload| {
                let note = Notification::render(&payload);
                match note.description {
                    Some(description) => info!(%kind, "{} | {}", note.title, description),
                    None => info!(%kind, "{}", note.title),
                }
            })
        })
        .collect();

    for handle in &handles {
        if !handle.ready().await {
            error!(kind = %handle.kind(), "subscription failed");
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {e}");
    }
    for handle in &mut handles {
        handle.close();
    }
    info!("stopped watching");
}
