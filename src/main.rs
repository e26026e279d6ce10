use pool_relay::config::ServerConfig;
use pool_relay::db;
use pool_relay::startup::{AppState, app};
use std::net::SocketAddr;

#[macro_use]
extern crate tracing;

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "INFO");
        }
    }
    // initialize tracing
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env().expect("Invalid relay configuration");

    // Event history is optional; the relay runs without a database.
    let db = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::init_db(url)
                .await
                .expect("Failed to connect to the events database");
            info!("{}", db::get_pool_stats(&pool).await);
            Some(pool)
        }
        None => {
            warn!("DATABASE_URL not set, event history disabled");
            None
        }
    };

    let app_state = AppState::new(&config, db);
    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(environment = config.environment.as_str(), "listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Unable to spawn tcp listener");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Relay server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }
    info!("shutting down");
}
