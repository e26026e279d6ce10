use crate::config::{Environment, ServerConfig};
use crate::db::connection::DbPool;
use crate::events_api::{health, list_events, post_event};
use crate::relay::hub::{HubSender, create_relay_hub};
use crate::socket_relay::ws_handler;
use crate::sse::kind_sse;
use axum::{
    Router,
    extract::Extension,
    http::{
        HeaderValue, Method, StatusCode,
        header::{ACCEPT, CONTENT_TYPE},
        request::Parts,
    },
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Instant;
use tokio::time::{Duration, interval};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub hub: HubSender,
    pub db: Option<DbPool>,
    /// Sockets currently attached to `/ws`.
    pub online: Arc<AtomicUsize>,
    pub started_at: Instant,
    pub environment: Environment,
}

impl AppState {
    pub fn new(config: &ServerConfig, db: Option<DbPool>) -> Self {
        if let Some(pool) = db.clone() {
            tokio::spawn(async move {
                let mut interval = interval(Duration::from_secs(60));
                loop {
                    interval.tick().await;
                    match pool.acquire().await {
                        Ok(conn) => {
                            drop(conn);
                        }
                        Err(e) => {
                            error!("Database connection health check failed: {}", e);
                        }
                    }
                }
            });
        }

        AppState {
            hub: create_relay_hub(config.hub_capacity),
            db,
            online: Arc::new(AtomicUsize::new(0)),
            started_at: Instant::now(),
            environment: config.environment,
        }
    }
}

/// The relay's full route table.
pub fn app(app_state: AppState) -> Router {
    let environment = app_state.environment;

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .route("/events", get(list_events).post(post_event))
        .route("/sse/:kind", get(kind_sse))
        .layer(Extension(app_state))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(
                    move |origin: &HeaderValue, _parts: &Parts| {
                        origin
                            .to_str()
                            .map(|origin| environment.allows_origin(origin))
                            .unwrap_or(false)
                    },
                ))
                .allow_credentials(true)
                .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE, ACCEPT]),
        )
        .fallback(handler_404)
}

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing to see here")
}
