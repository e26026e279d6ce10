use crate::db::{self, EventRow};
use crate::error::ApiError;
use crate::events::{Envelope, EventKind};
use crate::relay::hub::{Frame, HubMessage};
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 200;

pub async fn health(Extension(app_state): Extension<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "uptime": app_state.started_at.elapsed().as_secs_f64(),
        "environment": app_state.environment.as_str(),
    }))
}

/// Accepts an envelope over plain HTTP and fans it out like a socket publish.
pub async fn post_event(
    Extension(app_state): Extension<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let envelope = Envelope::from_value(body)?;
    let kind = envelope.kind();
    let frame = envelope.encode()?;

    // Live delivery first; history is best effort.
    let delivered = app_state
        .hub
        .send(HubMessage::Event(Frame {
            kind,
            body: frame.clone(),
            source: None,
        }))
        .unwrap_or(0);
    if delivered == 0 {
        debug!(%kind, "event accepted with no live listeners");
    }

    let stored_id = match &app_state.db {
        Some(pool) => match db::insert_event(pool, kind, &frame).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(%kind, error = %e, "failed to store event history");
                None
            }
        },
        None => None,
    };
    info!(%kind, id = ?stored_id, "event accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "accepted": true, "kind": kind, "id": stored_id })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub kind: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_events(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<EventRow>>, ApiError> {
    let pool = app_state.db.as_ref().ok_or(ApiError::DatabaseUnavailable)?;

    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<EventKind>)
        .transpose()?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let rows = db::recent_events(pool, kind, limit).await?;
    Ok(Json(rows))
}
