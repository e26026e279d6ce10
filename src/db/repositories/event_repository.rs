use crate::db::connection::DbPool;
use crate::db::models::EventRow;
use crate::events::EventKind;
use sqlx::Error;
use sqlx::Row;

/// `pg_notify` rejects payloads of 8000 bytes or more, and the insert trigger
/// sends the row's data as the payload.
pub const MAX_NOTIFY_PAYLOAD_BYTES: usize = 7999;

pub fn fits_notify_payload(data: &str) -> bool {
    data.len() <= MAX_NOTIFY_PAYLOAD_BYTES
}

pub async fn insert_event(pool: &DbPool, kind: EventKind, data: &str) -> Result<i64, Error> {
    if !fits_notify_payload(data) {
        return Err(Error::Protocol(format!(
            "{kind} event is {} bytes, over the {MAX_NOTIFY_PAYLOAD_BYTES} byte notify limit",
            data.len()
        )));
    }

    let row = sqlx::query("INSERT INTO events (type, data) VALUES ($1, $2) RETURNING id")
        .bind(kind.as_str())
        .bind(data)
        .fetch_one(pool)
        .await?;

    Ok(row.get::<i64, _>("id"))
}

/// Most recent events first, optionally of one kind.
pub async fn recent_events(
    pool: &DbPool,
    kind: Option<EventKind>,
    limit: i64,
) -> Result<Vec<EventRow>, Error> {
    match kind {
        Some(kind) => {
            sqlx::query_as::<_, EventRow>(
                "SELECT id, type, data, created_at FROM events WHERE type = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
            )
            .bind(kind.as_str())
            .bind(limit)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, EventRow>(
                "SELECT id, type, data, created_at FROM events ORDER BY created_at DESC, id DESC LIMIT $1",
            )
            .bind(limit)
            .fetch_all(pool)
            .await
        }
    }
}
