use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;

pub type DbPool = Pool<Postgres>;

pub async fn init_db(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .max_lifetime(Duration::from_secs(30 * 60))
        .idle_timeout(Duration::from_secs(10 * 60))
        .connect(database_url)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id BIGSERIAL PRIMARY KEY,
            type VARCHAR(32) NOT NULL,
            data TEXT NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_events_type_created_at ON events(type, created_at DESC)
        "#,
    )
    .execute(&pool)
    .await?;

    // Each insert is announced on `relay_<type>` with the row's data as payload.
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION notify_relay_event() RETURNS trigger AS $$
        BEGIN
            PERFORM pg_notify('relay_' || NEW.type, NEW.data);
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query("DROP TRIGGER IF EXISTS events_notify ON events")
        .execute(&pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER events_notify
            AFTER INSERT ON events
            FOR EACH ROW EXECUTE FUNCTION notify_relay_event()
        "#,
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}

pub async fn get_pool_stats(pool: &DbPool) -> String {
    let size = pool.size() as usize;
    let num_idle = pool.num_idle();
    format!(
        "Pool stats: size={}, idle={}, available={}",
        size,
        num_idle,
        size - num_idle
    )
}
