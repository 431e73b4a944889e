use sqlx::SqlitePool;

use crate::database::models::StoredEvent;
use crate::error::Result;
use crate::nostr::event::Event;

const EVENT_COLUMNS: &str = "id, pubkey, created_at, kind, tags, content, sig";

pub struct Queries;

impl Queries {
    /// Newest events first, optionally only those created before `before`.
    pub async fn get_feed(pool: &SqlitePool, limit: i64, before: Option<i64>) -> Result<Vec<Event>> {
        let rows = match before {
            Some(before) => {
                sqlx::query_as::<_, StoredEvent>(&format!(
                    r#"
                    SELECT {EVENT_COLUMNS}
                    FROM events
                    WHERE created_at < ?
                    ORDER BY created_at DESC, id ASC
                    LIMIT ?
                    "#
                ))
                .bind(before)
                .bind(limit)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, StoredEvent>(&format!(
                    r#"
                    SELECT {EVENT_COLUMNS}
                    FROM events
                    ORDER BY created_at DESC, id ASC
                    LIMIT ?
                    "#
                ))
                .bind(limit)
                .fetch_all(pool)
                .await?
            }
        };

        rows.into_iter().map(StoredEvent::into_event).collect()
    }

    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, StoredEvent>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(StoredEvent::into_event).transpose()
    }

    /// Events whose `e` tags point at `event_id`, newest first.
    pub async fn get_referencing_event(
        pool: &SqlitePool,
        event_id: &str,
        limit: i64,
    ) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, StoredEvent>(
            r#"
            SELECT e.id, e.pubkey, e.created_at, e.kind, e.tags, e.content, e.sig
            FROM events e
            JOIN event_references r ON r.event_id = e.id
            WHERE r.referenced_id = ?
            ORDER BY e.created_at DESC, e.id ASC
            LIMIT ?
            "#,
        )
        .bind(event_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(StoredEvent::into_event).collect()
    }

    /// Events whose `p` tags mention `pubkey`, newest first.
    pub async fn get_mentioning_pubkey(
        pool: &SqlitePool,
        pubkey: &str,
        limit: i64,
    ) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, StoredEvent>(
            r#"
            SELECT e.id, e.pubkey, e.created_at, e.kind, e.tags, e.content, e.sig
            FROM events e
            JOIN pubkey_references r ON r.event_id = e.id
            WHERE r.referenced_pubkey = ?
            ORDER BY e.created_at DESC, e.id ASC
            LIMIT ?
            "#,
        )
        .bind(pubkey)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(StoredEvent::into_event).collect()
    }

    /// Events authored by `pubkey`, newest first.
    pub async fn get_by_author(pool: &SqlitePool, pubkey: &str, limit: i64) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, StoredEvent>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE pubkey = ?
            ORDER BY created_at DESC, id ASC
            LIMIT ?
            "#
        ))
        .bind(pubkey)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(StoredEvent::into_event).collect()
    }

    pub async fn count_events(pool: &SqlitePool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
