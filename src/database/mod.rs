//! Event persistence on SQLite.
//!
//! Every event is stored once per id. Referenced event ids (`e` tags) and
//! public keys (`p` tags) are written to side tables when the event is first
//! stored, so reverse lookups do not need to scan tag JSON.

pub mod models;
pub mod queries;
pub mod schema;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::Result;
use crate::nostr::event::Event;
use models::SaveOutcome;
use queries::Queries;

#[derive(Clone)]
pub struct EventStore {
    pool: SqlitePool,
}

impl EventStore {
    /// Connect to `database_url`, creating the database file if needed.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(EventStore { pool })
    }

    /// Private in-memory database with the schema already applied.
    pub async fn new_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // Every connection to :memory: is a separate database, so keep exactly one alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = EventStore { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::raw_sql(schema::EVENTS_SCHEMA)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store `event` unless an event with the same id already exists.
    ///
    /// Re-saving an existing id is not an error and leaves the stored row and
    /// its references untouched.
    pub async fn save(&self, event: &Event) -> Result<SaveOutcome> {
        let referenced_events = event.referenced_events();
        let referenced_pubkeys = event.referenced_pubkeys();
        let tags = serde_json::to_string(&event.tags)?;

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events (id, pubkey, created_at, kind, tags, content, sig)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.pubkey)
        .bind(event.created_at)
        .bind(i64::from(event.kind))
        .bind(&tags)
        .bind(&event.content)
        .bind(&event.sig)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            debug!("Event {} already stored", event.id);
            return Ok(SaveOutcome::AlreadyExists);
        }

        for referenced_id in &referenced_events {
            sqlx::query(
                "INSERT OR IGNORE INTO event_references (event_id, referenced_id) VALUES (?, ?)",
            )
            .bind(&event.id)
            .bind(referenced_id)
            .execute(&mut *tx)
            .await?;
        }

        for referenced_pubkey in &referenced_pubkeys {
            sqlx::query(
                "INSERT OR IGNORE INTO pubkey_references (event_id, referenced_pubkey) VALUES (?, ?)",
            )
            .bind(&event.id)
            .bind(referenced_pubkey)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            "Stored event {} ({} event refs, {} pubkey refs)",
            event.id,
            referenced_events.len(),
            referenced_pubkeys.len()
        );
        Ok(SaveOutcome::Stored)
    }

    /// Newest events first, capped at `limit`, optionally only those with
    /// `created_at < before`.
    pub async fn get_feed(&self, limit: u32, before: Option<i64>) -> Result<Vec<Event>> {
        Queries::get_feed(&self.pool, i64::from(limit), before).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Event>> {
        Queries::get_by_id(&self.pool, id).await
    }

    pub async fn get_referencing_event(&self, event_id: &str, limit: u32) -> Result<Vec<Event>> {
        Queries::get_referencing_event(&self.pool, event_id, i64::from(limit)).await
    }

    pub async fn get_mentioning_pubkey(&self, pubkey: &str, limit: u32) -> Result<Vec<Event>> {
        Queries::get_mentioning_pubkey(&self.pool, pubkey, i64::from(limit)).await
    }

    pub async fn get_by_author(&self, pubkey: &str, limit: u32) -> Result<Vec<Event>> {
        Queries::get_by_author(&self.pool, pubkey, i64::from(limit)).await
    }

    pub async fn count(&self) -> Result<i64> {
        Queries::count_events(&self.pool).await
    }
}
