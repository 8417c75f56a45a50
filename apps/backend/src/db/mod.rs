//! Phrase storage
//!
//! Handlers and services talk to a [`PhraseStore`]. [`Database`] is the
//! PostgreSQL implementation; [`MemoryStore`] backs tests and runs without
//! `DATABASE_URL`.

mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use phrase_core::types::normalize_optional;
use phrase_core::{DedupKey, MASTERY_KNOW_COUNT, MASTERY_KNOW_STREAK};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

pub use memory::MemoryStore;

/// Column list matching [`DbPhrase`].
pub const PHRASE_COLUMNS: &str = "id, russian, german, transcription, context, category, \
     masterylevel, lastreviewedat, nextreviewat, knowcount, knowstreak, ismastered";

const INSERT_COLUMNS: &str = "INSERT INTO phrases (russian, german, transcription, context, \
     category, masterylevel, lastreviewedat, nextreviewat, knowcount, knowstreak, ismastered) ";

/// Rows per bulk INSERT: 11 binds each must stay under PostgreSQL's 65535.
const MAX_BULK_ROWS: usize = 5000;

/// Persistence for phrases.
///
/// `is_mastered` is never taken from callers: implementations store the value
/// derived from the counters on every insert and update.
#[async_trait]
pub trait PhraseStore: Send + Sync {
    /// All phrases, earliest `next_review_at` first.
    async fn list(&self) -> Result<Vec<Phrase>>;

    async fn get(&self, id: Uuid) -> Result<Option<Phrase>>;

    async fn insert(&self, phrase: &NewPhrase) -> Result<Phrase>;

    /// Insert all or nothing, returning the stored phrases in input order.
    async fn insert_many(&self, phrases: &[NewPhrase]) -> Result<Vec<Phrase>>;

    /// Apply a partial update. `None` if no phrase has this id.
    async fn update(&self, id: Uuid, patch: &PhrasePatch) -> Result<Option<Phrase>>;

    /// `true` if a phrase was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Dedup keys of every stored phrase.
    async fn existing_keys(&self) -> Result<HashSet<DedupKey>>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn into_phrases(rows: Vec<DbPhrase>) -> Result<Vec<Phrase>> {
    rows.into_iter().map(DbPhrase::into_phrase).collect()
}

#[async_trait]
impl PhraseStore for Database {
    async fn list(&self) -> Result<Vec<Phrase>> {
        let rows = sqlx::query_as::<_, DbPhrase>(&format!(
            "SELECT {} FROM phrases ORDER BY nextreviewat, id",
            PHRASE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        into_phrases(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Phrase>> {
        let row = sqlx::query_as::<_, DbPhrase>(&format!(
            "SELECT {} FROM phrases WHERE id = $1",
            PHRASE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DbPhrase::into_phrase).transpose()
    }

    async fn insert(&self, phrase: &NewPhrase) -> Result<Phrase> {
        let row = DbNewPhrase::from_new(phrase)?;
        let stored = sqlx::query_as::<_, DbPhrase>(&format!(
            r#"
            {}
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            INSERT_COLUMNS, PHRASE_COLUMNS
        ))
        .bind(row.russian)
        .bind(row.german)
        .bind(row.transcription)
        .bind(row.context)
        .bind(row.category)
        .bind(row.mastery_level)
        .bind(row.last_reviewed_at)
        .bind(row.next_review_at)
        .bind(row.know_count)
        .bind(row.know_streak)
        .bind(row.is_mastered)
        .fetch_one(&self.pool)
        .await?;

        stored.into_phrase()
    }

    async fn insert_many(&self, phrases: &[NewPhrase]) -> Result<Vec<Phrase>> {
        if phrases.is_empty() {
            return Ok(Vec::new());
        }

        if phrases.len() > MAX_BULK_ROWS {
            return Err(ApiError::BadRequest(format!(
                "cannot insert {} phrases at once (limit {})",
                phrases.len(),
                MAX_BULK_ROWS
            )));
        }

        let rows = phrases
            .iter()
            .map(DbNewPhrase::from_new)
            .collect::<Result<Vec<_>>>()?;

        let mut query = QueryBuilder::<Postgres>::new(INSERT_COLUMNS);
        query.push_values(rows, |mut b, row| {
            b.push_bind(row.russian)
                .push_bind(row.german)
                .push_bind(row.transcription)
                .push_bind(row.context)
                .push_bind(row.category)
                .push_bind(row.mastery_level)
                .push_bind(row.last_reviewed_at)
                .push_bind(row.next_review_at)
                .push_bind(row.know_count)
                .push_bind(row.know_streak)
                .push_bind(row.is_mastered);
        });
        query.push(" RETURNING ").push(PHRASE_COLUMNS);

        let inserted = query
            .build_query_as::<DbPhrase>()
            .fetch_all(&self.pool)
            .await?;

        into_phrases(inserted)
    }

    async fn update(&self, id: Uuid, patch: &PhrasePatch) -> Result<Option<Phrase>> {
        let know_count = patch
            .know_count
            .map(|v| to_column("knowCount", v))
            .transpose()?;
        let know_streak = patch
            .know_streak
            .map(|v| to_column("knowStreak", v))
            .transpose()?;
        let mastery_level = patch
            .mastery_level
            .map(|v| to_column("masteryLevel", v))
            .transpose()?;

        let mut query = QueryBuilder::<Postgres>::new("UPDATE phrases SET ");
        {
            let mut set = query.separated(", ");

            if let Some(russian) = &patch.russian {
                set.push("russian = ").push_bind_unseparated(russian.clone());
            }
            if let Some(german) = &patch.german {
                set.push("german = ").push_bind_unseparated(german.clone());
            }
            if let Some(transcription) = &patch.transcription {
                set.push("transcription = ")
                    .push_bind_unseparated(normalize_optional(transcription.clone()));
            }
            if let Some(context) = &patch.context {
                set.push("context = ")
                    .push_bind_unseparated(normalize_optional(context.clone()));
            }
            if let Some(category) = patch.category {
                set.push("category = ").push_bind_unseparated(category.as_str());
            }
            if let Some(level) = mastery_level {
                set.push("masterylevel = ").push_bind_unseparated(level);
            }
            if let Some(last_reviewed_at) = patch.last_reviewed_at {
                set.push("lastreviewedat = ")
                    .push_bind_unseparated(last_reviewed_at);
            }
            if let Some(next_review_at) = patch.next_review_at {
                set.push("nextreviewat = ").push_bind_unseparated(next_review_at);
            }
            if let Some(count) = know_count {
                set.push("knowcount = ").push_bind_unseparated(count);
            }
            if let Some(streak) = know_streak {
                set.push("knowstreak = ").push_bind_unseparated(streak);
            }

            // SET expressions see the old row, so use the new counters when given.
            set.push("ismastered = (");
            match know_count {
                Some(count) => set.push_bind_unseparated(count),
                None => set.push_unseparated("knowcount"),
            };
            set.push_unseparated(" >= ")
                .push_bind_unseparated(MASTERY_KNOW_COUNT as i32)
                .push_unseparated(" OR ");
            match know_streak {
                Some(streak) => set.push_bind_unseparated(streak),
                None => set.push_unseparated("knowstreak"),
            };
            set.push_unseparated(" >= ")
                .push_bind_unseparated(MASTERY_KNOW_STREAK as i32)
                .push_unseparated(")");
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(PHRASE_COLUMNS);

        let row = query
            .build_query_as::<DbPhrase>()
            .fetch_optional(&self.pool)
            .await?;

        row.map(DbPhrase::into_phrase).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM phrases
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn existing_keys(&self) -> Result<HashSet<DedupKey>> {
        let pairs = sqlx::query_as::<_, (String, String)>("SELECT german, russian FROM phrases")
            .fetch_all(&self.pool)
            .await?;

        Ok(pairs
            .into_iter()
            .map(|(german, russian)| DedupKey::new(german, russian))
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
