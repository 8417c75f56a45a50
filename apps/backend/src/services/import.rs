//! Seed import with dedup against stored phrases.
//!
//! The existing-keys read and the bulk insert are separate steps with no lock
//! between them. Two imports running at once can both see a pair as missing;
//! the unique index on (german, russian) then rejects the second insert. Run it
//! at startup or from the CLI, not from concurrent request handlers.

use std::path::Path;

use chrono::{DateTime, Utc};
use phrase_core::{filter_new, NewPhrase, Phrase};

use crate::db::PhraseStore;
use crate::error::{ApiError, Result};
use crate::models::PhraseInput;

/// Seed set compiled into the binary.
pub const BUNDLED_SEED: &str = include_str!("../../data/initial-phrases.json");

/// Outcome of one import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<Phrase>,
    pub skipped: usize,
}

fn parse_seed(json: &str, source: &str) -> Result<Vec<PhraseInput>> {
    serde_json::from_str(json)
        .map_err(|e| ApiError::BadRequest(format!("invalid seed file {}: {}", source, e)))
}

/// Entries of the bundled seed set.
pub fn bundled_seed() -> Result<Vec<PhraseInput>> {
    parse_seed(BUNDLED_SEED, "initial-phrases.json")
}

/// Entries of a seed file in the same camelCase shape as the bundled one.
pub async fn load_seed_file(path: &Path) -> Result<Vec<PhraseInput>> {
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        ApiError::BadRequest(format!("cannot read seed file {}: {}", path.display(), e))
    })?;
    parse_seed(&json, &path.display().to_string())
}

/// Fill defaults and validate every seed entry. One bad entry rejects the set.
pub fn seed_phrases(entries: Vec<PhraseInput>, now: DateTime<Utc>) -> Result<Vec<NewPhrase>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            entry
                .into_new_phrase(now)
                .map_err(|e| ApiError::BadRequest(format!("invalid seed phrase #{}: {}", i, e)))
        })
        .collect()
}

/// Insert the phrases whose (german, russian) pair is not stored yet.
///
/// Later duplicates inside `phrases` are dropped too. Nothing is written when
/// every pair already exists.
pub async fn smart_import(store: &dyn PhraseStore, phrases: Vec<NewPhrase>) -> Result<ImportReport> {
    let existing = store.existing_keys().await?;
    tracing::info!(existing = existing.len(), "Found stored phrases");

    let filtered = filter_new(phrases, &existing);
    if filtered.fresh.is_empty() {
        tracing::info!(skipped = filtered.skipped, "No new phrases to import");
        return Ok(ImportReport {
            imported: Vec::new(),
            skipped: filtered.skipped,
        });
    }

    tracing::info!(count = filtered.fresh.len(), "Importing new phrases");
    let imported = store.insert_many(&filtered.fresh).await?;
    tracing::info!(
        imported = imported.len(),
        skipped = filtered.skipped,
        "Import complete"
    );

    Ok(ImportReport {
        imported,
        skipped: filtered.skipped,
    })
}

/// Import the bundled seed set.
pub async fn import_bundled(store: &dyn PhraseStore) -> Result<ImportReport> {
    let phrases = seed_phrases(bundled_seed()?, Utc::now())?;
    smart_import(store, phrases).await
}
