//! In-process phrase store.

use std::collections::HashSet;

use async_trait::async_trait;
use phrase_core::{DedupKey, Keyed};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::PhraseStore;
use crate::error::{ApiError, Result};
use crate::models::*;

const DUPLICATE_PAIR: &str =
    "duplicate key value violates unique constraint \"phrases_german_russian_key\"";

/// Phrases held in memory, with the same (german, russian) uniqueness rule as
/// the `phrases` table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    phrases: RwLock<Vec<Phrase>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate() -> ApiError {
    ApiError::Storage(DUPLICATE_PAIR.to_string())
}

#[async_trait]
impl PhraseStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Phrase>> {
        let mut phrases = self.phrases.read().await.clone();
        phrases.sort_by_key(|p| p.next_review_at);
        Ok(phrases)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Phrase>> {
        let phrases = self.phrases.read().await;
        Ok(phrases.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, phrase: &NewPhrase) -> Result<Phrase> {
        let mut stored = self.insert_many(std::slice::from_ref(phrase)).await?;
        stored
            .pop()
            .ok_or_else(|| ApiError::Internal("insert returned no row".to_string()))
    }

    async fn insert_many(&self, phrases: &[NewPhrase]) -> Result<Vec<Phrase>> {
        let mut table = self.phrases.write().await;

        let mut keys: HashSet<DedupKey> = table.iter().map(Keyed::dedup_key).collect();
        for phrase in phrases {
            phrase
                .validate()
                .map_err(|e| ApiError::Storage(e.to_string()))?;
            if !keys.insert(phrase.dedup_key()) {
                return Err(duplicate());
            }
        }

        let stored: Vec<Phrase> = phrases
            .iter()
            .cloned()
            .map(|p| p.into_phrase(Uuid::new_v4()))
            .collect();
        table.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(&self, id: Uuid, patch: &PhrasePatch) -> Result<Option<Phrase>> {
        let mut table = self.phrases.write().await;

        let Some(index) = table.iter().position(|p| p.id == id) else {
            return Ok(None);
        };

        let mut updated = table[index].clone();
        updated.apply_patch(patch);

        let key = updated.dedup_key();
        let clash = table
            .iter()
            .any(|p| p.id != id && p.dedup_key() == key);
        if clash {
            return Err(duplicate());
        }

        table[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut table = self.phrases.write().await;
        let before = table.len();
        table.retain(|p| p.id != id);
        Ok(table.len() < before)
    }

    async fn existing_keys(&self) -> Result<HashSet<DedupKey>> {
        let table = self.phrases.read().await;
        Ok(table.iter().map(Keyed::dedup_key).collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
