//! Dedup keys for importing phrases into storage.

use std::collections::HashSet;

use crate::types::{NewPhrase, Phrase};

/// Identity of a phrase for import purposes: the (german, russian) pair.
///
/// Category and the optional fields are not part of the key, so two entries
/// that differ only in category are the same phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub german: String,
    pub russian: String,
}

impl DedupKey {
    pub fn new(german: impl Into<String>, russian: impl Into<String>) -> Self {
        Self {
            german: german.into(),
            russian: russian.into(),
        }
    }
}

/// Anything that can be compared by dedup key.
pub trait Keyed {
    fn dedup_key(&self) -> DedupKey;
}

impl Keyed for NewPhrase {
    fn dedup_key(&self) -> DedupKey {
        DedupKey::new(self.german.as_str(), self.russian.as_str())
    }
}

impl Keyed for Phrase {
    fn dedup_key(&self) -> DedupKey {
        DedupKey::new(self.german.as_str(), self.russian.as_str())
    }
}

/// Candidates split into the ones to insert and the number skipped.
#[derive(Debug)]
pub struct Filtered<T> {
    pub fresh: Vec<T>,
    pub skipped: usize,
}

/// Keep candidates whose key is neither in `existing` nor already taken by an
/// earlier candidate. Order of the survivors is preserved.
pub fn filter_new<T: Keyed>(candidates: Vec<T>, existing: &HashSet<DedupKey>) -> Filtered<T> {
    let mut seen: HashSet<DedupKey> = HashSet::new();
    let mut fresh = Vec::with_capacity(candidates.len());
    let mut skipped = 0;

    for candidate in candidates {
        let key = candidate.dedup_key();
        if existing.contains(&key) || !seen.insert(key) {
            skipped += 1;
            continue;
        }
        fresh.push(candidate);
    }

    Filtered { fresh, skipped }
}
