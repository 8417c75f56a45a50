//! Core phrase library shared by the backend service and its tooling.
//!
//! Provides:
//! - Phrase entity model and partial updates
//! - Mastery rules and review outcomes
//! - Dedup keys for seed/generated imports
//! - Parser for generated phrase batches
//! - Millisecond-epoch timestamp conversion

pub mod dedup;
pub mod error;
pub mod mastery;
pub mod parser;
pub mod time;
pub mod types;

pub use dedup::{filter_new, DedupKey, Filtered, Keyed};
pub use error::{PhraseError, Result};
pub use mastery::{is_mastered, review_patch, MASTERY_KNOW_COUNT, MASTERY_KNOW_STREAK};
pub use parser::{parse_generated, GeneratedPhrase};
pub use types::{Category, NewPhrase, Phrase, PhrasePatch, ReviewOutcome};
