//! Mastery rules and review outcomes.
//!
//! A phrase counts as mastered once it has been known three times in total or
//! twice in a row. The flag is always derived from the counters; nothing
//! stores it independently.

use chrono::{DateTime, Utc};

use crate::types::{Phrase, PhrasePatch, ReviewOutcome};

/// Total "known" answers after which a phrase is mastered.
pub const MASTERY_KNOW_COUNT: u32 = 3;

/// Consecutive "known" answers after which a phrase is mastered.
pub const MASTERY_KNOW_STREAK: u32 = 2;

pub fn is_mastered(know_count: u32, know_streak: u32) -> bool {
    know_count >= MASTERY_KNOW_COUNT || know_streak >= MASTERY_KNOW_STREAK
}

/// Build the partial update that records one review of `phrase`.
///
/// A known answer bumps the mastery level, total and streak; an unknown answer
/// resets the streak. Both stamp `last_reviewed_at`. The next review time is
/// left for the caller to schedule.
pub fn review_patch(phrase: &Phrase, outcome: ReviewOutcome, now: DateTime<Utc>) -> PhrasePatch {
    let mut patch = PhrasePatch {
        last_reviewed_at: Some(Some(now)),
        ..Default::default()
    };

    match outcome {
        ReviewOutcome::Known => {
            patch.mastery_level = Some(phrase.mastery_level.saturating_add(1));
            patch.know_count = Some(phrase.know_count.saturating_add(1));
            patch.know_streak = Some(phrase.know_streak.saturating_add(1));
        }
        ReviewOutcome::Unknown => {
            patch.know_streak = Some(0);
        }
    }

    patch
}
