//! Per-question difficulty tracking
//!
//! Folds the answer history into a [`DifficultyMap`]: questions missed or
//! marked "don't know" climb, questions answered correctly decay toward the
//! floor. The map is a running accumulator over the append-only log, so a
//! single fold step per new record keeps it current; a full replay of the
//! log reproduces it exactly.
//!
//! Scoring constants live in [`crate::types`] and are configuration, not
//! derived values.

use crate::storage::{PersistenceGateway, DIFFICULTY_MAP_KEY};
use crate::types::{
    AnswerRecord, DifficultyMap, Outcome, QuestionId, CORRECT_DECAY, DIFFICULTY_CEILING,
    DIFFICULTY_FLOOR, DIFFICULTY_NEUTRAL, INCORRECT_INCREMENT, UNKNOWN_INCREMENT,
};

/// One fold step: the score after applying `outcome` to `current`
///
/// Increments are additive and clamped at the ceiling; correct answers
/// remove a fixed fraction of the distance to the floor, which approaches
/// the floor asymptotically and can never undershoot it.
fn apply_outcome(current: f64, outcome: Outcome) -> f64 {
    match outcome {
        Outcome::Incorrect => (current + INCORRECT_INCREMENT).min(DIFFICULTY_CEILING),
        Outcome::Unknown => (current + UNKNOWN_INCREMENT).min(DIFFICULTY_CEILING),
        Outcome::Correct => {
            let decayed = current - (current - DIFFICULTY_FLOOR) * CORRECT_DECAY;
            decayed.max(DIFFICULTY_FLOOR)
        }
    }
}

/// Maintains the difficulty map over the answer history
///
/// Exclusively owns the map; other components read scores through
/// [`score_for`](DifficultyTracker::score_for) or a
/// [`snapshot`](DifficultyTracker::snapshot). Every mutation writes the map
/// through the gateway into the `driving_license_difficulty_map` slot.
pub struct DifficultyTracker {
    map: DifficultyMap,
    gateway: PersistenceGateway,
}

impl DifficultyTracker {
    /// Load the map from its slot, rebuilding from history when it is lost
    ///
    /// A missing or corrupted map slot loads as empty. If the history log is
    /// non-empty at that point, the log is authoritative and the map is
    /// reconstructed from it and persisted.
    pub fn load(gateway: PersistenceGateway, history: &[AnswerRecord]) -> Self {
        let map: DifficultyMap = gateway.load(DIFFICULTY_MAP_KEY, DifficultyMap::new());
        let mut tracker = Self { map, gateway };

        if tracker.map.is_empty() && !history.is_empty() {
            log::warn!(
                "difficulty map missing with {} history records, rebuilding from history",
                history.len()
            );
            tracker.rebuild_from_history(history);
        }
        tracker
    }

    /// Current score for a question, neutral if it has never been answered
    ///
    /// This is the single place the absent-key default is materialized.
    pub fn score_for(&self, question_id: QuestionId) -> f64 {
        self.map
            .get(&question_id)
            .copied()
            .unwrap_or(DIFFICULTY_NEUTRAL)
    }

    /// Apply one new record and persist the map
    ///
    /// Called once per appended record, in record order. The change is
    /// synchronous: the next `score_for` call sees it.
    pub fn update(&mut self, record: &AnswerRecord) {
        let current = self.score_for(record.question_id);
        let next = apply_outcome(current, record.outcome());
        self.map.insert(record.question_id, next);
        self.gateway.save(DIFFICULTY_MAP_KEY, &self.map);
    }

    /// Recompute the map from scratch by folding over the full history
    ///
    /// Used when the persisted map is lost or untrusted while the log is
    /// valid. Produces exactly the map incremental updates would have.
    pub fn rebuild_from_history(&mut self, records: &[AnswerRecord]) {
        let mut map = DifficultyMap::new();
        for record in records {
            let current = map
                .get(&record.question_id)
                .copied()
                .unwrap_or(DIFFICULTY_NEUTRAL);
            map.insert(record.question_id, apply_outcome(current, record.outcome()));
        }
        self.map = map;
        self.gateway.save(DIFFICULTY_MAP_KEY, &self.map);
    }

    /// Read-only view of the current map
    pub fn snapshot(&self) -> &DifficultyMap {
        &self.map
    }

    /// Empty the map and persist immediately (learner-initiated reset)
    pub fn reset(&mut self) {
        self.map.clear();
        self.gateway.save(DIFFICULTY_MAP_KEY, &self.map);
        log::debug!("difficulty map reset");
    }
}
