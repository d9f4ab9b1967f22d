//! Practice engine facade
//!
//! Wires the record store, difficulty tracker, and selector together behind
//! the four operations the app calls: draw the next question, submit an
//! answer, read a question's standing, and reset progress.
//!
//! `submit` runs the history append and the score update inside one
//! synchronous call, so no later `score_for` or `next` can observe one
//! without the other. `reset` clears both persisted slots the same way.

use crate::difficulty::DifficultyTracker;
use crate::record::RecordStore;
use crate::selector::QuestionSelector;
use crate::stats::PracticeStats;
use crate::storage::PersistenceGateway;
use crate::types::{AnswerRecord, Catalog, DifficultyMap, Outcome, Problem, QuestionId, SelectError};

/// Single-user practice engine over a catalog and a storage gateway
pub struct PracticeEngine {
    records: RecordStore,
    tracker: DifficultyTracker,
    selector: QuestionSelector,
}

impl PracticeEngine {
    /// Load persisted state through `gateway` and start a session
    pub fn new(catalog: Catalog, gateway: PersistenceGateway) -> Self {
        let records = RecordStore::load(gateway.clone());
        let tracker = DifficultyTracker::load(gateway, records.all());
        let selector = QuestionSelector::new(catalog);
        Self {
            records,
            tracker,
            selector,
        }
    }

    /// Like [`new`](Self::new) with a fixed selection seed (reproducible sessions)
    pub fn with_seed(catalog: Catalog, gateway: PersistenceGateway, seed: u64) -> Self {
        let records = RecordStore::load(gateway.clone());
        let tracker = DifficultyTracker::load(gateway, records.all());
        let selector = QuestionSelector::with_seed(catalog, seed);
        Self {
            records,
            tracker,
            selector,
        }
    }

    /// Draw the next question, biased toward current weak spots
    pub fn next(&mut self) -> Result<Problem, SelectError> {
        self.selector.next(&self.tracker).cloned()
    }

    /// Draw an ordered practice sequence of up to `count` questions
    pub fn next_n(&mut self, count: usize) -> Result<Vec<Problem>, SelectError> {
        self.selector.draw_session(&self.tracker, count)
    }

    /// Record an answer and update the question's difficulty
    ///
    /// Returns the appended record. Both the history append and the score
    /// update are visible to any subsequent call, and both slots have been
    /// written (or had their failures logged) by the time this returns.
    pub fn submit(&mut self, question_id: QuestionId, outcome: Outcome) -> AnswerRecord {
        let record = self.records.record_answer(question_id, outcome);
        self.tracker.update(&record);
        record
    }

    /// Current difficulty score for a question (neutral if unanswered)
    pub fn score_for(&self, question_id: QuestionId) -> f64 {
        self.tracker.score_for(question_id)
    }

    /// Read-only snapshot of the difficulty map
    pub fn difficulty_snapshot(&self) -> &DifficultyMap {
        self.tracker.snapshot()
    }

    /// Full answer history, oldest first
    pub fn history(&self) -> &[AnswerRecord] {
        self.records.all()
    }

    /// Aggregate standing derived from the history
    pub fn stats(&self) -> PracticeStats {
        PracticeStats::from_records(self.records.all())
    }

    /// The catalog this engine practices from
    pub fn catalog(&self) -> &Catalog {
        self.selector.catalog()
    }

    /// Learner-initiated progress reset
    ///
    /// Empties the history and the difficulty map together, persists both,
    /// and starts a fresh session.
    pub fn reset(&mut self) {
        self.records.clear();
        self.tracker.reset();
        self.selector.reset_session();
        log::info!("practice progress reset");
    }
}
