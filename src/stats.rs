//! Practice statistics
//!
//! Aggregates the answer history into the figures the app's standing view
//! shows. Everything here is a pure fold over [`RecordStore::all`]
//! (see [`crate::record::RecordStore`]); no extra state is persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{AnswerRecord, Outcome, QuestionId};

/// Per-question attempt breakdown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionStats {
    /// Total attempts on this question
    pub attempts: u32,
    /// Attempts answered correctly
    pub correct: u32,
    /// Attempts answered incorrectly
    pub incorrect: u32,
    /// Attempts the learner declined to judge
    pub unknown: u32,
    /// Timestamp of the most recent attempt (ms since epoch)
    pub last_answered: i64,
}

/// Overall practice standing derived from the full history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PracticeStats {
    /// Total answered questions, including repeats
    pub total_answers: u32,
    /// Correct answers
    pub correct_answers: u32,
    /// Incorrect answers
    pub incorrect_answers: u32,
    /// Explicit "don't know" answers
    pub unknown_answers: u32,
    /// Correct answers over total answers (0-1), 0 with no history
    pub accuracy: f64,
    /// Number of distinct questions attempted at least once
    pub distinct_questions: u32,
    /// Breakdown per question
    pub per_question: HashMap<QuestionId, QuestionStats>,
}

impl PracticeStats {
    /// Fold the ordered history into aggregate figures
    pub fn from_records(records: &[AnswerRecord]) -> Self {
        let mut stats = PracticeStats::default();

        for record in records {
            stats.total_answers += 1;
            let question = stats.per_question.entry(record.question_id).or_default();
            question.attempts += 1;
            question.last_answered = question.last_answered.max(record.timestamp);

            match record.outcome() {
                Outcome::Correct => {
                    stats.correct_answers += 1;
                    question.correct += 1;
                }
                Outcome::Incorrect => {
                    stats.incorrect_answers += 1;
                    question.incorrect += 1;
                }
                Outcome::Unknown => {
                    stats.unknown_answers += 1;
                    question.unknown += 1;
                }
            }
        }

        stats.distinct_questions = stats.per_question.len() as u32;
        if stats.total_answers > 0 {
            stats.accuracy = f64::from(stats.correct_answers) / f64::from(stats.total_answers);
        }
        stats
    }
}
