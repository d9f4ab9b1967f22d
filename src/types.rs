//! Common Types and Constants
//!
//! Shared data structures used across all engine modules, plus the scoring
//! and selection constants. The serialized shapes match the catalog and
//! storage documents the surrounding app reads and writes, so every struct
//! here carries its exact wire format.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==================== Identifiers ====================

/// Stable catalog identifier for a question
pub type QuestionId = u32;

/// Mapping from question id to difficulty score
///
/// Keys appear lazily: a question with no recorded answers has no entry and
/// reads as [`DIFFICULTY_NEUTRAL`]. Serialized as a JSON object with
/// string-encoded keys (serde_json's integer-key behavior), matching the
/// persisted shape of the app's difficulty slot.
pub type DifficultyMap = HashMap<QuestionId, f64>;

// ==================== Constants ====================

/// Lowest difficulty score a question can reach
pub const DIFFICULTY_FLOOR: f64 = 0.0;

/// Highest difficulty score a question can reach
pub const DIFFICULTY_CEILING: f64 = 100.0;

/// Score assumed for questions with no answer history
pub const DIFFICULTY_NEUTRAL: f64 = 50.0;

/// Score increase for an incorrect answer
pub const INCORRECT_INCREMENT: f64 = 15.0;

/// Score increase for an explicit "don't know" answer
///
/// Smaller than [`INCORRECT_INCREMENT`]: declining to judge is weaker
/// evidence of weakness than getting the question wrong.
pub const UNKNOWN_INCREMENT: f64 = 8.0;

/// Fraction of the distance to the floor removed per correct answer
///
/// Correct answers decay the score multiplicatively toward the floor, so
/// consecutive correct answers approach it asymptotically instead of
/// stepping past it.
pub const CORRECT_DECAY: f64 = 0.5;

/// Minimum sampling weight for any selectable question
///
/// Keeps questions at the difficulty floor selectable; without it a fully
/// mastered question would never come back around.
pub const MIN_SELECTION_WEIGHT: f64 = 1.0;

// ==================== Problem Catalog ====================

/// Question format tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProblemKind {
    /// True/false style question with a single boolean answer
    TwoSelection,
    /// Question with a list of choices and parallel correctness flags
    MultipleChoice,
}

/// One entry of the static question catalog
///
/// Supplied externally as a read-only JSON document; the engine validates
/// entries but never mutates them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    /// Unique, stable question identifier
    pub question_id: QuestionId,
    /// Topic category, if the catalog provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Position within the source exam sheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_in_sequence: Option<u32>,
    /// Where the question was taken from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Illustration for the question, if any
    #[serde(default)]
    pub image_url: Option<String>,
    /// Question format
    #[serde(rename = "type")]
    pub kind: ProblemKind,
    /// Prompt text
    pub question: String,
    /// Explanation shown after answering
    pub explanation: String,
    /// Correct answer for [`ProblemKind::TwoSelection`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<bool>,
    /// Choice texts for [`ProblemKind::MultipleChoice`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    /// Correctness flag per choice, parallel to `choices`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<bool>>,
}

impl Problem {
    /// Check the per-kind shape invariant
    ///
    /// Two-selection problems carry a single boolean answer and no choice
    /// lists; multiple-choice problems carry parallel `choices`/`answers`
    /// lists of equal length >= 2.
    pub fn validate(&self) -> Result<(), CatalogError> {
        match self.kind {
            ProblemKind::TwoSelection => {
                if self.answer.is_none() {
                    return Err(CatalogError::InvalidProblem {
                        question_id: self.question_id,
                        reason: "two-selection problem is missing its boolean answer".into(),
                    });
                }
                if self.choices.is_some() || self.answers.is_some() {
                    return Err(CatalogError::InvalidProblem {
                        question_id: self.question_id,
                        reason: "two-selection problem must not carry choice lists".into(),
                    });
                }
            }
            ProblemKind::MultipleChoice => {
                let choices = self.choices.as_ref().ok_or_else(|| CatalogError::InvalidProblem {
                    question_id: self.question_id,
                    reason: "multiple-choice problem is missing its choices".into(),
                })?;
                let answers = self.answers.as_ref().ok_or_else(|| CatalogError::InvalidProblem {
                    question_id: self.question_id,
                    reason: "multiple-choice problem is missing its answer flags".into(),
                })?;
                if choices.len() != answers.len() {
                    return Err(CatalogError::InvalidProblem {
                        question_id: self.question_id,
                        reason: format!(
                            "choices ({}) and answers ({}) differ in length",
                            choices.len(),
                            answers.len()
                        ),
                    });
                }
                if choices.len() < 2 {
                    return Err(CatalogError::InvalidProblem {
                        question_id: self.question_id,
                        reason: "multiple-choice problem needs at least 2 choices".into(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Catalog loading/validation errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to parse catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid problem {question_id}: {reason}")]
    InvalidProblem { question_id: QuestionId, reason: String },

    #[error("duplicate question id {0} in catalog")]
    DuplicateId(QuestionId),

    #[error("failed to read catalog document: {0}")]
    Io(#[from] std::io::Error),
}

/// The static, externally supplied question catalog
///
/// Loaded once at session start by the surrounding app and handed to the
/// selector. Immutable after construction.
#[derive(Clone, Debug)]
pub struct Catalog {
    problems: Vec<Problem>,
}

impl Catalog {
    /// Build a catalog from already-parsed problems, validating each entry
    pub fn new(problems: Vec<Problem>) -> Result<Self, CatalogError> {
        let mut seen = std::collections::HashSet::with_capacity(problems.len());
        for problem in &problems {
            problem.validate()?;
            if !seen.insert(problem.question_id) {
                return Err(CatalogError::DuplicateId(problem.question_id));
            }
        }
        Ok(Self { problems })
    }

    /// Parse a catalog from a JSON array document
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let problems: Vec<Problem> = serde_json::from_str(json)?;
        Self::new(problems)
    }

    /// Parse a catalog from a reader over a JSON array document
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, CatalogError> {
        let problems: Vec<Problem> = serde_json::from_reader(reader)?;
        Self::new(problems)
    }

    /// Look up a problem by id
    pub fn get(&self, question_id: QuestionId) -> Option<&Problem> {
        self.problems.iter().find(|p| p.question_id == question_id)
    }

    /// All problems, in catalog order
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

// ==================== Answer History ====================

/// Tri-state answer outcome
///
/// `Unknown` means the learner explicitly declined to judge themselves,
/// distinct from answering incorrectly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    Unknown,
}

impl Outcome {
    /// Wire representation: `true` / `false` / `null`
    pub fn to_wire(self) -> Option<bool> {
        match self {
            Outcome::Correct => Some(true),
            Outcome::Incorrect => Some(false),
            Outcome::Unknown => None,
        }
    }

    /// Decode the wire representation
    pub fn from_wire(is_correct: Option<bool>) -> Self {
        match is_correct {
            Some(true) => Outcome::Correct,
            Some(false) => Outcome::Incorrect,
            None => Outcome::Unknown,
        }
    }
}

/// One answered question, immutable once created
///
/// Serialized as `{"questionId": .., "isCorrect": true|false|null,
/// "timestamp": ..}` — the shape of the persisted history slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    /// The question this record answers
    pub question_id: QuestionId,
    /// `true` correct, `false` incorrect, `null` declined to judge
    pub is_correct: Option<bool>,
    /// Milliseconds since the Unix epoch; non-decreasing within the log
    pub timestamp: i64,
}

impl AnswerRecord {
    /// Create a record for an outcome at an explicit timestamp
    pub fn new(question_id: QuestionId, outcome: Outcome, timestamp: i64) -> Self {
        Self {
            question_id,
            is_correct: outcome.to_wire(),
            timestamp,
        }
    }

    /// The record's outcome as a tri-state value
    pub fn outcome(&self) -> Outcome {
        Outcome::from_wire(self.is_correct)
    }
}

// ==================== Engine Errors ====================

/// Errors surfaced by the selection path
///
/// Storage failures never appear here; they degrade to defaults inside the
/// gateway (see [`crate::storage`]).
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// The catalog contains no questions: nothing to practice
    #[error("the question catalog is empty")]
    EmptyCatalog,
}

// ==================== Tests ====================
