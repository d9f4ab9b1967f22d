//! # menkyo-core - Adaptive driving-license quiz engine
//!
//! Pure-Rust core for a self-study quiz app. The surrounding UI renders
//! questions and screens; this crate owns everything with algorithmic
//! content:
//!
//! - **RecordStore** - append-only log of answer events
//! - **DifficultyTracker** - per-question difficulty scores folded from the log
//! - **QuestionSelector** - difficulty-weighted sampling without replacement
//! - **PersistenceGateway** - durable key-value slots behind a swappable backend
//! - **PracticeEngine** - facade exposing the four operations the app calls
//!
//! ## Design goals
//!
//! - **Offline-first** - all state lives in the local store; no network
//! - **Never fatal** - corrupted or unwritable storage degrades to safe
//!   defaults with a logged diagnostic, never a crashed session
//! - **Deterministic when asked** - selection accepts an explicit seed so
//!   sessions and tests reproduce exactly
//!
//! ## Module structure
//!
//! - [`types`] - catalog/history data model, wire formats, scoring constants
//! - [`storage`] - persistence gateway and storage backends
//! - [`record`] - answer history store
//! - [`difficulty`] - difficulty score tracking
//! - [`selector`] - weighted question selection
//! - [`stats`] - standing figures derived from the history
//! - [`engine`] - the practice engine facade
//!
//! ## Usage example
//!
//! ```rust
//! use menkyo_core::{Catalog, Outcome, PersistenceGateway, PracticeEngine};
//!
//! let catalog = Catalog::from_json_str(
//!     r#"[{
//!         "questionId": 1,
//!         "imageUrl": null,
//!         "type": "twoSelection",
//!         "question": "You may park within 5 m of a crossing.",
//!         "explanation": "Parking that close is prohibited.",
//!         "answer": false
//!     }]"#,
//! )
//! .unwrap();
//!
//! let mut engine = PracticeEngine::new(catalog, PersistenceGateway::in_memory());
//! let question = engine.next().unwrap();
//! engine.submit(question.question_id, Outcome::Incorrect);
//! assert!(engine.score_for(question.question_id) > 50.0);
//! ```

// ============================================================================
// Module declarations
// ============================================================================

pub mod difficulty;
pub mod engine;
pub mod record;
pub mod selector;
pub mod stats;
pub mod storage;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

/// Re-export the shared data model
pub use types::{
    AnswerRecord, Catalog, CatalogError, DifficultyMap, Outcome, Problem, ProblemKind, QuestionId,
    SelectError,
};

/// Re-export the storage layer
pub use storage::{
    MemoryBackend, PersistenceGateway, SqliteBackend, StorageBackend, StorageError, StorageResult,
    ANSWER_HISTORY_KEY, DIFFICULTY_MAP_KEY,
};

/// Re-export the engine components
pub use difficulty::DifficultyTracker;
pub use engine::PracticeEngine;
pub use record::RecordStore;
pub use selector::QuestionSelector;
pub use stats::{PracticeStats, QuestionStats};
