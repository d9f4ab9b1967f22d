//! Adaptive question selection
//!
//! Weighted random sampling without replacement over the catalog: the weight
//! of a question grows with its current difficulty score, so weak spots come
//! up more often, while a non-zero minimum weight keeps mastered questions
//! in rotation.
//!
//! The selector owns the session state (the set of already-presented
//! questions). When the whole catalog has been presented the set resets and
//! selection may repeat, so a session never runs dry.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

use crate::difficulty::DifficultyTracker;
use crate::types::{Catalog, Problem, QuestionId, SelectError, MIN_SELECTION_WEIGHT};

/// Sampling weight for a difficulty score
///
/// Monotonically increasing and strictly positive. The quadratic term
/// separates struggling questions from the neutral bulk hard enough that a
/// question missed a few times dominates the draw.
fn selection_weight(score: f64) -> f64 {
    MIN_SELECTION_WEIGHT + score * score
}

/// Chooses the next question from the catalog, biased by difficulty
///
/// Holds the catalog, the session exclusion set, and a seedable RNG.
/// Weights are recomputed from the live tracker on every draw, so a score
/// change made mid-session affects the very next pick.
pub struct QuestionSelector {
    catalog: Catalog,
    rng: ChaCha8Rng,
    presented: HashSet<QuestionId>,
}

impl QuestionSelector {
    /// Create a selector seeded from the system clock
    pub fn new(catalog: Catalog) -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::with_seed(catalog, seed)
    }

    /// Create a selector with an explicit seed (reproducible sessions, tests)
    pub fn with_seed(catalog: Catalog, seed: u64) -> Self {
        Self {
            catalog,
            rng: ChaCha8Rng::seed_from_u64(seed),
            presented: HashSet::new(),
        }
    }

    /// The catalog this selector draws from
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Draw the next question for the session
    pub fn next(&mut self, difficulty: &DifficultyTracker) -> Result<&Problem, SelectError> {
        self.next_excluding(difficulty, &HashSet::new())
    }

    /// Draw the next question, additionally excluding `excluding`
    ///
    /// Questions already presented this session are excluded as well. If the
    /// session set covers everything that is left, it resets and selection
    /// may repeat; an exclusion set covering the entire catalog likewise
    /// resets rather than failing. Only an empty catalog is an error.
    pub fn next_excluding(
        &mut self,
        difficulty: &DifficultyTracker,
        excluding: &HashSet<QuestionId>,
    ) -> Result<&Problem, SelectError> {
        if self.catalog.is_empty() {
            return Err(SelectError::EmptyCatalog);
        }

        let mut candidates: Vec<usize> = self
            .catalog
            .problems()
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                !self.presented.contains(&p.question_id) && !excluding.contains(&p.question_id)
            })
            .map(|(i, _)| i)
            .collect();

        if candidates.is_empty() {
            // Catalog exhausted for this session: start over.
            log::debug!("session presented all selectable questions, resetting exclusions");
            self.presented.clear();
            candidates = self
                .catalog
                .problems()
                .iter()
                .enumerate()
                .filter(|(_, p)| !excluding.contains(&p.question_id))
                .map(|(i, _)| i)
                .collect();
            if candidates.is_empty() {
                // Caller excluded every question; treat theirs as exhausted too.
                candidates = (0..self.catalog.len()).collect();
            }
        }

        let chosen = self.weighted_draw(&candidates, difficulty);
        let problem = &self.catalog.problems()[chosen];
        self.presented.insert(problem.question_id);
        Ok(problem)
    }

    /// Draw an ordered session of up to `size` questions without replacement
    ///
    /// Shorter than `size` only when the catalog itself is smaller. Starts a
    /// fresh session first so the draw is free of prior exclusions.
    pub fn draw_session(
        &mut self,
        difficulty: &DifficultyTracker,
        size: usize,
    ) -> Result<Vec<Problem>, SelectError> {
        if self.catalog.is_empty() {
            return Err(SelectError::EmptyCatalog);
        }
        self.reset_session();

        let count = size.min(self.catalog.len());
        let mut session = Vec::with_capacity(count);
        for _ in 0..count {
            let problem = self.next(difficulty)?;
            session.push(problem.clone());
        }
        Ok(session)
    }

    /// Forget which questions this session has presented
    pub fn reset_session(&mut self) {
        self.presented.clear();
    }

    /// Cumulative-weight draw over candidate catalog indices
    ///
    /// Weights come from the live tracker, recomputed on every call. With
    /// equal weights this degenerates to a uniform draw, so tied questions
    /// carry no catalog-order bias.
    fn weighted_draw(&mut self, candidates: &[usize], difficulty: &DifficultyTracker) -> usize {
        let weights: Vec<f64> = candidates
            .iter()
            .map(|&i| selection_weight(difficulty.score_for(self.catalog.problems()[i].question_id)))
            .collect();
        let total: f64 = weights.iter().sum();

        let mut target = self.rng.gen::<f64>() * total;
        for (idx, weight) in candidates.iter().zip(&weights) {
            target -= weight;
            if target < 0.0 {
                return *idx;
            }
        }
        // Floating-point slack: the draw landed exactly on the upper bound.
        candidates[candidates.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PersistenceGateway;
    use crate::types::{AnswerRecord, Outcome, ProblemKind};

    fn problem(id: QuestionId) -> Problem {
        Problem {
            question_id: id,
            category: None,
            number_in_sequence: None,
            source_url: None,
            image_url: None,
            kind: ProblemKind::TwoSelection,
            question: format!("question {id}"),
            explanation: format!("explanation {id}"),
            answer: Some(true),
            choices: None,
            answers: None,
        }
    }

    fn catalog(ids: &[QuestionId]) -> Catalog {
        Catalog::new(ids.iter().map(|&id| problem(id)).collect()).unwrap()
    }

    fn neutral_tracker() -> DifficultyTracker {
        DifficultyTracker::load(PersistenceGateway::in_memory(), &[])
    }

    #[test]
    fn test_empty_catalog_reports_nothing_to_practice() {
        let mut selector = QuestionSelector::with_seed(catalog(&[]), 42);
        let tracker = neutral_tracker();
        assert!(matches!(
            selector.next(&tracker),
            Err(SelectError::EmptyCatalog)
        ));
        assert!(matches!(
            selector.draw_session(&tracker, 5),
            Err(SelectError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_single_question_catalog_always_returns_it() {
        let mut selector = QuestionSelector::with_seed(catalog(&[7]), 42);
        let tracker = neutral_tracker();
        for _ in 0..10 {
            assert_eq!(selector.next(&tracker).unwrap().question_id, 7);
        }
    }

    #[test]
    fn test_session_has_no_repeats_until_exhaustion() {
        let ids = [1, 2, 3, 4, 5];
        let mut selector = QuestionSelector::with_seed(catalog(&ids), 42);
        let tracker = neutral_tracker();

        let mut seen = HashSet::new();
        for _ in 0..ids.len() {
            let id = selector.next(&tracker).unwrap().question_id;
            assert!(seen.insert(id), "question {id} repeated within the session");
        }
        assert_eq!(seen.len(), ids.len());

        // Exhausted: the exclusion set resets instead of failing.
        assert!(selector.next(&tracker).is_ok());
    }

    #[test]
    fn test_caller_exclusions_are_respected() {
        let mut selector = QuestionSelector::with_seed(catalog(&[1, 2, 3]), 42);
        let tracker = neutral_tracker();
        let excluding: HashSet<QuestionId> = [1, 2].into_iter().collect();

        for _ in 0..3 {
            let drawn = selector
                .next_excluding(&tracker, &excluding)
                .unwrap()
                .question_id;
            assert_eq!(drawn, 3);
            selector.reset_session();
        }
    }

    #[test]
    fn test_fully_excluded_catalog_still_selects() {
        let mut selector = QuestionSelector::with_seed(catalog(&[1, 2]), 42);
        let tracker = neutral_tracker();
        let excluding: HashSet<QuestionId> = [1, 2].into_iter().collect();

        assert!(selector.next_excluding(&tracker, &excluding).is_ok());
    }

    #[test]
    fn test_draw_session_is_capped_at_catalog_size() {
        let mut selector = QuestionSelector::with_seed(catalog(&[1, 2, 3]), 42);
        let tracker = neutral_tracker();

        let session = selector.draw_session(&tracker, 10).unwrap();
        assert_eq!(session.len(), 3);

        let ids: HashSet<QuestionId> = session.iter().map(|p| p.question_id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_difficult_question_dominates_draws() {
        // Three incorrect answers push B far above neutral A and C.
        let gateway = PersistenceGateway::in_memory();
        let mut tracker = DifficultyTracker::load(gateway, &[]);
        for i in 0..3 {
            tracker.update(&AnswerRecord::new(2, Outcome::Incorrect, i));
        }

        let mut selector = QuestionSelector::with_seed(catalog(&[1, 2, 3]), 42);
        let mut hits = 0;
        for _ in 0..100 {
            if selector.next(&tracker).unwrap().question_id == 2 {
                hits += 1;
            }
            selector.reset_session();
        }

        // Expected share ~64% given weights 95^2 vs 50^2; well above half.
        assert!(hits > 50, "difficult question drawn only {hits}/100 times");
    }

    #[test]
    fn test_tied_weights_draw_uniformly() {
        let mut selector = QuestionSelector::with_seed(catalog(&[1, 2, 3]), 7);
        let tracker = neutral_tracker();

        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            let id = selector.next(&tracker).unwrap().question_id;
            counts[(id - 1) as usize] += 1;
            selector.reset_session();
        }

        for (i, &count) in counts.iter().enumerate() {
            assert!(
                (800..=1200).contains(&count),
                "question {} drawn {count}/3000 times, expected ~1000",
                i + 1
            );
        }
    }

    #[test]
    fn test_floor_scored_question_is_still_reachable() {
        let gateway = PersistenceGateway::in_memory();
        let mut tracker = DifficultyTracker::load(gateway, &[]);
        for i in 0..60 {
            tracker.update(&AnswerRecord::new(1, Outcome::Correct, i));
        }

        let mut selector = QuestionSelector::with_seed(catalog(&[1, 2]), 11);
        let mut floor_hits = 0;
        for _ in 0..20_000 {
            if selector.next(&tracker).unwrap().question_id == 1 {
                floor_hits += 1;
            }
            selector.reset_session();
        }
        assert!(floor_hits > 0, "floor-scored question was never revisited");
    }

    #[test]
    fn test_same_seed_reproduces_the_same_sequence() {
        let tracker = neutral_tracker();
        let ids = [1, 2, 3, 4, 5, 6];

        let mut a = QuestionSelector::with_seed(catalog(&ids), 99);
        let mut b = QuestionSelector::with_seed(catalog(&ids), 99);

        let session_a = a.draw_session(&tracker, 6).unwrap();
        let session_b = b.draw_session(&tracker, 6).unwrap();

        let ids_a: Vec<QuestionId> = session_a.iter().map(|p| p.question_id).collect();
        let ids_b: Vec<QuestionId> = session_b.iter().map(|p| p.question_id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
