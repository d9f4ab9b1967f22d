//! Answer history store
//!
//! Append-only log of [`AnswerRecord`]s backed by the
//! `driving_license_answer_history` slot. Records are immutable once
//! appended; the only way the log shrinks is an explicit learner reset.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::storage::{PersistenceGateway, ANSWER_HISTORY_KEY};
use crate::types::{AnswerRecord, Outcome, QuestionId};

/// Current time in milliseconds since the Unix epoch
fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Append-only answer history
///
/// Holds the full log in memory and writes it through the gateway after
/// every mutation. If the persisted log cannot be parsed on load, the
/// gateway discards it and the store starts empty rather than failing the
/// session.
pub struct RecordStore {
    records: Vec<AnswerRecord>,
    gateway: PersistenceGateway,
}

impl RecordStore {
    /// Load the history from its slot, empty if missing or corrupted
    pub fn load(gateway: PersistenceGateway) -> Self {
        let records: Vec<AnswerRecord> = gateway.load(ANSWER_HISTORY_KEY, Vec::new());
        log::debug!("loaded answer history with {} records", records.len());
        Self { records, gateway }
    }

    /// Append one record and persist the log
    ///
    /// Timestamps are kept non-decreasing: a record stamped earlier than the
    /// tail of the log (a clock that jumped backwards) is clamped to the
    /// tail's timestamp.
    pub fn append(&mut self, mut record: AnswerRecord) {
        if let Some(last) = self.records.last() {
            if record.timestamp < last.timestamp {
                record.timestamp = last.timestamp;
            }
        }
        self.records.push(record);
        self.gateway.save(ANSWER_HISTORY_KEY, &self.records);
    }

    /// Create, append, and return a record for an outcome stamped "now"
    pub fn record_answer(&mut self, question_id: QuestionId, outcome: Outcome) -> AnswerRecord {
        let mut timestamp = now_ms();
        if let Some(last) = self.records.last() {
            timestamp = timestamp.max(last.timestamp);
        }
        let record = AnswerRecord::new(question_id, outcome, timestamp);
        self.append(record.clone());
        record
    }

    /// Full ordered history, oldest first
    pub fn all(&self) -> &[AnswerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Empty the log and persist immediately
    ///
    /// Only used by the learner-initiated progress reset.
    pub fn clear(&mut self) {
        self.records.clear();
        self.gateway.save(ANSWER_HISTORY_KEY, &self.records);
        log::debug!("answer history cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PersistenceGateway;

    #[test]
    fn test_append_and_read_back_in_order() {
        let gateway = PersistenceGateway::in_memory();
        let mut store = RecordStore::load(gateway);

        store.append(AnswerRecord::new(1, Outcome::Correct, 100));
        store.append(AnswerRecord::new(2, Outcome::Incorrect, 200));
        store.append(AnswerRecord::new(1, Outcome::Unknown, 300));

        let all = store.all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].question_id, 1);
        assert_eq!(all[1].question_id, 2);
        assert_eq!(all[2].outcome(), Outcome::Unknown);
    }

    #[test]
    fn test_persists_across_reload() {
        let gateway = PersistenceGateway::in_memory();

        let mut store = RecordStore::load(gateway.clone());
        store.append(AnswerRecord::new(5, Outcome::Incorrect, 100));
        drop(store);

        let reloaded = RecordStore::load(gateway);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.all()[0].question_id, 5);
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let gateway = PersistenceGateway::in_memory();
        let mut store = RecordStore::load(gateway.clone());
        store.append(AnswerRecord::new(1, Outcome::Unknown, 100));
        store.append(AnswerRecord::new(2, Outcome::Correct, 200));

        let raw_before = gateway.get_raw(crate::storage::ANSWER_HISTORY_KEY).unwrap();

        let reloaded = RecordStore::load(gateway.clone());
        gateway.save(crate::storage::ANSWER_HISTORY_KEY, &reloaded.all().to_vec());
        let raw_after = gateway.get_raw(crate::storage::ANSWER_HISTORY_KEY).unwrap();

        assert_eq!(raw_before, raw_after);
    }

    #[test]
    fn test_backwards_clock_is_clamped() {
        let gateway = PersistenceGateway::in_memory();
        let mut store = RecordStore::load(gateway);

        store.append(AnswerRecord::new(1, Outcome::Correct, 500));
        store.append(AnswerRecord::new(2, Outcome::Correct, 300));

        let all = store.all();
        assert_eq!(all[1].timestamp, 500);
    }

    #[test]
    fn test_record_answer_stamps_current_time() {
        let gateway = PersistenceGateway::in_memory();
        let mut store = RecordStore::load(gateway);

        let before = now_ms();
        let record = store.record_answer(9, Outcome::Correct);
        let after = now_ms();

        assert_eq!(record.question_id, 9);
        assert!(record.timestamp >= before && record.timestamp <= after);
    }

    #[test]
    fn test_clear_empties_log_and_slot() {
        let gateway = PersistenceGateway::in_memory();
        let mut store = RecordStore::load(gateway.clone());
        store.append(AnswerRecord::new(1, Outcome::Correct, 100));

        store.clear();
        assert!(store.all().is_empty());

        let reloaded = RecordStore::load(gateway);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_corrupted_history_starts_empty() {
        let gateway = PersistenceGateway::in_memory();
        gateway.put_raw(ANSWER_HISTORY_KEY, "not an array");

        let store = RecordStore::load(gateway);
        assert!(store.is_empty());
    }
}
