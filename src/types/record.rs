//! Record types flowing through batch validation and dead-lettering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record that failed strict decoding, retained for postmortem analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterRecord {
    /// The original raw record as received.
    pub record: Value,

    /// Why decoding failed.
    pub error: String,

    /// When the record was quarantined.
    pub quarantined_at: DateTime<Utc>,
}

impl DeadLetterRecord {
    /// Quarantine a record with the given failure reason, timestamped now.
    pub fn new(record: Value, error: impl Into<String>) -> Self {
        Self {
            record,
            error: error.into(),
            quarantined_at: Utc::now(),
        }
    }
}

/// Outcome of processing a batch of raw records.
///
/// Decoded records and dead letters are disjoint; every input record
/// lands in exactly one of the two.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Records that passed strict decoding.
    pub valid: Vec<T>,

    /// Records quarantined with their failure reason.
    pub dead_letters: Vec<DeadLetterRecord>,
}

impl<T> BatchOutcome<T> {
    /// An empty outcome.
    pub fn empty() -> Self {
        Self {
            valid: Vec::new(),
            dead_letters: Vec::new(),
        }
    }

    /// Total records processed.
    pub fn total(&self) -> usize {
        self.valid.len() + self.dead_letters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dead_letter_retains_original() {
        let raw = json!({"name": null, "id": "abc"});
        let dead = DeadLetterRecord::new(raw.clone(), "id must be an integer");
        assert_eq!(dead.record, raw);
        assert!(dead.error.contains("integer"));
    }

    #[test]
    fn test_batch_outcome_total() {
        let mut outcome: BatchOutcome<String> = BatchOutcome::empty();
        outcome.valid.push("a".into());
        outcome
            .dead_letters
            .push(DeadLetterRecord::new(json!({}), "empty"));
        assert_eq!(outcome.total(), 2);
    }
}
