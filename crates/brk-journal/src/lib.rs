//! brk-journal
//!
//! The decision journal (C8): an append-only, optionally hash-chained
//! JSON Lines log of `EntryDecision` and `PositionEvent` records — the
//! stable, machine-readable interface analytics tooling reads instead of
//! replaying engine state.

mod records;
mod writer;

pub use records::{
    EntryDecision, EntryDecisionKind, ObservedSnapshot, PositionEvent, PositionEventKind,
};
pub use writer::{compute_record_hash, verify_hash_chain, verify_hash_chain_str, JournalRecord, JournalWriter, VerifyResult};

use anyhow::Result;
use uuid::Uuid;

/// Typed wrapper over [`JournalWriter`] for the two record kinds the
/// engine emits. Keeps call sites from hand-building `serde_json::Value`
/// payloads.
pub struct DecisionJournal {
    writer: JournalWriter,
    run_id: Uuid,
}

impl DecisionJournal {
    pub fn new(writer: JournalWriter, run_id: Uuid) -> Self {
        DecisionJournal { writer, run_id }
    }

    pub fn record_entry_decision(&mut self, record: &EntryDecision) -> Result<JournalRecord> {
        let payload = serde_json::to_value(record)?;
        self.writer.append(self.run_id, "entry_decisions", "entry_decision", payload)
    }

    pub fn record_position_event(&mut self, record: &PositionEvent) -> Result<JournalRecord> {
        let payload = serde_json::to_value(record)?;
        self.writer.append(self.run_id, "position_events", "position_event", payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brk_types::{Micros, Side};
    use tempfile::tempdir;

    #[test]
    fn typed_records_round_trip_through_the_writer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let w = JournalWriter::new(&path, true).unwrap();
        let mut journal = DecisionJournal::new(w, Uuid::new_v4());

        journal
            .record_entry_decision(&EntryDecision {
                timestamp: 600,
                symbol: "T".to_string(),
                side: Side::Long,
                decision: EntryDecisionKind::Entered,
                reason_code: "ALLOWED".to_string(),
                filter_name: None,
                state_at_decision: "ReadyToEnter".to_string(),
                observed: ObservedSnapshot {
                    volume_ratio: Some(2.4),
                    candle_size_pct: Some(1.6),
                    ..Default::default()
                },
                pivot: Micros::from_dollars(100),
                current_price: Micros::new(100_250_000),
            })
            .unwrap();

        let result = verify_hash_chain(&path).unwrap();
        assert_eq!(result, VerifyResult::Valid { lines: 1 });
    }
}
