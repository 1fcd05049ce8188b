//! Append-only ledger of finished calls

use crate::error::{RateDeskError, Result};
use crate::transcript::{Sentiment, TranscriptEntities};
use crate::types::{CarrierId, Hash, LoadId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// A finished call as reported by the agent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallOutcome {
    pub call_id: Uuid,
    pub carrier_id: CarrierId,
    pub load_id: LoadId,
    pub final_price: Decimal,
    pub accepted: bool,
    pub rounds: u32,
    pub transcript_summary: String,
    pub sentiment: Sentiment,
    /// Board rate of the load when the call was recorded
    pub board_rate: Option<Decimal>,
    pub entities: TranscriptEntities,
    pub recorded_at: DateTime<Utc>,
}

impl CallOutcome {
    /// Accepted at exactly the board rate
    pub fn is_board_match(&self) -> bool {
        self.accepted && self.board_rate == Some(self.final_price)
    }
}

/// Outcome fields before validation; the required ones may still be missing
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutcomeDraft {
    pub carrier_id: Option<CarrierId>,
    pub load_id: Option<LoadId>,
    pub final_price: Option<Decimal>,
    pub accepted: Option<bool>,
    pub rounds: u32,
    pub transcript_summary: String,
    pub sentiment: Sentiment,
    pub board_rate: Option<Decimal>,
    pub entities: TranscriptEntities,
}

impl OutcomeDraft {
    /// Validate required fields and stamp the outcome
    pub fn finalize(self, recorded_at: DateTime<Utc>) -> Result<CallOutcome> {
        let carrier_id = self
            .carrier_id
            .filter(|id| !id.is_empty())
            .ok_or(RateDeskError::InvalidOutcome("carrier_id"))?;
        let load_id = self
            .load_id
            .filter(|id| !id.is_empty())
            .ok_or(RateDeskError::InvalidOutcome("load_id"))?;
        let final_price = self
            .final_price
            .ok_or(RateDeskError::InvalidOutcome("final_price"))?;
        let accepted = self
            .accepted
            .ok_or(RateDeskError::InvalidOutcome("accepted"))?;

        Ok(CallOutcome {
            call_id: Uuid::new_v4(),
            carrier_id,
            load_id,
            final_price,
            accepted,
            rounds: self.rounds,
            transcript_summary: self.transcript_summary,
            sentiment: self.sentiment,
            board_rate: self.board_rate,
            entities: self.entities,
            recorded_at,
        })
    }
}

/// Ledger entry: an outcome chained to its predecessor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub position: usize,
    pub outcome: CallOutcome,
    pub prev_hash: Hash,
    pub entry_hash: Hash,
}

fn entry_hash(prev: &Hash, position: usize, outcome: &CallOutcome) -> Result<Hash> {
    let mut material = (position as u64).to_be_bytes().to_vec();
    material.extend(serde_json::to_vec(outcome)?);
    Ok(Hash::chain(prev, &material))
}

/// Result of re-walking the hash chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub valid: bool,
    pub verified_entries: usize,
    pub head: Hash,
    pub broken_at: Option<usize>,
}

/// Point-in-time copy of the ledger, in append order; iterate it as often as
/// needed.
#[derive(Clone, Debug, Default)]
pub struct LedgerSnapshot {
    entries: Vec<Arc<LedgerEntry>>,
}

impl LedgerSnapshot {
    pub fn iter(&self) -> impl Iterator<Item = &CallOutcome> + '_ {
        self.entries.iter().map(|entry| &entry.outcome)
    }

    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.entries.iter().map(|entry| entry.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a LedgerSnapshot {
    type Item = &'a CallOutcome;
    type IntoIter = Box<dyn Iterator<Item = &'a CallOutcome> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Append-only call ledger
#[derive(Debug, Default)]
pub struct CallLedger {
    entries: RwLock<Vec<Arc<LedgerEntry>>>,
}

impl CallLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append an outcome; the returned entry carries its position
    pub fn append(&self, draft: OutcomeDraft) -> Result<LedgerEntry> {
        self.append_at(draft, Utc::now())
    }

    /// Append with an explicit recording time
    pub fn append_at(&self, draft: OutcomeDraft, recorded_at: DateTime<Utc>) -> Result<LedgerEntry> {
        let outcome = draft.finalize(recorded_at)?;

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let position = entries.len();
        let prev_hash = entries
            .last()
            .map(|entry| entry.entry_hash.clone())
            .unwrap_or(Hash::GENESIS);
        let entry_hash = entry_hash(&prev_hash, position, &outcome)?;

        let entry = LedgerEntry {
            position,
            outcome,
            prev_hash,
            entry_hash,
        };
        entries.push(Arc::new(entry.clone()));

        tracing::info!(
            "Recorded call {} for {}:{} at position {} (accepted: {}, price: {})",
            entry.outcome.call_id,
            entry.outcome.carrier_id,
            entry.outcome.load_id,
            position,
            entry.outcome.accepted,
            entry.outcome.final_price
        );

        Ok(entry)
    }

    /// Snapshot of every outcome in insertion order
    pub fn all(&self) -> LedgerSnapshot {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        LedgerSnapshot {
            entries: entries.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recompute the hash chain from genesis
    pub fn verify(&self) -> Result<ChainVerification> {
        verify_entries(self.all().entries())
    }
}

fn verify_entries<'a>(entries: impl Iterator<Item = &'a LedgerEntry>) -> Result<ChainVerification> {
    let mut prev = Hash::GENESIS;
    let mut verified = 0;

    for (position, entry) in entries.enumerate() {
        let expected = entry_hash(&prev, position, &entry.outcome)?;
        if entry.position != position || entry.prev_hash != prev || entry.entry_hash != expected {
            tracing::warn!("Ledger chain broken at position {}", position);
            return Ok(ChainVerification {
                valid: false,
                verified_entries: verified,
                head: prev,
                broken_at: Some(position),
            });
        }
        prev = expected;
        verified += 1;
    }

    Ok(ChainVerification {
        valid: true,
        verified_entries: verified,
        head: prev,
        broken_at: None,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn draft(carrier: &str, load: &str, price: Decimal, accepted: bool, rounds: u32) -> OutcomeDraft {
        OutcomeDraft {
            carrier_id: Some(CarrierId::new(carrier)),
            load_id: Some(LoadId::new(load)),
            final_price: Some(price),
            accepted: Some(accepted),
            rounds,
            transcript_summary: format!("{} on {}", carrier, load),
            ..Default::default()
        }
    }

    #[test]
    fn test_append_and_read_back_in_order() {
        let ledger = CallLedger::new();
        for i in 0..5u32 {
            let entry = ledger
                .append(draft(&format!("10{}", i), "L1001", dec!(1000) + Decimal::from(i), i % 2 == 0, i))
                .unwrap();
            assert_eq!(entry.position, i as usize);
        }

        let snapshot = ledger.all();
        assert_eq!(snapshot.len(), 5);
        let carriers: Vec<_> = snapshot.iter().map(|o| o.carrier_id.0.clone()).collect();
        assert_eq!(carriers, vec!["100", "101", "102", "103", "104"]);

        // Restartable
        assert_eq!(snapshot.iter().count(), 5);
        assert_eq!((&snapshot).into_iter().count(), 5);
    }

    #[test]
    fn test_no_dedup_for_same_key() {
        let ledger = CallLedger::new();
        ledger.append(draft("123", "L1", dec!(1000), false, 3)).unwrap();
        ledger.append(draft("123", "L1", dec!(1050), true, 1)).unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_missing_required_fields() {
        let ledger = CallLedger::new();

        let mut missing_price = draft("123", "L1", dec!(1000), true, 1);
        missing_price.final_price = None;
        assert!(matches!(
            ledger.append(missing_price),
            Err(RateDeskError::InvalidOutcome("final_price"))
        ));

        let mut blank_carrier = draft("123", "L1", dec!(1000), true, 1);
        blank_carrier.carrier_id = Some(CarrierId::new("  "));
        assert!(matches!(
            ledger.append(blank_carrier),
            Err(RateDeskError::InvalidOutcome("carrier_id"))
        ));

        let mut missing_flag = draft("123", "L1", dec!(1000), true, 1);
        missing_flag.accepted = None;
        assert!(matches!(
            ledger.append(missing_flag),
            Err(RateDeskError::InvalidOutcome("accepted"))
        ));

        assert!(matches!(
            ledger.append(OutcomeDraft::default()),
            Err(RateDeskError::InvalidOutcome("carrier_id"))
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_appends() {
        let ledger = CallLedger::new();
        ledger.append(draft("1", "L1", dec!(900), true, 1)).unwrap();
        let snapshot = ledger.all();
        ledger.append(draft("2", "L1", dec!(900), true, 1)).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(ledger.all().len(), 2);
    }

    #[test]
    fn test_chain_verifies() {
        let ledger = CallLedger::new();
        assert!(ledger.verify().unwrap().valid);

        for i in 0..3 {
            ledger.append(draft("1", &format!("L{}", i), dec!(900), true, 1)).unwrap();
        }
        let report = ledger.verify().unwrap();
        assert!(report.valid);
        assert_eq!(report.verified_entries, 3);
        assert_ne!(report.head, Hash::GENESIS);
    }

    #[test]
    fn test_tampered_entry_breaks_chain() {
        let ledger = CallLedger::new();
        for i in 0..3 {
            ledger.append(draft("1", &format!("L{}", i), dec!(900), true, 1)).unwrap();
        }

        let mut entries: Vec<LedgerEntry> = ledger.all().entries().cloned().collect();
        entries[1].outcome.final_price = dec!(1);

        let report = verify_entries(entries.iter()).unwrap();
        assert!(!report.valid);
        assert_eq!(report.broken_at, Some(1));
        assert_eq!(report.verified_entries, 1);
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let ledger = Arc::new(CallLedger::new());
        std::thread::scope(|scope| {
            for t in 0..8 {
                let ledger = ledger.clone();
                scope.spawn(move || {
                    for i in 0..25 {
                        ledger
                            .append(draft(&format!("{}", t), &format!("L{}", i), dec!(1000), true, 1))
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(ledger.len(), 200);
        let positions: Vec<_> = ledger.all().entries().map(|e| e.position).collect();
        assert_eq!(positions, (0..200).collect::<Vec<_>>());
        assert!(ledger.verify().unwrap().valid);
    }

    #[test]
    fn test_board_match() {
        let mut outcome = draft("1", "L1", dec!(1000), true, 1)
            .finalize(Utc::now())
            .unwrap();
        assert!(!outcome.is_board_match());
        outcome.board_rate = Some(dec!(1000.00));
        assert!(outcome.is_board_match());
        outcome.accepted = false;
        assert!(!outcome.is_board_match());
    }
}
