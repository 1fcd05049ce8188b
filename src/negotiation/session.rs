//! Negotiation session state for one carrier and one load

use crate::error::{RateDeskError, Result};
use crate::types::SessionKey;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{NegotiationStatus, Verdict};

/// A negotiation session between the desk and one carrier over one load
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NegotiationSession {
    id: Uuid,
    key: SessionKey,
    round: u32,
    status: NegotiationStatus,
    last_offer: Option<Decimal>,
    last_counter: Option<Decimal>,
    last_verdict: Option<Verdict>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NegotiationSession {
    /// Create new session at round 1
    pub fn new(key: SessionKey) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            key,
            round: 1,
            status: NegotiationStatus::InProgress,
            last_offer: None,
            last_counter: None,
            last_verdict: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Identity of this negotiation; a key reused after archiving gets a new one
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Round the next offer will be evaluated in
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn status(&self) -> NegotiationStatus {
        self.status
    }

    pub fn last_offer(&self) -> Option<Decimal> {
        self.last_offer
    }

    pub fn last_counter(&self) -> Option<Decimal> {
        self.last_counter
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Verdict that closed the session, if it is closed
    pub fn terminal_verdict(&self) -> Option<Verdict> {
        self.last_verdict.filter(|v| v.is_terminal())
    }

    /// Price the call ended at: the booked price, or the last rejected offer
    pub fn final_price(&self) -> Option<Decimal> {
        self.terminal_verdict().map(|v| v.price())
    }

    /// Record the engine's verdict on `offer`
    pub fn apply(&mut self, offer: Decimal, verdict: Verdict, max_rounds: u32) -> Result<()> {
        if self.status.is_terminal() {
            return Err(RateDeskError::Internal(format!(
                "session {} is already {:?}",
                self.key, self.status
            )));
        }

        if !verdict.is_terminal() && self.round >= max_rounds {
            return Err(RateDeskError::Internal(format!(
                "counteroffer issued in final round {} for {}",
                self.round, self.key
            )));
        }

        self.last_offer = Some(offer);
        self.last_verdict = Some(verdict);
        self.status = verdict.status();
        self.updated_at = Utc::now();

        if let Verdict::Counter { price } = verdict {
            self.last_counter = Some(price);
            self.round += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CarrierId, LoadId};
    use rust_decimal_macros::dec;

    fn session() -> NegotiationSession {
        NegotiationSession::new(SessionKey::new(
            CarrierId::new("123456"),
            LoadId::new("L1001"),
        ))
    }

    #[test]
    fn test_session_creation() {
        let session = session();

        assert_eq!(session.round(), 1);
        assert_eq!(session.status(), NegotiationStatus::InProgress);
        assert!(!session.is_terminal());
        assert_eq!(session.terminal_verdict(), None);
        assert_eq!(session.key().to_string(), "123456:L1001");
        let other = self::session();
        assert_ne!(session.id(), other.id());
    }

    #[test]
    fn test_counter_advances_round() {
        let mut session = session();

        session
            .apply(dec!(1350), Verdict::Counter { price: dec!(1100) }, 3)
            .unwrap();

        assert_eq!(session.round(), 2);
        assert_eq!(session.last_offer(), Some(dec!(1350)));
        assert_eq!(session.last_counter(), Some(dec!(1100)));
        assert!(!session.is_terminal());
    }

    #[test]
    fn test_accept_is_terminal() {
        let mut session = session();

        session
            .apply(dec!(1050), Verdict::Accept { price: dec!(1050) }, 3)
            .unwrap();

        assert_eq!(session.round(), 1);
        assert!(session.is_terminal());
        assert_eq!(session.final_price(), Some(dec!(1050)));
    }

    #[test]
    fn test_cannot_apply_after_terminal() {
        let mut session = session();
        session
            .apply(dec!(1400), Verdict::Reject { offer: dec!(1400) }, 3)
            .unwrap();

        let result = session.apply(dec!(1000), Verdict::Accept { price: dec!(1000) }, 3);
        assert!(result.is_err());
        assert_eq!(session.status(), NegotiationStatus::Rejected);
        assert_eq!(session.final_price(), Some(dec!(1400)));
    }

    #[test]
    fn test_counter_in_final_round_is_refused() {
        let mut session = session();
        let result = session.apply(dec!(1350), Verdict::Counter { price: dec!(1100) }, 1);
        assert!(result.is_err());
    }
}
