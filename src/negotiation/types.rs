//! Negotiation types and state machine

use crate::error::{RateDeskError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default cap on rounds per carrier+load negotiation
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

/// Default margin over the board rate the desk will pay without countering (10%)
pub const DEFAULT_MAX_OVER_PCT: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Broker's decision on a single carrier offer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Offer is within tolerance; the carrier's price is booked as-is
    Accept { price: Decimal },
    /// Offer is too high; the desk proposes `price` instead
    Counter { price: Decimal },
    /// Offer is too high and the rounds are exhausted
    Reject { offer: Decimal },
}

impl Verdict {
    /// Check if this verdict closes the negotiation
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Verdict::Counter { .. })
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept { .. })
    }

    /// Price attached to the verdict: the booked price, the counteroffer,
    /// or the carrier's rejected offer
    pub fn price(&self) -> Decimal {
        match self {
            Verdict::Accept { price } | Verdict::Counter { price } => *price,
            Verdict::Reject { offer } => *offer,
        }
    }

    /// Session status this verdict leaves behind
    pub fn status(&self) -> NegotiationStatus {
        match self {
            Verdict::Accept { .. } => NegotiationStatus::Accepted,
            Verdict::Counter { .. } => NegotiationStatus::InProgress,
            Verdict::Reject { .. } => NegotiationStatus::Rejected,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accept { price } => write!(f, "ACCEPT at {}", price),
            Verdict::Counter { price } => write!(f, "COUNTER at {}", price),
            Verdict::Reject { offer } => write!(f, "REJECT offer {}", offer),
        }
    }
}

/// Negotiation state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStatus {
    InProgress,
    Accepted,
    Rejected,
}

impl NegotiationStatus {
    /// Check if negotiation is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NegotiationStatus::Accepted | NegotiationStatus::Rejected
        )
    }

    /// Check if negotiation is active
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// Tunables shared by every negotiation the desk runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationPolicy {
    max_rounds: u32,
    max_over_pct: Decimal,
}

impl NegotiationPolicy {
    pub fn new(max_rounds: u32, max_over_pct: Decimal) -> Result<Self> {
        if max_rounds == 0 {
            return Err(RateDeskError::InvalidConfig(
                "max rounds must be at least 1".to_string(),
            ));
        }
        if max_over_pct.is_sign_negative() {
            return Err(RateDeskError::InvalidConfig(format!(
                "max over pct must not be negative, got {}",
                max_over_pct
            )));
        }

        Ok(Self {
            max_rounds,
            max_over_pct,
        })
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn max_over_pct(&self) -> Decimal {
        self.max_over_pct
    }

    /// Highest price the desk accepts for a load. Kept exact; offers are
    /// compared against the full product, never a rounded one.
    pub fn ceiling(&self, board_rate: Decimal) -> Decimal {
        board_rate * (Decimal::ONE + self.max_over_pct)
    }
}

impl Default for NegotiationPolicy {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_over_pct: DEFAULT_MAX_OVER_PCT,
        }
    }
}
