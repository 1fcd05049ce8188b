//! Negotiation engine decides each round of a carrier negotiation

use crate::error::{RateDeskError, Result};
use rust_decimal::{Decimal, RoundingStrategy};

use super::offer::ensure_positive;
use super::types::{NegotiationPolicy, Verdict};

/// Stateless decision function over board rate, offer and round
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NegotiationEngine {
    policy: NegotiationPolicy,
}

impl NegotiationEngine {
    /// Create new negotiation engine
    pub fn new(policy: NegotiationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &NegotiationPolicy {
        &self.policy
    }

    /// Decide on `offer` made during `round` (1-based) for a load listed at
    /// `board_rate`.
    pub fn evaluate(&self, board_rate: Decimal, offer: Decimal, round: u32) -> Result<Verdict> {
        if board_rate <= Decimal::ZERO {
            return Err(RateDeskError::Catalog(format!(
                "board rate must be positive, got {}",
                board_rate
            )));
        }
        ensure_positive(offer)?;
        if round == 0 {
            return Err(RateDeskError::Internal(
                "negotiation rounds start at 1".to_string(),
            ));
        }

        let ceiling = self.policy.ceiling(board_rate);

        if offer <= ceiling {
            return Ok(Verdict::Accept { price: offer });
        }

        if round >= self.policy.max_rounds() {
            return Ok(Verdict::Reject { offer });
        }

        Ok(Verdict::Counter {
            price: self.counter_offer(board_rate, offer),
        })
    }

    /// Counteroffer for an offer above the ceiling: the midpoint between board
    /// rate and offer, truncated to cents, capped at the ceiling and floored
    /// at the board rate.
    ///
    /// With `board_rate <= ceiling < offer` every term is below the offer, so
    /// the counter lands in `[board_rate, offer)` and never exceeds what the
    /// desk would accept.
    pub fn counter_offer(&self, board_rate: Decimal, offer: Decimal) -> Decimal {
        let midpoint = ((board_rate + offer) / Decimal::TWO)
            .round_dp_with_strategy(2, RoundingStrategy::ToZero);
        midpoint.min(self.policy.ceiling(board_rate)).max(board_rate)
    }
}

/// One-shot evaluation with an explicit policy
pub fn evaluate(
    board_rate: Decimal,
    offer: Decimal,
    round: u32,
    max_rounds: u32,
    max_over_pct: Decimal,
) -> Result<Verdict> {
    let policy = NegotiationPolicy::new(max_rounds, max_over_pct)?;
    NegotiationEngine::new(policy).evaluate(board_rate, offer, round)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engine() -> NegotiationEngine {
        NegotiationEngine::default()
    }

    #[test]
    fn test_accepts_within_tolerance_every_round() {
        let engine = engine();
        for round in 1..=3 {
            assert_eq!(
                engine.evaluate(dec!(1000), dec!(1050), round).unwrap(),
                Verdict::Accept { price: dec!(1050) }
            );
            assert_eq!(
                engine.evaluate(dec!(1000), dec!(700), round).unwrap(),
                Verdict::Accept { price: dec!(700) }
            );
        }
    }

    #[test]
    fn test_boundary_offer_is_accepted() {
        let verdict = engine().evaluate(dec!(1000), dec!(1100), 3).unwrap();
        assert_eq!(verdict, Verdict::Accept { price: dec!(1100) });

        let verdict = engine().evaluate(dec!(1000), dec!(1100.01), 1).unwrap();
        assert!(matches!(verdict, Verdict::Counter { .. }));
    }

    #[test]
    fn test_counter_then_reject_scenario() {
        let engine = engine();

        match engine.evaluate(dec!(1000), dec!(1350), 1).unwrap() {
            Verdict::Counter { price } => {
                assert!(price >= dec!(1000) && price < dec!(1350));
                assert_eq!(price, dec!(1100.00));
            }
            other => panic!("expected counter, got {:?}", other),
        }

        assert_eq!(
            engine.evaluate(dec!(1000), dec!(1350), 3).unwrap(),
            Verdict::Reject { offer: dec!(1350) }
        );
        assert_eq!(
            engine.evaluate(dec!(1000), dec!(1050), 1).unwrap(),
            Verdict::Accept { price: dec!(1050) }
        );
    }

    #[test]
    fn test_verdicts_against_raw_tolerance() {
        let engine = engine();
        let boards = [
            dec!(0.01),
            dec!(1),
            dec!(99.99),
            dec!(1000),
            dec!(1000.04),
            dec!(1000.005),
            dec!(1234.567),
            dec!(4800),
        ];
        let deltas = [
            dec!(-500),
            dec!(-0.001),
            dec!(0),
            dec!(0.0001),
            dec!(0.001),
            dec!(0.01),
            dec!(3),
            dec!(250),
            dec!(10000),
        ];

        for board in boards {
            let tolerance = board * dec!(1.10);
            for delta in deltas {
                let offer = tolerance + delta;
                if offer <= Decimal::ZERO {
                    continue;
                }
                for round in 1..=3 {
                    let verdict = engine.evaluate(board, offer, round).unwrap();
                    match verdict {
                        Verdict::Accept { price } => {
                            assert!(offer <= tolerance, "accepted {} over {}", offer, tolerance);
                            assert_eq!(price, offer);
                        }
                        Verdict::Counter { price } => {
                            assert!(offer > tolerance, "countered {} within {}", offer, tolerance);
                            assert!(round < 3);
                            assert!(price >= board, "{} < board {}", price, board);
                            assert!(price < offer, "{} >= offer {}", price, offer);
                            assert!(price <= tolerance, "{} over {}", price, tolerance);
                        }
                        Verdict::Reject { offer: rejected } => {
                            assert!(offer > tolerance);
                            assert_eq!(round, 3);
                            assert_eq!(rejected, offer);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_sub_cent_tolerance_is_not_rounded() {
        let engine = engine();

        // 99.99 * 1.10 = 109.989
        assert!(matches!(
            engine.evaluate(dec!(99.99), dec!(109.99), 1).unwrap(),
            Verdict::Counter { .. }
        ));
        assert_eq!(
            engine.evaluate(dec!(99.99), dec!(109.989), 1).unwrap(),
            Verdict::Accept { price: dec!(109.989) }
        );

        // 1000.04 * 1.10 = 1100.044
        assert_eq!(
            engine.evaluate(dec!(1000.04), dec!(1100.044), 1).unwrap(),
            Verdict::Accept { price: dec!(1100.044) }
        );

        let flat = NegotiationEngine::new(NegotiationPolicy::new(3, Decimal::ZERO).unwrap());
        assert_eq!(
            flat.evaluate(dec!(1000.005), dec!(1000.005), 1).unwrap(),
            Verdict::Accept { price: dec!(1000.005) }
        );
        match flat.evaluate(dec!(1000.005), dec!(1000.006), 1).unwrap() {
            Verdict::Counter { price } => {
                assert_eq!(price, dec!(1000.005));
                assert!(price < dec!(1000.006));
            }
            other => panic!("expected counter, got {:?}", other),
        }
    }

    #[test]
    fn test_counter_is_monotone_in_offer() {
        let engine = engine();
        let low = engine.counter_offer(dec!(2000), dec!(2210));
        let high = engine.counter_offer(dec!(2000), dec!(2600));
        assert!(low <= high);
        assert_eq!(low, dec!(2105.00));
        assert_eq!(high, dec!(2200.00));
    }

    #[test]
    fn test_zero_margin_counter_still_below_offer() {
        let engine = NegotiationEngine::new(NegotiationPolicy::new(3, Decimal::ZERO).unwrap());
        match engine.evaluate(dec!(1000.01), dec!(1000.02), 1).unwrap() {
            Verdict::Counter { price } => assert_eq!(price, dec!(1000.01)),
            other => panic!("expected counter, got {:?}", other),
        }
    }

    #[test]
    fn test_single_round_policy_rejects_immediately() {
        let verdict = evaluate(dec!(1000), dec!(1500), 1, 1, dec!(0.10)).unwrap();
        assert_eq!(verdict, Verdict::Reject { offer: dec!(1500) });
    }

    #[test]
    fn test_invalid_inputs() {
        let engine = engine();
        assert!(matches!(
            engine.evaluate(dec!(1000), Decimal::ZERO, 1),
            Err(RateDeskError::InvalidOffer(_))
        ));
        assert!(matches!(
            engine.evaluate(dec!(1000), dec!(-10), 1),
            Err(RateDeskError::InvalidOffer(_))
        ));
        assert!(engine.evaluate(Decimal::ZERO, dec!(10), 1).is_err());
        assert!(engine.evaluate(dec!(1000), dec!(1200), 0).is_err());
    }
}
