//! Parsing of carrier offers as the voice agent relays them

use crate::error::{RateDeskError, Result};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

/// Offer payload: either a JSON number or free text such as `"$1,600"`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OfferInput {
    Number(serde_json::Number),
    Text(String),
}

impl From<Decimal> for OfferInput {
    fn from(value: Decimal) -> Self {
        OfferInput::Text(value.to_string())
    }
}

impl From<&str> for OfferInput {
    fn from(value: &str) -> Self {
        OfferInput::Text(value.to_string())
    }
}

/// Offers at or above this are treated as garbage, not as a rate.
const MAX_AMOUNT: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("amount pattern is valid"))
}

/// Convert an offer to a decimal amount. Accepts `1600`, `"1600"`,
/// `"$1,600"` and `"1600.00"`.
///
/// Text offers take the first whole number in the string. Both forms are
/// rejected when they carry more than two decimals or seven integer digits.
pub fn parse_amount(input: &OfferInput) -> Result<Decimal> {
    let amount = match input {
        OfferInput::Number(number) => Decimal::from_str(&number.to_string())
            .or_else(|_| Decimal::from_scientific(&number.to_string()))
            .map_err(|_| RateDeskError::InvalidOffer(number.to_string()))?,
        OfferInput::Text(text) => {
            let cleaned = text.trim().replace([',', '$'], "");
            amount_pattern()
                .find(&cleaned)
                .and_then(|m| Decimal::from_str(m.as_str()).ok())
                .ok_or_else(|| {
                    RateDeskError::InvalidOffer(format!("{:?} is not a numeric amount", text))
                })?
        }
    };
    ensure_in_range(amount)?;
    Ok(amount)
}

fn ensure_in_range(amount: Decimal) -> Result<()> {
    if amount.normalize().scale() > 2 {
        return Err(RateDeskError::InvalidOffer(format!(
            "{} has more than two decimals",
            amount
        )));
    }
    if amount.abs() >= MAX_AMOUNT {
        return Err(RateDeskError::InvalidOffer(format!(
            "{} is out of range",
            amount
        )));
    }
    Ok(())
}

/// Parse an offer and require it to be strictly positive
pub fn parse_offer(input: &OfferInput) -> Result<Decimal> {
    let amount = parse_amount(input)?;
    ensure_positive(amount)?;
    Ok(amount)
}

pub(crate) fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(RateDeskError::InvalidOffer(format!(
            "offer must be positive, got {}",
            amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn text(s: &str) -> OfferInput {
        OfferInput::Text(s.to_string())
    }

    #[test]
    fn test_parse_plain_and_formatted_amounts() {
        assert_eq!(parse_amount(&text("1600")).unwrap(), dec!(1600));
        assert_eq!(parse_amount(&text("$1,600")).unwrap(), dec!(1600));
        assert_eq!(parse_amount(&text("1600.00")).unwrap(), dec!(1600.00));
        assert_eq!(parse_amount(&text(" about $2,150.5 ")).unwrap(), dec!(2150.5));
    }

    #[test]
    fn test_parse_json_numbers() {
        let input: OfferInput = serde_json::from_str("1350").unwrap();
        assert_eq!(parse_amount(&input).unwrap(), dec!(1350));

        let input: OfferInput = serde_json::from_str("1350.75").unwrap();
        assert_eq!(parse_amount(&input).unwrap(), dec!(1350.75));

        let input: OfferInput = serde_json::from_str("\"$1,350\"").unwrap();
        assert_eq!(parse_amount(&input).unwrap(), dec!(1350));
    }

    #[test]
    fn test_non_numeric_offer_is_rejected() {
        let err = parse_amount(&text("call me back")).unwrap_err();
        assert!(matches!(err, RateDeskError::InvalidOffer(_)));
    }

    #[test]
    fn test_long_or_precise_text_is_rejected() {
        for raw in ["$12,345,678", "10000000", "1350.999", "$1,350.005"] {
            assert!(
                matches!(parse_offer(&text(raw)), Err(RateDeskError::InvalidOffer(_))),
                "{} should be rejected",
                raw
            );
        }
        assert_eq!(parse_offer(&text("$9,999,999.99")).unwrap(), dec!(9999999.99));
        assert_eq!(parse_offer(&text("1350.10")).unwrap(), dec!(1350.10));
    }

    #[test]
    fn test_long_or_precise_numbers_are_rejected() {
        for raw in ["1350.999", "12345678", "1e8"] {
            let input: OfferInput = serde_json::from_str(raw).unwrap();
            assert!(
                matches!(parse_offer(&input), Err(RateDeskError::InvalidOffer(_))),
                "{} should be rejected",
                raw
            );
        }
        let input: OfferInput = serde_json::from_str("1350.5").unwrap();
        assert_eq!(parse_offer(&input).unwrap(), dec!(1350.5));
    }

    #[test]
    fn test_parse_offer_requires_positive() {
        assert!(matches!(
            parse_offer(&text("0")),
            Err(RateDeskError::InvalidOffer(_))
        ));
        assert!(matches!(
            parse_offer(&text("-500")),
            Err(RateDeskError::InvalidOffer(_))
        ));
        assert_eq!(parse_offer(&text("$950")).unwrap(), dec!(950));
    }
}
