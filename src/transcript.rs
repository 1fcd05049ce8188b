//! Lightweight transcript analysis for call reports

use crate::types::{CarrierId, LoadId};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

const POSITIVE_TOKENS: &[&str] = &[
    "good", "great", "ok", "thanks", "thank", "yes", "happy", "accept",
];
const NEGATIVE_TOKENS: &[&str] = &[
    "no", "not", "reject", "angry", "bad", "hate", "problem", "can't", "cannot",
];

/// Caller mood as inferred from the transcript
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

/// Identifiers and amounts mentioned in a transcript
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mc_number: Option<CarrierId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_id: Option<LoadId>,
}

struct Patterns {
    mc: Regex,
    dollar_price: Regex,
    price: Regex,
    load_id: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        mc: Regex::new(r"(?i)\bMC(?:\s|#|:)?\s*(\d{4,10})\b").expect("mc pattern is valid"),
        dollar_price: Regex::new(r"\$\s*(\d{2,6}(?:\.\d{1,2})?)\b")
            .expect("dollar price pattern is valid"),
        price: Regex::new(r"\b(\d{2,6}(?:\.\d{1,2})?)\b").expect("price pattern is valid"),
        load_id: Regex::new(r"(?i)\bL\d{3,}\b").expect("load id pattern is valid"),
    })
}

/// Regex entity extraction and token-count sentiment; both switch off
/// together when analysis is disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranscriptAnalyzer {
    enabled: bool,
}

impl TranscriptAnalyzer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn extract_entities(&self, text: &str) -> TranscriptEntities {
        if !self.enabled {
            return TranscriptEntities::default();
        }

        let patterns = patterns();
        let mc_number = patterns
            .mc
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| CarrierId::new(m.as_str()));

        let load_id = patterns.load_id.find(text).map(|m| LoadId::new(m.as_str()));

        // Dollar-prefixed amounts win over bare numbers such as the MC number
        let cleaned = text.replace(',', "");
        let price = patterns
            .dollar_price
            .captures(&cleaned)
            .or_else(|| patterns.price.captures(&cleaned))
            .and_then(|caps| caps.get(1))
            .and_then(|m| Decimal::from_str(m.as_str()).ok());

        TranscriptEntities {
            mc_number,
            price,
            load_id,
        }
    }

    pub fn sentiment(&self, text: &str) -> Sentiment {
        if !self.enabled || text.is_empty() {
            return Sentiment::Neutral;
        }

        let lowered = text.to_lowercase();
        let count = |tokens: &[&str]| -> usize {
            tokens.iter().map(|tok| lowered.matches(tok).count()).sum()
        };
        let positive = count(POSITIVE_TOKENS);
        let negative = count(NEGATIVE_TOKENS);

        match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }
}

impl Default for TranscriptAnalyzer {
    fn default() -> Self {
        Self::new(true)
    }
}
