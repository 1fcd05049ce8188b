//! Call metrics derived from the ledger on demand

use crate::ledger::CallOutcome;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of recent calls in a snapshot
pub const DEFAULT_RECENT_WINDOW: usize = 10;

/// What to summarize
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsQuery {
    pub recent: usize,
    /// Inclusive UTC day bounds
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl MetricsQuery {
    pub fn recent(recent: usize) -> Self {
        Self {
            recent,
            from: None,
            to: None,
        }
    }

    /// Build a date-ranged query from raw `YYYY-MM-DD` strings; malformed
    /// bounds are dropped rather than rejected.
    pub fn with_range(mut self, from: Option<&str>, to: Option<&str>) -> Self {
        self.from = from.and_then(parse_day);
        self.to = to.and_then(parse_day);
        self
    }

    fn includes(&self, outcome: &CallOutcome) -> bool {
        let day = outcome.recorded_at.date_naive();
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}

impl Default for MetricsQuery {
    fn default() -> Self {
        Self::recent(DEFAULT_RECENT_WINDOW)
    }
}

/// Parse a strict `YYYY-MM-DD` day
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Accepted and rejected calls on one day
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub accepted: usize,
    pub rejected: usize,
}

/// Aggregate view of the ledger; holds no state of its own
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_calls: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub acceptance_rate: f64,
    pub average_rounds: f64,
    pub accepted_revenue: Decimal,
    pub average_accepted_revenue: Decimal,
    pub total_final_sum: Decimal,
    pub board_match_accepted: usize,
    pub board_match_rate_percent: Option<f64>,
    pub daily_counts: Vec<DailyCount>,
    /// Most recent first
    pub recent_calls: Vec<CallOutcome>,
}

/// Summarize outcomes given in insertion order
pub fn summarize<'a, I>(outcomes: I, query: &MetricsQuery) -> MetricsSnapshot
where
    I: IntoIterator<Item = &'a CallOutcome>,
{
    let selected: Vec<&CallOutcome> = outcomes
        .into_iter()
        .filter(|outcome| query.includes(outcome))
        .collect();

    let total_calls = selected.len();
    let accepted_calls: Vec<&CallOutcome> =
        selected.iter().copied().filter(|o| o.accepted).collect();
    let accepted = accepted_calls.len();
    let rejected = total_calls - accepted;

    let accepted_revenue: Decimal = accepted_calls.iter().map(|o| o.final_price).sum();
    let total_final_sum: Decimal = selected.iter().map(|o| o.final_price).sum();
    let rounds_total: u64 = selected.iter().map(|o| u64::from(o.rounds)).sum();
    let board_match_accepted = selected.iter().filter(|o| o.is_board_match()).count();

    let mut days: BTreeMap<NaiveDate, DailyCount> = BTreeMap::new();
    for outcome in &selected {
        let date = outcome.recorded_at.date_naive();
        let bucket = days.entry(date).or_insert(DailyCount {
            date,
            accepted: 0,
            rejected: 0,
        });
        if outcome.accepted {
            bucket.accepted += 1;
        } else {
            bucket.rejected += 1;
        }
    }

    MetricsSnapshot {
        total_calls,
        accepted,
        rejected,
        acceptance_rate: ratio(accepted as f64, total_calls),
        average_rounds: ratio(rounds_total as f64, total_calls),
        accepted_revenue: accepted_revenue.round_dp(2),
        average_accepted_revenue: if accepted == 0 {
            Decimal::ZERO
        } else {
            (accepted_revenue / Decimal::from(accepted)).round_dp(2)
        },
        total_final_sum: total_final_sum.round_dp(2),
        board_match_accepted,
        board_match_rate_percent: (total_calls > 0).then(|| {
            let pct = Decimal::from(board_match_accepted * 100) / Decimal::from(total_calls);
            pct.round_dp(1).to_f64().unwrap_or_default()
        }),
        daily_counts: days.into_values().collect(),
        recent_calls: selected
            .iter()
            .rev()
            .take(query.recent)
            .map(|o| (*o).clone())
            .collect(),
    }
}

fn ratio(numerator: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        numerator / count as f64
    }
}
