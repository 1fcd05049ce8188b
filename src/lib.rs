//! ratedesk negotiation library
//!
//! Inbound carrier-rate negotiation for a freight brokerage:
//! - Round-capped offer evaluation against a load's board rate
//! - Per carrier+load negotiation sessions that settle exactly once
//! - A hash-chained ledger of finished calls and metrics derived from it
//! - Carrier identity checks against the FMCSA registry
//! - An axum HTTP API for the voice agent and the dashboard

pub mod api;
pub mod carrier;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod negotiation;
pub mod transcript;
pub mod types;

// Re-export commonly used types
pub use catalog::{InMemoryCatalog, LoadCatalog, LoadFilter, LoadRecord};
pub use config::DeskConfig;
pub use error::{RateDeskError, Result};
pub use ledger::{CallLedger, CallOutcome, OutcomeDraft};
pub use metrics::{summarize, MetricsQuery, MetricsSnapshot};
pub use negotiation::{evaluate, NegotiationEngine, NegotiationPolicy, SessionStore, Verdict};
pub use types::{CarrierId, Hash, LoadId, SessionKey};
