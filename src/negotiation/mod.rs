//! Negotiation module: round-by-round rate decisions per carrier and load

pub mod engine;
pub mod offer;
pub mod session;
pub mod store;
pub mod types;

pub use engine::{evaluate, NegotiationEngine};
pub use offer::{parse_amount, parse_offer, OfferInput};
pub use session::NegotiationSession;
pub use store::{OfferOutcome, SessionStore};
pub use types::{
    NegotiationPolicy, NegotiationStatus, Verdict, DEFAULT_MAX_OVER_PCT, DEFAULT_MAX_ROUNDS,
};
