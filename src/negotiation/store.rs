//! Session store tracks every open negotiation across stateless calls

use crate::catalog::LoadCatalog;
use crate::error::Result;
use crate::types::{CarrierId, LoadId, SessionKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::engine::NegotiationEngine;
use super::session::NegotiationSession;
use super::types::Verdict;

/// Result of processing one offer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferOutcome {
    pub verdict: Verdict,
    /// Round the offer was decided in
    pub round: u32,
    /// Round the next offer on this key would be evaluated in
    pub next_round: u32,
    pub board_rate: Decimal,
    pub ceiling: Decimal,
    /// The session was already closed and the stored verdict was returned
    pub replayed: bool,
}

type SessionSlot = Arc<Mutex<NegotiationSession>>;

/// Session store: one guarded slot per carrier+load key
pub struct SessionStore {
    engine: NegotiationEngine,
    catalog: Arc<dyn LoadCatalog>,
    sessions: Mutex<HashMap<SessionKey, SessionSlot>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionStore {
    pub fn new(engine: NegotiationEngine, catalog: Arc<dyn LoadCatalog>) -> Self {
        Self {
            engine,
            catalog,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &NegotiationEngine {
        &self.engine
    }

    /// Evaluate `offer` for the carrier+load pair, creating the session on
    /// first contact. Closed sessions replay their verdict unchanged.
    pub fn process_offer(
        &self,
        carrier_id: &CarrierId,
        load_id: &LoadId,
        offer: Decimal,
    ) -> Result<OfferOutcome> {
        let board_rate = self.catalog.board_rate(load_id)?;
        let ceiling = self.engine.policy().ceiling(board_rate);
        let key = SessionKey::new(carrier_id.clone(), load_id.clone());

        let slot = self.slot(&key);
        let mut session = lock(&slot);

        if let Some(verdict) = session.terminal_verdict() {
            tracing::debug!("Replaying {} for closed session {}", verdict, key);
            return Ok(OfferOutcome {
                verdict,
                round: session.round(),
                next_round: session.round(),
                board_rate,
                ceiling,
                replayed: true,
            });
        }

        let round = session.round();
        let verdict = self.engine.evaluate(board_rate, offer, round)?;
        session.apply(offer, verdict, self.engine.policy().max_rounds())?;

        tracing::info!(
            "Negotiation {} round {}: offer {} vs ceiling {} -> {}",
            key,
            round,
            offer,
            ceiling,
            verdict
        );

        Ok(OfferOutcome {
            verdict,
            round,
            next_round: session.round(),
            board_rate,
            ceiling,
            replayed: false,
        })
    }

    /// Snapshot of a session
    pub fn get(&self, key: &SessionKey) -> Option<NegotiationSession> {
        let slot = lock(&self.sessions).get(key).cloned()?;
        let session = lock(&slot).clone();
        Some(session)
    }

    /// Remove session `id` once its call has been recorded; the next offer on
    /// the same key starts a fresh negotiation. Nothing is removed when the
    /// key now holds a different or still open session.
    pub fn archive_if_terminal(&self, key: &SessionKey, id: Uuid) -> Option<NegotiationSession> {
        let mut sessions = lock(&self.sessions);
        let slot = sessions.get(key)?.clone();
        let session = lock(&slot).clone();

        if session.id() != id || !session.is_terminal() {
            tracing::debug!("Kept session {} ({:?}) on {}", session.id(), session.status(), key);
            return None;
        }

        sessions.remove(key);
        tracing::debug!("Archived session {} ({:?})", key, session.status());
        Some(session)
    }

    /// Snapshots of all sessions
    pub fn sessions(&self) -> Vec<NegotiationSession> {
        let slots: Vec<SessionSlot> = lock(&self.sessions).values().cloned().collect();
        slots.iter().map(|slot| lock(slot).clone()).collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get or create the slot; the map lock is released before the caller
    /// takes the per-key lock.
    fn slot(&self, key: &SessionKey) -> SessionSlot {
        lock(&self.sessions)
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(NegotiationSession::new(key.clone()))))
            .clone()
    }
}
