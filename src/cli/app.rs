//! ratedesk application integrating all components

use crate::api;
use crate::carrier::{select_verifier, CarrierSnapshot, CarrierVerifier};
use crate::catalog::{InMemoryCatalog, LoadCatalog, LoadFilter, LoadRecord};
use crate::config::DeskConfig;
use crate::error::{RateDeskError, Result};
use crate::ledger::{CallLedger, CallOutcome, ChainVerification, OutcomeDraft};
use crate::metrics::{summarize, MetricsQuery, MetricsSnapshot};
use crate::negotiation::{
    parse_amount, parse_offer, NegotiationEngine, OfferInput, OfferOutcome, SessionStore,
};
use crate::transcript::TranscriptAnalyzer;
use crate::types::{CarrierId, LoadId, SessionKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Longest transcript excerpt kept on a ledger entry
const SUMMARY_CHARS: usize = 500;

/// Eligibility verdict for a calling carrier
#[derive(Clone, Debug, Serialize)]
pub struct Authentication {
    pub eligible: bool,
    pub carrier: CarrierSnapshot,
}

/// What the voice agent reports once a call is over
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallReport {
    #[serde(default)]
    pub transcript: String,
    pub mc_number: Option<CarrierId>,
    pub load_id: Option<LoadId>,
    pub final_price: Option<OfferInput>,
    pub accepted: Option<bool>,
    pub rounds: Option<u32>,
}

/// Main ratedesk application
#[derive(Clone)]
pub struct RateDeskApp {
    config: Arc<DeskConfig>,
    catalog: Arc<dyn LoadCatalog>,
    sessions: Arc<SessionStore>,
    ledger: Arc<CallLedger>,
    verifier: Arc<dyn CarrierVerifier>,
    analyzer: TranscriptAnalyzer,
}

impl RateDeskApp {
    /// Build the application from configuration: loads the catalog file and
    /// picks the carrier verifier.
    pub fn new(config: DeskConfig) -> Result<Self> {
        let catalog = InMemoryCatalog::from_json_file(&config.loads_file)?;
        let verifier = select_verifier(config.fmcsa_webkey.as_deref(), &config.fmcsa_base_url)?;
        Ok(Self::with_parts(config, Arc::new(catalog), Arc::from(verifier)))
    }

    pub fn with_parts(
        config: DeskConfig,
        catalog: Arc<dyn LoadCatalog>,
        verifier: Arc<dyn CarrierVerifier>,
    ) -> Self {
        let engine = NegotiationEngine::new(config.policy);
        let analyzer = TranscriptAnalyzer::new(config.enable_nlp);

        Self {
            sessions: Arc::new(SessionStore::new(engine, catalog.clone())),
            ledger: Arc::new(CallLedger::new()),
            config: Arc::new(config),
            catalog,
            verifier,
            analyzer,
        }
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn ledger(&self) -> &CallLedger {
        &self.ledger
    }

    /// Number of negotiations still waiting on the carrier's next offer
    pub fn open_negotiations(&self) -> usize {
        self.sessions
            .sessions()
            .iter()
            .filter(|session| session.status().is_active())
            .count()
    }

    /// Re-walk the call ledger's hash chain
    pub fn verify_ledger(&self) -> Result<ChainVerification> {
        let report = self.ledger.verify()?;
        tracing::info!(
            "Ledger verified {} entries: valid={}",
            report.verified_entries,
            report.valid
        );
        Ok(report)
    }

    /// Check a carrier against the registry
    pub async fn authenticate(&self, mc_number: &CarrierId) -> Result<Authentication> {
        if mc_number.is_empty() {
            return Err(RateDeskError::InvalidRequest(
                "mc_number must not be empty".to_string(),
            ));
        }

        let carrier = self.verifier.lookup(mc_number).await;
        let eligible = carrier.is_eligible();
        tracing::info!("Authenticated MC {}: eligible={}", mc_number, eligible);

        Ok(Authentication { eligible, carrier })
    }

    pub fn search_loads(&self, filter: &LoadFilter) -> Vec<LoadRecord> {
        self.catalog.search(filter)
    }

    /// Run one negotiation round for the carrier on the load
    pub fn negotiate(
        &self,
        carrier_id: &CarrierId,
        load_id: &LoadId,
        offer: &OfferInput,
    ) -> Result<OfferOutcome> {
        if carrier_id.is_empty() || load_id.is_empty() {
            return Err(RateDeskError::InvalidRequest(
                "mc_number and load_id are required".to_string(),
            ));
        }

        let offer = parse_offer(offer)?;
        self.sessions.process_offer(carrier_id, load_id, offer)
    }

    /// Record a finished call. Fields the report leaves out are taken from
    /// the transcript and from the closed negotiation on the same key, which
    /// is archived once the outcome is in the ledger.
    pub fn record_call(&self, report: CallReport) -> Result<CallOutcome> {
        let entities = self.analyzer.extract_entities(&report.transcript);
        let sentiment = self.analyzer.sentiment(&report.transcript);

        let carrier_id = report
            .mc_number
            .filter(|id| !id.is_empty())
            .or_else(|| entities.mc_number.clone());
        let load_id = report
            .load_id
            .filter(|id| !id.is_empty())
            .or_else(|| entities.load_id.clone());

        let key = carrier_id
            .clone()
            .zip(load_id.clone())
            .map(|(carrier, load)| SessionKey::new(carrier, load));
        let session = key
            .as_ref()
            .and_then(|key| self.sessions.get(key))
            .filter(|session| session.is_terminal());

        let reported_price = report.final_price.as_ref().and_then(|raw| {
            parse_amount(raw)
                .map_err(|e| tracing::warn!("Ignoring reported final price: {}", e))
                .ok()
        });
        let final_price = reported_price
            .or_else(|| session.as_ref().and_then(|s| s.final_price()))
            .or(entities.price);
        let accepted = report.accepted.or_else(|| {
            session
                .as_ref()
                .and_then(|s| s.terminal_verdict())
                .map(|verdict| verdict.is_accept())
        });
        let rounds = report
            .rounds
            .or_else(|| session.as_ref().map(|s| s.round()))
            .unwrap_or(0);

        let board_rate = load_id
            .as_ref()
            .and_then(|id| self.catalog.get(id))
            .map(|load| load.loadboard_rate);

        let draft = OutcomeDraft {
            carrier_id,
            load_id,
            final_price,
            accepted,
            rounds,
            transcript_summary: summarize_transcript(&report.transcript),
            sentiment,
            board_rate,
            entities,
        };

        let entry = self.ledger.append(draft)?;

        if let (Some(key), Some(session)) = (key, session) {
            self.sessions.archive_if_terminal(&key, session.id());
        }

        Ok(entry.outcome)
    }

    pub fn metrics(&self, query: &MetricsQuery) -> MetricsSnapshot {
        summarize(&self.ledger.all(), query)
    }

    /// Metrics for the unauthenticated dashboard
    pub fn dashboard(&self, query: &MetricsQuery) -> Result<MetricsSnapshot> {
        if !self.config.public_dashboard {
            return Err(RateDeskError::DashboardDisabled);
        }
        Ok(self.metrics(query))
    }

    /// Serve the HTTP API until Ctrl+C
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.socket_addr();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("ratedesk listening on {}", listener.local_addr()?);

        axum::serve(listener, api::router(self))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("ratedesk stopped");
        Ok(())
    }
}

fn summarize_transcript(transcript: &str) -> String {
    let trimmed = transcript.trim();
    match trimmed.char_indices().nth(SUMMARY_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
