//! Carrier identity verification against the FMCSA registry

use crate::error::{RateDeskError, Result};
use crate::types::CarrierId;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const DEFAULT_FMCSA_BASE_URL: &str = "https://mobile.fmcsa.dot.gov/qc/services/";
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(8);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 3600);

/// Where a snapshot came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    Fmcsa,
    Mock,
}

/// What the registry knows about a carrier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierSnapshot {
    pub mc_number: CarrierId,
    pub legal_name: Option<String>,
    pub allow_to_operate: Option<String>,
    pub out_of_service: Option<String>,
    pub snapshot_date: String,
    pub source: SnapshotSource,
    /// Registry payload as received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

fn is_affirmative(flag: Option<&str>) -> bool {
    flag.map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "true"))
        .unwrap_or(false)
}

impl CarrierSnapshot {
    /// Stand-in snapshot used whenever the registry is not consulted
    pub fn mock(mc_number: &CarrierId) -> Self {
        Self {
            mc_number: mc_number.clone(),
            legal_name: Some(format!("Mock Carrier {}", mc_number)),
            allow_to_operate: Some("Y".to_string()),
            out_of_service: Some("N".to_string()),
            snapshot_date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            source: SnapshotSource::Mock,
            raw: None,
        }
    }

    /// Mock snapshots always pass; real ones must be authorized and in service
    pub fn is_eligible(&self) -> bool {
        match self.source {
            SnapshotSource::Mock => true,
            SnapshotSource::Fmcsa => {
                is_affirmative(self.allow_to_operate.as_deref())
                    && !is_affirmative(self.out_of_service.as_deref())
            }
        }
    }

    /// Interpret an FMCSA company snapshot. The carrier record may sit under
    /// `content.carrier`; a flat object is also accepted.
    pub fn from_registry(mc_number: &CarrierId, payload: Value) -> Result<Self> {
        let root = payload.as_object().ok_or_else(|| {
            RateDeskError::CarrierLookup(format!("unexpected registry payload for {}", mc_number))
        })?;
        let carrier = root
            .get("content")
            .and_then(|c| c.get("carrier"))
            .and_then(Value::as_object)
            .unwrap_or(root);

        let field = |record: &Map<String, Value>, names: &[&str]| -> Option<String> {
            names.iter().find_map(|name| match record.get(*name)? {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
        };

        let legal_name = field(carrier, &["legalName"]);
        let allow_to_operate = field(carrier, &["allowedToOperate", "allowToOperate"]);
        let out_of_service = field(carrier, &["outOfService"]);

        Ok(Self {
            mc_number: mc_number.clone(),
            legal_name,
            allow_to_operate,
            out_of_service,
            snapshot_date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            source: SnapshotSource::Fmcsa,
            raw: Some(payload),
        })
    }
}

/// Identity check for carriers calling in
#[async_trait]
pub trait CarrierVerifier: Send + Sync {
    /// Registry snapshot; never fails, falling back to a mock snapshot
    async fn lookup(&self, carrier_id: &CarrierId) -> CarrierSnapshot;

    async fn is_valid(&self, carrier_id: &CarrierId) -> bool {
        self.lookup(carrier_id).await.is_eligible()
    }
}

/// Verifier used when no registry key is configured
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackVerifier;

#[async_trait]
impl CarrierVerifier for FallbackVerifier {
    async fn lookup(&self, carrier_id: &CarrierId) -> CarrierSnapshot {
        CarrierSnapshot::mock(carrier_id)
    }
}

/// Verifier backed by the FMCSA QCMobile API, with a per-carrier cache
pub struct LiveVerifier {
    client: reqwest::Client,
    web_key: String,
    base_url: String,
    cache_ttl: Duration,
    cache: RwLock<HashMap<CarrierId, (Instant, CarrierSnapshot)>>,
}

impl LiveVerifier {
    pub fn new(web_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(web_key, base_url, DEFAULT_LOOKUP_TIMEOUT, DEFAULT_CACHE_TTL)
    }

    pub fn with_timeouts(
        web_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
        cache_ttl: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RateDeskError::Configuration(format!("http client: {}", e)))?;

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client,
            web_key: web_key.into(),
            base_url,
            cache_ttl,
            cache: RwLock::new(HashMap::new()),
        })
    }

    async fn fetch(&self, carrier_id: &CarrierId) -> Result<CarrierSnapshot> {
        let url = format!("{}companySnapshot", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("webKey", self.web_key.as_str()), ("mcNumber", carrier_id.0.as_str())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RateDeskError::CarrierLookup(e.to_string()))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| RateDeskError::CarrierLookup(e.to_string()))?;

        CarrierSnapshot::from_registry(carrier_id, payload)
    }
}

#[async_trait]
impl CarrierVerifier for LiveVerifier {
    async fn lookup(&self, carrier_id: &CarrierId) -> CarrierSnapshot {
        if let Some((stored_at, snapshot)) = self.cache.read().await.get(carrier_id) {
            if stored_at.elapsed() < self.cache_ttl {
                return snapshot.clone();
            }
        }

        let snapshot = match self.fetch(carrier_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("FMCSA lookup for MC {} failed, using mock: {}", carrier_id, e);
                CarrierSnapshot::mock(carrier_id)
            }
        };

        self.cache
            .write()
            .await
            .insert(carrier_id.clone(), (Instant::now(), snapshot.clone()));
        snapshot
    }
}

/// Live verifier when a registry key is configured, fallback otherwise
pub fn select_verifier(
    web_key: Option<&str>,
    base_url: &str,
) -> Result<Box<dyn CarrierVerifier>> {
    match web_key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => {
            tracing::info!("Carrier verification: FMCSA registry at {}", base_url);
            Ok(Box::new(LiveVerifier::new(key, base_url)?))
        }
        None => {
            tracing::info!("Carrier verification: no FMCSA key, using mock snapshots");
            Ok(Box::new(FallbackVerifier))
        }
    }
}
