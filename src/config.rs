//! Validated service configuration

use crate::carrier::DEFAULT_FMCSA_BASE_URL;
use crate::cli::commands::{PolicyArgs, ServeArgs};
use crate::error::{RateDeskError, Result};
use crate::metrics::DEFAULT_RECENT_WINDOW;
use crate::negotiation::NegotiationPolicy;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct DeskConfig {
    pub api_key: String,
    pub fmcsa_webkey: Option<String>,
    pub fmcsa_base_url: String,
    pub loads_file: PathBuf,
    pub policy: NegotiationPolicy,
    pub recent_window: usize,
    pub public_dashboard: bool,
    pub enable_nlp: bool,
    pub bind_addr: IpAddr,
    pub port: u16,
}

impl DeskConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            api_key: "test-api-key".to_string(),
            fmcsa_webkey: None,
            fmcsa_base_url: DEFAULT_FMCSA_BASE_URL.to_string(),
            loads_file: PathBuf::from("./data/loads.json"),
            policy: NegotiationPolicy::default(),
            recent_window: DEFAULT_RECENT_WINDOW,
            public_dashboard: false,
            enable_nlp: true,
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: 8000,
        }
    }
}

impl TryFrom<PolicyArgs> for NegotiationPolicy {
    type Error = RateDeskError;

    fn try_from(args: PolicyArgs) -> Result<Self> {
        NegotiationPolicy::new(args.max_rounds, args.max_over_pct)
    }
}

impl TryFrom<ServeArgs> for DeskConfig {
    type Error = RateDeskError;

    fn try_from(args: ServeArgs) -> Result<Self> {
        let api_key = args.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(RateDeskError::InvalidConfig(
                "API key must not be empty".to_string(),
            ));
        }
        if args.recent_window == 0 {
            return Err(RateDeskError::InvalidConfig(
                "recent window must be at least 1".to_string(),
            ));
        }

        let bind_addr: IpAddr = args.bind_addr.trim().parse().map_err(|_| {
            RateDeskError::InvalidConfig(format!("invalid bind address {:?}", args.bind_addr))
        })?;

        Ok(Self {
            api_key,
            fmcsa_webkey: args
                .fmcsa_webkey
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            fmcsa_base_url: args.fmcsa_base_url,
            loads_file: args.loads_file,
            policy: args.policy.try_into()?,
            recent_window: args.recent_window,
            public_dashboard: args.public_dashboard,
            enable_nlp: args.enable_nlp,
            bind_addr,
            port: args.port,
        })
    }
}
