//! CLI command definitions

use crate::carrier::DEFAULT_FMCSA_BASE_URL;
use crate::metrics::DEFAULT_RECENT_WINDOW;
use crate::negotiation::DEFAULT_MAX_ROUNDS;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ratedesk")]
#[command(about = "ratedesk - inbound carrier rate negotiation desk", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the negotiation HTTP service
    Serve(ServeArgs),

    /// Evaluate a single offer offline
    Evaluate {
        /// Board rate of the load
        #[arg(short, long)]
        board_rate: Decimal,

        /// Carrier offer, e.g. 1350 or "$1,350"
        #[arg(short, long)]
        offer: String,

        /// Negotiation round (1-based)
        #[arg(short, long, default_value_t = 1)]
        round: u32,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Search the load catalog
    Loads {
        /// Loads file (JSON array)
        #[arg(long, env = "LOADS_FILE", default_value = "./data/loads.json")]
        loads_file: PathBuf,

        /// Origin contains
        #[arg(long)]
        origin: Option<String>,

        /// Destination contains
        #[arg(long)]
        destination: Option<String>,

        /// Maximum trip miles
        #[arg(long)]
        max_miles: Option<f64>,
    },
}

/// Negotiation tunables
#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// Rounds before a too-high offer is rejected
    #[arg(long, env = "MAX_ROUNDS", default_value_t = DEFAULT_MAX_ROUNDS)]
    pub max_rounds: u32,

    /// Accepted margin over the board rate, as a fraction
    #[arg(long, env = "MAX_OVER_PCT", default_value = "0.10")]
    pub max_over_pct: Decimal,
}

/// Settings for `serve`; each flag falls back to an environment variable
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind_addr: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Key callers must send in the x-api-key header
    #[arg(long, env = "API_KEY", default_value = "test-api-key", hide_env_values = true)]
    pub api_key: String,

    /// FMCSA web key; carrier checks use mock snapshots without it
    #[arg(long, env = "FMCSA_WEBKEY", hide_env_values = true)]
    pub fmcsa_webkey: Option<String>,

    /// FMCSA QCMobile base URL
    #[arg(long, env = "FMCSA_BASE_URL", default_value = DEFAULT_FMCSA_BASE_URL)]
    pub fmcsa_base_url: String,

    /// Loads file (JSON array)
    #[arg(long, env = "LOADS_FILE", default_value = "./data/loads.json")]
    pub loads_file: PathBuf,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Calls listed under recent calls in metrics
    #[arg(long, env = "RECENT_WINDOW", default_value_t = DEFAULT_RECENT_WINDOW)]
    pub recent_window: usize,

    /// Serve dashboard data without an API key
    #[arg(long, env = "PUBLIC_DASHBOARD", default_value = "false", action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub public_dashboard: bool,

    /// Extract entities and sentiment from call transcripts
    #[arg(long, env = "ENABLE_NLP", default_value = "true", action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub enable_nlp: bool,
}
