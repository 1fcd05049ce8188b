//! ratedesk CLI binary

use anyhow::Context;
use clap::Parser;
use ratedesk::cli::{Cli, Commands, RateDeskApp};
use ratedesk::negotiation::{parse_offer, NegotiationEngine, NegotiationPolicy, OfferInput};
use ratedesk::{DeskConfig, InMemoryCatalog, LoadCatalog, LoadFilter};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            let config = DeskConfig::try_from(args).context("invalid serve configuration")?;
            tracing::info!(
                "Starting ratedesk on {} (max rounds {}, margin {})",
                config.socket_addr(),
                config.policy.max_rounds(),
                config.policy.max_over_pct()
            );

            let app = RateDeskApp::new(config).context("failed to start ratedesk")?;
            app.serve().await?;
        }

        Commands::Evaluate {
            board_rate,
            offer,
            round,
            policy,
        } => {
            let policy = NegotiationPolicy::try_from(policy)?;
            let offer = parse_offer(&OfferInput::Text(offer))?;
            let verdict = NegotiationEngine::new(policy).evaluate(board_rate, offer, round)?;

            let report = json!({
                "board_rate": board_rate,
                "offer": offer,
                "round": round,
                "ceiling": policy.ceiling(board_rate),
                "result": verdict,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Loads {
            loads_file,
            origin,
            destination,
            max_miles,
        } => {
            let catalog = InMemoryCatalog::from_json_file(&loads_file)
                .with_context(|| format!("failed to read {}", loads_file.display()))?;
            let filter = LoadFilter {
                origin,
                destination,
                max_miles,
            };

            let loads = catalog.search(&filter);
            tracing::info!("{} of {} loads match", loads.len(), catalog.len());
            println!("{}", serde_json::to_string_pretty(&loads)?);
        }
    }

    Ok(())
}
