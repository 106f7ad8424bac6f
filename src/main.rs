//! diligence - CLI entry point
//!
//! Reads a deal description from a JSON file, runs the full agent pipeline,
//! and prints the run report as JSON on stdout.

use std::sync::Arc;

use diligence::llm::OpenRouterClient;
use diligence::pipeline::{DealInput, Pipeline};
use diligence::{agents, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diligence=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: diligence <deal.json>"))?;
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("cannot read {path}: {e}"))?;
    let deal: DealInput = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("invalid deal file {path}: {e}"))?;

    let config = Config::from_env()?;
    info!(
        company = %deal.company,
        timeout_ms = config.agent_timeout_ms,
        concurrency = config.max_tier_concurrency,
        "Configuration loaded"
    );

    let llm = Arc::new(OpenRouterClient::new(
        config.api_key.clone(),
        config.models.clone(),
    ));
    let pipeline = Pipeline::new(agents::default_registry(), &config, llm)?;

    let report = pipeline.run(deal).await;
    println!("{}", serde_json::to_string_pretty(&report.to_json())?);

    Ok(())
}
