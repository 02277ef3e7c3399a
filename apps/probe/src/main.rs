mod main_lib;

use main_lib::{build_registry, init_tracing, run_probe};
use tradeboard_market_data::MarketDataConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = MarketDataConfig::from_env()?;
    tracing::info!(
        "Loaded {} provider(s), health timeout {:?}",
        config.providers.len(),
        config.health_check_timeout()
    );

    let registry = build_registry(&config).await;
    let report = run_probe(&registry).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
