use std::sync::Arc;

use cmb_core::{config::Config, market::MarketDataPort, model::GenerationPort};
use cmb_market::BirdeyeClient;
use cmb_openai::OpenAiClient;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), cmb_core::Error> {
    cmb_core::logging::init("cmb")?;

    let cfg = Arc::new(Config::load()?);

    let generator: Arc<dyn GenerationPort> = Arc::new(OpenAiClient::new(
        cfg.openai_api_key.clone(),
        cfg.openai_base_url.clone(),
        cfg.generation_timeout,
    )?);
    let market: Arc<dyn MarketDataPort> = Arc::new(BirdeyeClient::new(
        cfg.birdeye_api_key.clone(),
        cfg.birdeye_base_url.clone(),
        cfg.market_chain.clone(),
        cfg.market_timeout,
    )?);

    cmb_telegram::router::run_polling(cfg, generator, market)
        .await
        .map_err(|e| cmb_core::Error::External(format!("telegram bot failed: {e}")))?;

    info!("shutdown complete");
    Ok(())
}
