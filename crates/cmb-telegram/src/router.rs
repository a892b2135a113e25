use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use cmb_core::messaging::throttled::{ThrottleConfig, ThrottledMessenger};
use cmb_core::{
    config::Config,
    market::MarketDataPort,
    messaging::port::MessagingPort,
    model::GenerationPort,
    onboarding::Onboarding,
    orchestrator::Orchestrator,
};

use crate::handlers;
use crate::TelegramMessenger;

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub onboarding: Onboarding,
}

impl AppState {
    pub fn new(
        cfg: &Config,
        messenger: Arc<dyn MessagingPort>,
        generator: Arc<dyn GenerationPort>,
        market: Arc<dyn MarketDataPort>,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::from_config(cfg, messenger.clone(), generator, market),
            onboarding: Onboarding::new(
                messenger,
                cfg.facts.clone(),
                cfg.welcome_step_delay,
                cfg.welcome_enabled,
            ),
        }
    }
}

fn throttle_config(cfg: &Config) -> ThrottleConfig {
    ThrottleConfig {
        global_min_interval: cfg.telegram_global_interval,
        per_chat_min_interval: cfg.telegram_per_chat_interval,
        ..ThrottleConfig::default()
    }
}

pub async fn run_polling(
    cfg: Arc<Config>,
    generator: Arc<dyn GenerationPort>,
    market: Arc<dyn MarketDataPort>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "bot started"),
        Err(e) => warn!(error = %e, "could not fetch bot identity"),
    }
    info!(
        model = %cfg.openai_model,
        provider = generator.provider(),
        topics = cfg.trigger_order.len(),
        cooldown_secs = cfg.rate_limit_cooldown.as_secs(),
        cache_size = cfg.reply_cache_size,
        welcome = cfg.welcome_enabled,
        "configuration loaded"
    );

    // Wrap the raw Telegram messenger with a throttling decorator so reply bursts and
    // onboarding sequences stay under flood limits. 429 RetryAfter is still retried
    // at the Telegram adapter layer.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        throttle_config(&cfg),
    ));

    let state = Arc::new(AppState::new(&cfg, messenger, generator, market));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .branch(Update::filter_chat_member().endpoint(handlers::handle_chat_member));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("dispatcher stopped");
    Ok(())
}
