//! Per-message response pipeline.

use std::{sync::Arc, time::Duration};

use tracing::{debug, error, info, trace, warn};

use crate::{
    cache::{CacheKeyMode, ReplyCache},
    config::{
        Config, DEFAULT_MAX_TRACKED_USERS, DEFAULT_RATE_LIMIT_COOLDOWN, DEFAULT_REPLY_CACHE_SIZE,
    },
    domain::{ChatId, MessageRef},
    enrichment::TickerEnricher,
    market::MarketDataPort,
    messaging::{
        port::MessagingPort,
        types::{clamp_message, ChatAction, TextFormat, TextMessage},
    },
    model::{generate_with_timeout, GenerationPort, GenerationSettings},
    prompts::{Fallback, ProjectFacts},
    ratelimit::CooldownLimiter,
    ticker::{TickerDetector, TickerQuery},
    triggers::{Classifier, TriggerCategory, TriggerSet},
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    Empty,
    Unmatched,
}

/// Terminal state of one inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Dropped(DropReason),
    /// Spam. `removed` is false when the platform refused the delete.
    Deleted { removed: bool },
    RateLimited,
    CacheHit,
    Generated,
    TimedOut,
    Failed,
    /// Ticker breakdown delivered; `found` tells whether market data was available.
    Ticker { found: bool },
}

/// Settings for generated help replies.
#[derive(Clone, Debug)]
pub struct ReplySettings {
    pub generation: GenerationSettings,
    pub timeout: Duration,
    pub typing_delay: Duration,
    pub cache_key_mode: CacheKeyMode,
    pub facts: ProjectFacts,
}

impl ReplySettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            generation: GenerationSettings {
                model: cfg.openai_model.clone(),
                max_tokens: cfg.reply_max_tokens,
                temperature: cfg.reply_temperature,
            },
            timeout: cfg.generation_timeout,
            typing_delay: cfg.typing_delay,
            cache_key_mode: cfg.cache_key_mode,
            facts: cfg.facts.clone(),
        }
    }
}

/// Routes each message through triage, the per-user cooldown, the reply cache
/// and the generation backend.
///
/// Messages are handled independently and concurrently. The cooldown spaces
/// admitted messages of one user, but two admitted messages may still be
/// answered out of order when the earlier backend call is the slower one.
pub struct Orchestrator {
    messenger: Arc<dyn MessagingPort>,
    generator: Arc<dyn GenerationPort>,
    enricher: TickerEnricher,
    classifier: Classifier,
    limiter: CooldownLimiter,
    cache: ReplyCache,
    reply: ReplySettings,
}

impl Orchestrator {
    /// Default triage, cooldown and cache size; see the `with_*` methods.
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        generator: Arc<dyn GenerationPort>,
        enricher: TickerEnricher,
        reply: ReplySettings,
    ) -> Self {
        Self {
            messenger,
            generator,
            enricher,
            classifier: Classifier::default(),
            limiter: CooldownLimiter::new(DEFAULT_RATE_LIMIT_COOLDOWN, DEFAULT_MAX_TRACKED_USERS),
            cache: ReplyCache::new(DEFAULT_REPLY_CACHE_SIZE),
            reply,
        }
    }

    pub fn from_config(
        cfg: &Config,
        messenger: Arc<dyn MessagingPort>,
        generator: Arc<dyn GenerationPort>,
        market: Arc<dyn MarketDataPort>,
    ) -> Self {
        let enricher = TickerEnricher::new(
            market,
            generator.clone(),
            GenerationSettings {
                model: cfg.openai_model.clone(),
                max_tokens: cfg.ticker_max_tokens,
                temperature: cfg.ticker_temperature,
            },
            cfg.generation_timeout,
            cfg.facts.clone(),
        );

        let mut triggers = TriggerSet::with_order(&cfg.trigger_order);
        if let Some(spam) = &cfg.spam_phrases {
            triggers = triggers.with_spam_phrases(spam.clone());
        }
        let detector = match &cfg.ticker_keywords {
            Some(k) => TickerDetector::new(k.clone()),
            None => TickerDetector::default(),
        };

        Self::new(messenger, generator, enricher, ReplySettings::from_config(cfg))
            .with_classifier(Classifier::new(triggers, detector))
            .with_limiter(CooldownLimiter::new(
                cfg.rate_limit_cooldown,
                cfg.rate_limit_max_tracked_users,
            ))
            .with_cache(ReplyCache::new(cfg.reply_cache_size))
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_limiter(mut self, limiter: CooldownLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_cache(mut self, cache: ReplyCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &ReplyCache {
        &self.cache
    }

    pub fn limiter(&self) -> &CooldownLimiter {
        &self.limiter
    }

    /// Handle one inbound text message. Never fails: every problem ends in an [`Outcome`].
    pub async fn handle_text(&self, msg: &TextMessage) -> Outcome {
        let text = msg.text.trim();
        if text.is_empty() {
            return Outcome::Dropped(DropReason::Empty);
        }
        let Some(hit) = self.classifier.classify(text) else {
            trace!(chat_id = msg.chat_id.0, "no trigger, ignored");
            return Outcome::Dropped(DropReason::Unmatched);
        };

        // Spam bypasses the limiter.
        match &hit.category {
            TriggerCategory::Spam => self.remove_spam(msg, &hit.phrase).await,
            _ if !self.limiter.admit(msg.user_id) => {
                debug!(user = %msg.sender_label(), phrase = %hit.phrase, "rate limited");
                Outcome::RateLimited
            }
            TriggerCategory::Ticker(query) => self.answer_ticker(msg, query).await,
            TriggerCategory::Topic(_) => self.answer_topic(msg, &hit.phrase).await,
        }
    }

    async fn remove_spam(&self, msg: &TextMessage, phrase: &str) -> Outcome {
        match self.messenger.delete_message(msg.message_ref()).await {
            Ok(()) => {
                info!(user = %msg.sender_label(), phrase, "deleted spam");
                Outcome::Deleted { removed: true }
            }
            Err(e) => {
                warn!(user = %msg.sender_label(), phrase, error = %e, "could not delete spam");
                Outcome::Deleted { removed: false }
            }
        }
    }

    async fn answer_topic(&self, msg: &TextMessage, phrase: &str) -> Outcome {
        let key = self.reply.cache_key_mode.key(phrase, &msg.text);

        if let Some(cached) = self.cache.get(&key) {
            info!(user = %msg.sender_label(), key = %key, "cache hit");
            self.deliver_logged(msg, &cached).await;
            return Outcome::CacheHit;
        }

        self.show_typing(msg.chat_id).await;
        if !self.reply.typing_delay.is_zero() {
            tokio::time::sleep(self.reply.typing_delay).await;
        }

        let facts = &self.reply.facts;
        let req = self
            .reply
            .generation
            .request(facts.persona(), facts.help_prompt(&msg.text));

        match generate_with_timeout(self.generator.as_ref(), req, self.reply.timeout).await {
            Ok(reply) => {
                self.cache.put(key, reply.clone());
                info!(user = %msg.sender_label(), provider = self.generator.provider(), "generated reply");
                self.deliver_logged(msg, &reply).await;
                Outcome::Generated
            }
            Err(e) if e.is_timeout() => {
                warn!(user = %msg.sender_label(), timeout_ms = self.reply.timeout.as_millis() as u64, "generation timed out");
                self.deliver_logged(msg, &facts.fallback(Fallback::ReplyTimeout))
                    .await;
                Outcome::TimedOut
            }
            Err(e) => {
                error!(user = %msg.sender_label(), provider = self.generator.provider(), error = ?e, "generation failed");
                self.deliver_logged(msg, &facts.fallback(Fallback::ReplyFailure))
                    .await;
                Outcome::Failed
            }
        }
    }

    async fn answer_ticker(&self, msg: &TextMessage, query: &TickerQuery) -> Outcome {
        self.show_typing(msg.chat_id).await;

        let report = self.enricher.enrich(query).await;
        if let Err(e) = &report.analysis {
            warn!(token = %query.display(), error = %e, "ticker breakdown unavailable");
        }
        info!(
            user = %msg.sender_label(),
            token = %query.display(),
            found = report.snapshot.found,
            "ticker breakdown"
        );

        self.deliver_logged(msg, &self.enricher.render(&report))
            .await;
        Outcome::Ticker {
            found: report.snapshot.found,
        }
    }

    async fn show_typing(&self, chat_id: ChatId) {
        if !self.messenger.capabilities().supports_chat_actions {
            return;
        }
        if let Err(e) = self
            .messenger
            .send_chat_action(chat_id, ChatAction::Typing)
            .await
        {
            debug!(chat_id = chat_id.0, error = %e, "typing indicator failed");
        }
    }

    /// Reply to `msg` with plain text, cut to the messenger's length limit.
    async fn deliver(&self, msg: &TextMessage, text: &str) -> Result<MessageRef> {
        let max = self.messenger.capabilities().max_message_len;
        let text = clamp_message(text, max);
        self.messenger
            .send_text(msg.chat_id, &text, TextFormat::Plain, Some(msg.message_id))
            .await
    }

    async fn deliver_logged(&self, msg: &TextMessage, text: &str) {
        if let Err(e) = self.deliver(msg, text).await {
            warn!(chat_id = msg.chat_id.0, user = %msg.sender_label(), error = %e, "could not deliver reply");
        }
    }
}
