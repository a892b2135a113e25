use std::{env, fs, io, path::Path, time::Duration};

use crate::{
    cache::CacheKeyMode,
    errors::Error,
    prompts::ProjectFacts,
    triggers::{parse_order, TopicGroup},
    Result,
};

pub const DEFAULT_RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_TRACKED_USERS: usize = 10_000;
pub const DEFAULT_REPLY_CACHE_SIZE: usize = 50;

/// Typed configuration for the bot, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials (required)
    pub telegram_bot_token: String,
    pub openai_api_key: String,
    pub birdeye_api_key: String,

    // Generation backend
    pub openai_model: String,
    pub openai_base_url: String,
    pub reply_max_tokens: u32,
    pub reply_temperature: f32,
    pub ticker_max_tokens: u32,
    pub ticker_temperature: f32,
    pub generation_timeout: Duration,
    pub typing_delay: Duration,

    // Rate limiting
    pub rate_limit_cooldown: Duration,
    pub rate_limit_max_tracked_users: usize,

    // Reply cache
    pub reply_cache_size: usize,
    pub cache_key_mode: CacheKeyMode,

    // Triage
    pub trigger_order: Vec<TopicGroup>,
    pub spam_phrases: Option<Vec<String>>,
    pub ticker_keywords: Option<Vec<String>>,

    // Market data
    pub birdeye_base_url: String,
    pub market_chain: String,
    pub market_timeout: Duration,

    // Onboarding
    pub welcome_enabled: bool,
    pub welcome_step_delay: Duration,

    // Project facts used in prompts and onboarding
    pub facts: ProjectFacts,

    // Telegram outbound throttling
    pub telegram_per_chat_interval: Duration,
    pub telegram_global_interval: Duration,
}

impl Config {
    /// Load from the process environment, after applying `.env` if present.
    ///
    /// Missing credentials and an unreadable `.env` are fatal.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"))?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production, a map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env { get: &get };

        let telegram_bot_token = env
            .non_empty("TELEGRAM_BOT_TOKEN")
            .or_else(|| env.non_empty("BOT_TOKEN"))
            .ok_or_else(|| required("TELEGRAM_BOT_TOKEN"))?;
        let openai_api_key = env
            .non_empty("OPENAI_API_KEY")
            .ok_or_else(|| required("OPENAI_API_KEY"))?;
        let birdeye_api_key = env
            .non_empty("BIRDEYE_API_KEY")
            .ok_or_else(|| required("BIRDEYE_API_KEY"))?;

        let openai_model = env
            .non_empty("OPENAI_MODEL")
            .unwrap_or_else(|| "gpt-4o".to_string());
        let openai_base_url = env
            .non_empty("OPENAI_BASE_URL")
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        let reply_max_tokens = env.parse::<u32>("REPLY_MAX_TOKENS").unwrap_or(160).max(1);
        let reply_temperature = clamp_temperature(env.parse::<f32>("REPLY_TEMPERATURE").unwrap_or(0.85));
        let ticker_max_tokens = env.parse::<u32>("TICKER_MAX_TOKENS").unwrap_or(200).max(1);
        let ticker_temperature =
            clamp_temperature(env.parse::<f32>("TICKER_TEMPERATURE").unwrap_or(0.9));
        let generation_timeout = match env.parse::<u64>("GENERATION_TIMEOUT_MS") {
            Some(0) => {
                return Err(Error::Config(
                    "GENERATION_TIMEOUT_MS must be greater than zero".to_string(),
                ))
            }
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_secs(10),
        };
        let typing_delay = Duration::from_millis(env.parse::<u64>("TYPING_DELAY_MS").unwrap_or(2_000));

        let rate_limit_cooldown = env
            .parse::<u64>("RATE_LIMIT_COOLDOWN_SECS")
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RATE_LIMIT_COOLDOWN);
        let rate_limit_max_tracked_users = env
            .parse::<usize>("RATE_LIMIT_MAX_TRACKED_USERS")
            .unwrap_or(DEFAULT_MAX_TRACKED_USERS);

        let reply_cache_size = env
            .parse::<usize>("REPLY_CACHE_SIZE")
            .unwrap_or(DEFAULT_REPLY_CACHE_SIZE);
        let cache_key_mode = match env.non_empty("CACHE_KEY_MODE") {
            None => CacheKeyMode::default(),
            Some(v) => match v.trim().to_lowercase().as_str() {
                "trigger" => CacheKeyMode::Trigger,
                "text" => CacheKeyMode::Text,
                other => {
                    return Err(Error::Config(format!(
                        "CACHE_KEY_MODE must be `trigger` or `text`, got `{other}`"
                    )))
                }
            },
        };

        let trigger_order = match env.non_empty("TRIGGER_ORDER") {
            Some(csv) => parse_order(&csv)?,
            None => TopicGroup::ALL.to_vec(),
        };
        let spam_phrases = env.csv_lower("SPAM_PHRASES");
        let ticker_keywords = env.csv_lower("TICKER_KEYWORDS");

        let birdeye_base_url = env
            .non_empty("BIRDEYE_BASE_URL")
            .unwrap_or_else(|| "https://public-api.birdeye.so".to_string());
        let market_chain = env
            .non_empty("MARKET_CHAIN")
            .unwrap_or_else(|| "solana".to_string());
        let market_timeout = Duration::from_millis(env.parse::<u64>("MARKET_TIMEOUT_MS").unwrap_or(8_000));

        let welcome_enabled = env.bool("WELCOME_ENABLED").unwrap_or(true);
        let welcome_step_delay =
            Duration::from_millis(env.parse::<u64>("WELCOME_STEP_DELAY_MS").unwrap_or(1_000));

        let defaults = ProjectFacts::default();
        let facts = ProjectFacts {
            bot_name: env.non_empty("BOT_NAME").unwrap_or(defaults.bot_name),
            ticker: env.non_empty("PROJECT_TICKER").unwrap_or(defaults.ticker),
            buy_venue: env.non_empty("PROJECT_BUY_VENUE").unwrap_or(defaults.buy_venue),
            tax: env.non_empty("PROJECT_TAX").unwrap_or(defaults.tax),
            website: env.non_empty("PROJECT_WEBSITE").unwrap_or(defaults.website),
        };

        let telegram_per_chat_interval =
            Duration::from_millis(env.parse::<u64>("TELEGRAM_PER_CHAT_INTERVAL_MS").unwrap_or(1_050));
        let telegram_global_interval =
            Duration::from_millis(env.parse::<u64>("TELEGRAM_GLOBAL_INTERVAL_MS").unwrap_or(40));

        Ok(Self {
            telegram_bot_token,
            openai_api_key,
            birdeye_api_key,
            openai_model,
            openai_base_url,
            reply_max_tokens,
            reply_temperature,
            ticker_max_tokens,
            ticker_temperature,
            generation_timeout,
            typing_delay,
            rate_limit_cooldown,
            rate_limit_max_tracked_users,
            reply_cache_size,
            cache_key_mode,
            trigger_order,
            spam_phrases,
            ticker_keywords,
            birdeye_base_url,
            market_chain,
            market_timeout,
            welcome_enabled,
            welcome_step_delay,
            facts,
            telegram_per_chat_interval,
            telegram_global_interval,
        })
    }
}

struct Env<'a> {
    get: &'a dyn Fn(&str) -> Option<String>,
}

impl Env<'_> {
    fn non_empty(&self, key: &str) -> Option<String> {
        (self.get)(key).and_then(non_empty)
    }

    fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        (self.get)(key).and_then(|s| s.trim().parse::<T>().ok())
    }

    fn bool(&self, key: &str) -> Option<bool> {
        (self.get)(key).map(|s| {
            matches!(
                s.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
    }

    fn csv_lower(&self, key: &str) -> Option<Vec<String>> {
        let out = parse_csv_lower(self.non_empty(key));
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

fn required(key: &str) -> Error {
    Error::Config(format!("{key} environment variable is required"))
}

fn clamp_temperature(t: f32) -> f32 {
    if t.is_finite() {
        t.clamp(0.0, 2.0)
    } else {
        0.85
    }
}

/// A missing file is fine; any other read failure is returned.
fn load_dotenv_if_present(path: &Path) -> Result<()> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
    Ok(())
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_csv_lower(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
