/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the orchestrator
/// can decide per stage whether a failure is user-visible, recoverable or only logged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("market data error: {0}")]
    Market(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
