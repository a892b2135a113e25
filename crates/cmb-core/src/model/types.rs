/// Normalized request for a single prompt completion.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    /// Model tier / name understood by the provider (e.g. `gpt-4o`).
    pub model: String,
    /// Persona instruction.
    pub system: String,
    /// The rendered user instruction.
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Every way a generation call can fail, as data.
///
/// The orchestrator only distinguishes [`GenerationError::Timeout`] (a "still thinking"
/// fallback) from everything else (a "something broke" fallback), but keeping the
/// variants apart makes the logs useful.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation timed out")]
    Timeout,

    #[error("generation backend rate limited the request")]
    RateLimited,

    #[error("generation backend error: {0}")]
    Server(String),

    #[error("generation transport error: {0}")]
    Transport(String),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("generation backend returned empty text")]
    Empty,
}

impl GenerationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::Timeout)
    }
}

/// Per-path generation knobs (help replies and ticker breakdowns use different ones).
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationSettings {
    pub fn request(&self, system: String, user: String) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            system,
            user,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}
