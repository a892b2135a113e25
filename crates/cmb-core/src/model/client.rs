use std::time::Duration;

use async_trait::async_trait;

use super::types::{GenerationError, GenerationRequest};

/// Hexagonal port for a prompt-completion backend (OpenAI today).
///
/// Implementations return the generated text already trimmed. Timeouts enforced by
/// the caller drop the returned future, so implementations must be cancel-safe.
#[async_trait]
pub trait GenerationPort: Send + Sync {
    fn provider(&self) -> &str;

    async fn generate(&self, req: GenerationRequest) -> Result<String, GenerationError>;
}

/// Run `req` with an upper bound on wall time.
///
/// On expiry the in-flight call is dropped (which aborts the HTTP request) and
/// [`GenerationError::Timeout`] is returned. Blank output is reported as
/// [`GenerationError::Empty`].
pub async fn generate_with_timeout(
    generator: &dyn GenerationPort,
    req: GenerationRequest,
    limit: Duration,
) -> Result<String, GenerationError> {
    let text = match tokio::time::timeout(limit, generator.generate(req)).await {
        Ok(res) => res?,
        Err(_) => return Err(GenerationError::Timeout),
    };
    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(text.to_string())
}
