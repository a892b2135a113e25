//! Provider-agnostic text generation port.

pub mod client;
pub mod types;

pub use client::{generate_with_timeout, GenerationPort};
pub use types::{GenerationError, GenerationRequest, GenerationSettings};
