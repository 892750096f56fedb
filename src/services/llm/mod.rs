//! Multi-provider LLM gateway: priority ordering, retry, and circuit
//! breaking per provider.

pub mod circuit;
pub mod client;
pub mod gateway;
pub mod models;

pub use client::strip_code_fences;
pub use gateway::LLMGateway;
pub use models::{ChatMessage, GenerateOutcome, LLMError, ProviderConfig};
