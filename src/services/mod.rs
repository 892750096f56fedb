pub mod embedding_cache;
pub mod hybrid_extractor;
pub mod intent_classifier;
pub mod llm;
pub mod normalizers;
pub mod orchestrator;
pub mod regex_extractor;
pub mod response_formatter;
pub mod search;
pub mod suggestion_engine;

pub use embedding_cache::EmbeddingCache;
pub use llm::LLMGateway;
pub use orchestrator::{Orchestrator, PipelineError};
pub use search::SearchEngine;
