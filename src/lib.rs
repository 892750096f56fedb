//! Natural-language community search pipeline
//!
//! This library contains all the core modules for the search pipeline
//! service: intent classification, entity extraction, the LLM gateway,
//! hybrid semantic/keyword search, and response formatting.

use std::sync::Arc;

use sqlx::SqlitePool;

pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::{EmbeddingCache, LLMGateway, Orchestrator, SearchEngine};

/// Application shared state.
///
/// Design Philosophy: Keep it simple - Rust's type system IS our DI container.
/// All services are wrapped in Arc for cheap cloning and thread safety.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub orchestrator: Arc<Orchestrator>,
    pub llm_gateway: Arc<LLMGateway>,
    pub embedding_cache: Arc<EmbeddingCache>,
    pub config: Arc<Config>,
}
