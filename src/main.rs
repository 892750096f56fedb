use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use communitylens::config::Config;
use communitylens::db;
use communitylens::models;
use communitylens::services::search::embedding_provider::HttpEmbeddingProvider;
use communitylens::services::search::repository::MemberRepository;
use communitylens::services::{EmbeddingCache, LLMGateway, Orchestrator, SearchEngine};
use communitylens::utils::ScheduledExecutor;
use communitylens::{handlers, AppState};

#[derive(OpenApi)]
#[openapi(
    paths(handlers::search::search, handlers::llm::status),
    components(schemas(
        models::SearchRequest,
        models::RequestContext,
        models::SearchOptions,
        models::ExtractedEntities,
        models::TurnoverTier,
        models::Intent,
        models::IntentMetadata,
        models::Understanding,
        models::ScoredMember,
        models::MemberRecord,
        models::Pagination,
        models::ResultsBlock,
        models::ResponseBlock,
        models::ExtractionMethod,
        models::PerformanceBlock,
        models::NlSearchResult,
        models::ProviderHealth,
        models::CircuitState,
        handlers::llm::LlmStatusResponse,
    )),
    tags(
        (name = "search", description = "Natural-language community search"),
        (name = "llm", description = "LLM provider health"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);
    let registry = tracing_subscriber::registry().with(log_filter);

    if let Some(log_file) = &config.logging.file {
        let log_path = std::path::Path::new(log_file);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let log_dir = log_path.parent().and_then(|p| p.to_str()).unwrap_or("logs");
        let file_name = log_path.file_name().and_then(|n| n.to_str()).unwrap_or("nl-search.log");
        let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("nl-search-pipeline starting up");

    let pool = db::create_pool(&config.database.url).await?;
    db::bootstrap_schema(&pool).await?;
    tracing::info!("database pool ready");

    let embedding_cache =
        Arc::new(EmbeddingCache::new(config.embedding_cache.capacity, config.embedding_cache.ttl()));

    let embedding_provider: Arc<dyn communitylens::services::search::EmbeddingProvider> =
        Arc::new(HttpEmbeddingProvider::new(
            config.embedding_provider.api_base.clone(),
            config.embedding_provider.model.clone(),
            config.embedding_provider.dimension,
        ));

    let repository = MemberRepository::new(pool.clone());
    let search_engine =
        Arc::new(SearchEngine::new(repository, Arc::clone(&embedding_cache), embedding_provider));

    let llm_gateway = Arc::new(LLMGateway::new(
        config.llm.providers.clone(),
        config.llm.circuit_failure_threshold,
        config.llm.circuit_cooldown(),
    ));
    tracing::info!(providers = config.llm.providers.len(), "llm gateway initialized");

    let orchestrator = Arc::new(Orchestrator::new(
        if llm_gateway.has_providers() { Some(Arc::clone(&llm_gateway)) } else { None },
        Arc::clone(&search_engine),
        config.pipeline.soft_timeout(),
        config.pipeline.hard_timeout(),
    ));

    let config = Arc::new(config);
    let app_state = AppState {
        db: pool.clone(),
        orchestrator: Arc::clone(&orchestrator),
        llm_gateway: Arc::clone(&llm_gateway),
        embedding_cache: Arc::clone(&embedding_cache),
        config: Arc::clone(&config),
    };

    let sweep_task = communitylens::services::embedding_cache::CacheSweepTask::new(Arc::clone(&embedding_cache));
    let sweep_executor = ScheduledExecutor::new("embedding-cache-sweep", std::time::Duration::from_secs(300));
    tokio::spawn(async move {
        sweep_executor.start(Arc::new(sweep_task)).await;
    });

    let app = Router::new()
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/search", post(handlers::search::search))
        .route("/api/llm/status", get(handlers::llm::status))
        .route("/healthz", get(health_check))
        .with_state(app_state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("server listening on http://{}", addr);
    tracing::info!("api documentation available at http://{}/api-docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
