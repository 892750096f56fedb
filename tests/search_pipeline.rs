//! End-to-end test of the `/api/search` route: seeds a member store,
//! drives a request through the real axum router, and checks that the
//! fused ranking surfaces the matching member with the expected
//! matched-field set.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use communitylens::db;
use communitylens::services::search::embedding_provider::{EmbeddingError, EmbeddingProvider};
use communitylens::services::search::repository::MemberRepository;
use communitylens::services::{EmbeddingCache, LLMGateway, Orchestrator, SearchEngine};
use communitylens::{handlers, AppState};

/// Every query in this test is handled by the keyword leg alone, so the
/// embedding provider only needs to fail predictably rather than return a
/// real vector.
struct NoEmbeddings;

#[async_trait]
impl EmbeddingProvider for NoEmbeddings {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::ProviderError("no embedding backend in this test".to_string()))
    }

    fn model_tag(&self) -> &str {
        "test-no-embeddings"
    }

    fn dimension(&self) -> usize {
        8
    }
}

async fn build_app() -> Router {
    let pool = db::create_pool("sqlite::memory:").await.expect("create pool");
    db::bootstrap_schema(&pool).await.expect("bootstrap schema");

    sqlx::query(
        "INSERT INTO members
            (name, grad_year, degree, branch, city, organization, designation,
             skills_json, services_json, turnover_crores, is_active)
         VALUES
            ('Kavitha Raman', 1995, 'B.E', 'Mechanical', 'Chennai', 'Raman Tooling Pvt Ltd',
             'Founder', '[]', '[\"IT infrastructure\"]', 4.5, 1)",
    )
    .execute(&pool)
    .await
    .expect("seed matching member");

    sqlx::query(
        "INSERT INTO members
            (name, grad_year, degree, branch, city, organization, designation,
             skills_json, services_json, turnover_crores, is_active)
         VALUES
            ('Arjun Menon', 2010, 'B.Tech', 'Computer Science', 'Bangalore', 'Menon Labs',
             'CTO', '[\"devops\"]', '[\"software development\"]', 20.0, 1)",
    )
    .execute(&pool)
    .await
    .expect("seed noise member");

    let embedding_cache = Arc::new(EmbeddingCache::new(100, Duration::from_secs(60)));
    let embedding_provider: Arc<dyn EmbeddingProvider> = Arc::new(NoEmbeddings);
    let repository = MemberRepository::new(pool.clone());
    let search_engine =
        Arc::new(SearchEngine::new(repository, Arc::clone(&embedding_cache), embedding_provider));

    let llm_gateway = Arc::new(LLMGateway::new(Vec::new(), 5, Duration::from_secs(30)));
    let orchestrator = Arc::new(Orchestrator::new(
        None,
        Arc::clone(&search_engine),
        Duration::from_secs(3),
        Duration::from_secs(10),
    ));

    let config = Arc::new(communitylens::Config::default());
    let app_state = AppState {
        db: pool,
        orchestrator,
        llm_gateway,
        embedding_cache,
        config,
    };

    Router::new().route("/api/search", post(handlers::search::search)).with_state(app_state)
}

#[tokio::test]
async fn find_business_query_surfaces_the_matching_member() {
    let app = build_app().await;

    let payload = json!({
        "query": "Find 1995 mechanical engineers in Chennai with IT infrastructure services",
        "phoneNumber": "+919800000000",
    });

    let request = Request::builder()
        .method("POST")
        .uri("/api/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request");

    let response = app.oneshot(request).await.expect("request succeeds");
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    let parsed: Value = serde_json::from_slice(&body).expect("valid json");

    let members = parsed["results"]["members"].as_array().expect("members array");
    assert!(!members.is_empty(), "expected at least one matching member");

    let top = &members[0];
    assert_eq!(top["member"]["name"], "Kavitha Raman");

    let matched: Vec<&str> =
        top["matchedFields"].as_array().expect("matchedFields array").iter().map(|v| v.as_str().unwrap()).collect();
    for expected in ["year", "branch", "city", "services"] {
        assert!(matched.contains(&expected), "expected matchedFields to contain {expected}, got {matched:?}");
    }
}

#[tokio::test]
async fn blank_query_rejected_by_request_validation() {
    let app = build_app().await;

    let payload = json!({
        "query": "",
        "phoneNumber": "+919800000000",
    });

    let request = Request::builder()
        .method("POST")
        .uri("/api/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request");

    let response = app.oneshot(request).await.expect("request succeeds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn whitespace_only_query_degrades_to_zero_results_without_erroring() {
    let app = build_app().await;

    let payload = json!({
        "query": "   ",
        "phoneNumber": "+919800000000",
    });

    let request = Request::builder()
        .method("POST")
        .uri("/api/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request");

    let response = app.oneshot(request).await.expect("request succeeds");
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    let parsed: Value = serde_json::from_slice(&body).expect("valid json");
    let members = parsed["results"]["members"].as_array().expect("members array");
    assert!(members.is_empty());
}
