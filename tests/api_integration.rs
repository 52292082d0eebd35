//! Integration tests for the Lucky Number Worker API.
//!
//! These tests spin up a real server instance and make HTTP requests to verify
//! the complete request/response cycle.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use regex::Regex;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

use luckynumber_worker::api::{AppState, create_router};
use luckynumber_worker::config::{
    AppConfig, AuthConfig, FileStorageConfig, GenerationConfig, ObservabilityConfig,
    ServerConfig, StorageBackend, StorageConfig,
};
use luckynumber_worker::storage::create_storage;

// ============================================================================
// Test Harness
// ============================================================================

/// Test server instance.
struct TestServer {
    addr: SocketAddr,
    client: Client,
    admin_token: String,
    _temp_dir: TempDir,
}

impl TestServer {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let admin_token = "test_admin_token_12345".to_string();

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".parse().unwrap(),
                port: 0,
            },
            storage: StorageConfig {
                backend: StorageBackend::File,
                file: FileStorageConfig {
                    data_dir: temp_dir.path().to_path_buf(),
                },
                ..Default::default()
            },
            generation: GenerationConfig {
                max_request_quantity: 100,
                conflict_retries: 3,
            },
            auth: AuthConfig {
                admin_token: admin_token.clone(),
            },
            observability: ObservabilityConfig {
                log_level: "warn".to_string(),
                log_format: "text".to_string(),
                metrics_enabled: true,
            },
        };

        let storage = create_storage(&config.storage)
            .await
            .expect("Failed to create storage");

        // Not installed globally, so parallel tests do not fight over the recorder
        let metrics = PrometheusBuilder::new().build_recorder().handle();

        let state = AppState::new(Arc::new(config), storage, Some(metrics));
        let app = create_router(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr,
            client: Client::new(),
            admin_token,
            _temp_dir: temp_dir,
        }
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn get_admin(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url(), path))
            .bearer_auth(&self.admin_token)
            .send()
            .await
            .expect("Request failed")
    }

    async fn get_with_token(&self, path: &str, token: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url(), path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Request failed")
    }

    async fn post_admin<T: Serialize>(&self, path: &str, body: &T) -> Response {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .bearer_auth(&self.admin_token)
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    async fn put_admin<T: Serialize>(&self, path: &str, body: &T) -> Response {
        self.client
            .put(format!("{}{}", self.base_url(), path))
            .bearer_auth(&self.admin_token)
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    async fn register(&self, document: &str) {
        let response = self
            .post_admin(
                "/v1/participants",
                &json!({"document": document, "name": "Maria Silva"}),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn generate(&self, document: &str, quantity: u32) -> Response {
        self.post_admin(
            "/v1/numbers/generate",
            &json!({"document": document, "quantity": quantity}),
        )
        .await
    }
}

/// API response structure.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    code: i32,
    message: String,
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn is_success(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, Deserialize)]
struct AllocationData {
    allocation_id: String,
    document: String,
    numbers: Vec<u64>,
    formatted: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SeriesData {
    series_count: u32,
    total_numbers: u64,
    series: Vec<SeriesEntry>,
}

#[derive(Debug, Deserialize)]
struct SeriesEntry {
    index: u32,
    start: u64,
    end: u64,
}

const DOC: &str = "12345678901";

// ============================================================================
// Health Endpoint Tests
// ============================================================================

#[derive(Debug, Deserialize)]
struct HealthData {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ReadyData {
    ready: bool,
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<HealthData> = response.json().await.unwrap();
    assert!(body.is_success());
    assert_eq!(body.data.unwrap().status, "healthy");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<ReadyData> = response.json().await.unwrap();
    assert!(body.is_success());
    assert!(body.data.unwrap().ready);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let server = TestServer::new().await;
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

// ============================================================================
// Authentication Tests
// ============================================================================

#[tokio::test]
async fn test_missing_token() {
    let server = TestServer::new().await;
    let response = server.get("/v1/campaign/config").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.code, 2001);
}

#[tokio::test]
async fn test_invalid_token() {
    let server = TestServer::new().await;
    let response = server
        .get_with_token("/v1/numbers?document=12345678901", "invalid_token")
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Campaign Configuration Tests
// ============================================================================

#[tokio::test]
async fn test_default_config() {
    let server = TestServer::new().await;
    let response = server.get_admin("/v1/campaign/config").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    let data = body.data.unwrap();
    assert_eq!(data["series_count"], 1);
    assert_eq!(data["algorithm"]["algorithm"], "random");
    assert_eq!(data["format"]["digit_width"], 6);
}

#[tokio::test]
async fn test_update_series_and_read_back() {
    let server = TestServer::new().await;
    let response = server
        .put_admin("/v1/campaign/config/series", &json!({"series_count": 3}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.get_admin("/v1/campaign/series").await;
    let body: ApiResponse<SeriesData> = response.json().await.unwrap();
    let data = body.data.unwrap();
    assert_eq!(data.series_count, 3);
    assert_eq!(data.total_numbers, 300_000);
    assert_eq!(data.series.len(), 3);
    assert_eq!(data.series[2].index, 3);
    assert_eq!(data.series[2].start, 200_000);
    assert_eq!(data.series[2].end, 299_999);
}

#[tokio::test]
async fn test_zero_series_rejected() {
    let server = TestServer::new().await;
    let response = server
        .put_admin("/v1/campaign/config/series", &json!({"series_count": 0}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.code, 1001);
}

#[tokio::test]
async fn test_series_preview() {
    let server = TestServer::new().await;
    let response = server.get_admin("/v1/campaign/series/preview?count=2").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<SeriesData> = response.json().await.unwrap();
    let data = body.data.unwrap();
    assert_eq!(data.series[0].start, 0);
    assert_eq!(data.series[0].end, 99_999);
    assert_eq!(data.series[1].start, 100_000);
    assert_eq!(data.series[1].end, 199_999);

    // Preview does not touch the stored configuration
    let response = server.get_admin("/v1/campaign/series").await;
    let body: ApiResponse<SeriesData> = response.json().await.unwrap();
    assert_eq!(body.data.unwrap().series_count, 1);

    let response = server.get_admin("/v1/campaign/series/preview?count=0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_format_preview() {
    let server = TestServer::new().await;
    let response = server
        .put_admin(
            "/v1/campaign/config/format",
            &json!({
                "enable_prefix": true,
                "prefix_text": "LT",
                "enable_checksum": true,
                "checksum_algorithm": "modulo10",
                "digit_width": 6
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.get_admin("/v1/numbers/format?number=123456").await;
    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.data.unwrap()["formatted"], "LT1234569");
}

// ============================================================================
// Participant Tests
// ============================================================================

#[tokio::test]
async fn test_register_and_lookup_participant() {
    let server = TestServer::new().await;
    let response = server
        .post_admin(
            "/v1/participants",
            &json!({"document": "123.456.789-01", "name": "Maria Silva", "email": "maria@example.com"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .get_admin("/v1/participants?document=12345678901")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: ApiResponse<Value> = response.json().await.unwrap();
    let data = body.data.unwrap();
    assert_eq!(data["document"], DOC);
    assert_eq!(data["name"], "Maria Silva");
}

#[tokio::test]
async fn test_duplicate_participant() {
    let server = TestServer::new().await;
    server.register(DOC).await;

    let response = server
        .post_admin(
            "/v1/participants",
            &json!({"document": DOC, "name": "Maria Silva"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.code, 4002);
}

#[tokio::test]
async fn test_unknown_participant() {
    let server = TestServer::new().await;
    let response = server
        .get_admin("/v1/participants?document=98765432100")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Number Generation Tests
// ============================================================================

#[tokio::test]
async fn test_generate_random_numbers() {
    let server = TestServer::new().await;
    server.register(DOC).await;

    let response = server.generate(DOC, 10).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<AllocationData> = response.json().await.unwrap();
    assert!(body.is_success());
    let data = body.data.unwrap();
    assert!(!data.allocation_id.is_empty());
    assert_eq!(data.document, DOC);
    assert_eq!(data.numbers.len(), 10);
    assert!(data.numbers.windows(2).all(|w| w[0] < w[1]));
    assert!(data.numbers.iter().all(|&n| n < 100_000));

    let six_digits = Regex::new(r"^\d{6}$").unwrap();
    assert!(data.formatted.iter().all(|f| six_digits.is_match(f)));
}

#[tokio::test]
async fn test_generate_sequential_numbers() {
    let server = TestServer::new().await;
    server.register(DOC).await;

    let response = server
        .put_admin(
            "/v1/campaign/config/algorithm",
            &json!({"algorithm": "sequential", "sequential_start": 1}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.generate(DOC, 3).await;
    let body: ApiResponse<AllocationData> = response.json().await.unwrap();
    assert_eq!(body.data.unwrap().numbers, vec![1, 2, 3]);

    let response = server.generate(DOC, 2).await;
    let body: ApiResponse<AllocationData> = response.json().await.unwrap();
    assert_eq!(body.data.unwrap().numbers, vec![4, 5]);
}

#[tokio::test]
async fn test_generated_numbers_never_repeat() {
    let server = TestServer::new().await;
    server.register(DOC).await;
    server.register("98765432100").await;

    let mut seen = HashSet::new();
    for document in [DOC, "98765432100", DOC, "98765432100"] {
        let response = server.generate(document, 50).await;
        let body: ApiResponse<AllocationData> = response.json().await.unwrap();
        for number in body.data.unwrap().numbers {
            assert!(seen.insert(number), "number {number} issued twice");
        }
    }
    assert_eq!(seen.len(), 200);
}

#[tokio::test]
async fn test_generate_with_display_format() {
    let server = TestServer::new().await;
    server.register(DOC).await;

    server
        .put_admin(
            "/v1/campaign/config/format",
            &json!({
                "enable_prefix": true,
                "prefix_text": "LT",
                "enable_checksum": true,
                "checksum_algorithm": "luhn",
                "digit_width": 6,
                "enable_formatting": true,
                "format_pattern": "XXX-XXX-X"
            }),
        )
        .await;

    let response = server.generate(DOC, 5).await;
    let body: ApiResponse<AllocationData> = response.json().await.unwrap();
    let data = body.data.unwrap();

    // The prefix has no digits, so the mask consumes only number and check digit
    let masked = Regex::new(r"^\d{3}-\d{3}-\d$").unwrap();
    for (number, formatted) in data.numbers.iter().zip(&data.formatted) {
        assert!(masked.is_match(formatted), "unexpected format {formatted}");
        assert!(formatted.replace('-', "").starts_with(&format!("{number:06}")));
    }

    let response = server.get_admin(&format!("/v1/numbers?document={DOC}")).await;
    let body: ApiResponse<Value> = response.json().await.unwrap();
    let listed = body.data.unwrap();
    assert_eq!(listed["total"], 5);
    assert_eq!(listed["numbers"][0]["formatted"], data.formatted[0].as_str());
}

#[tokio::test]
async fn test_generate_for_unknown_participant() {
    let server = TestServer::new().await;
    let response = server.generate("98765432100", 1).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.code, 4001);
}

#[tokio::test]
async fn test_invalid_quantities() {
    let server = TestServer::new().await;
    server.register(DOC).await;

    let response = server.generate(DOC, 0).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Above the configured per-request cap of 100
    let response = server.generate(DOC, 101).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.code, 3002);
}

#[tokio::test]
async fn test_participant_limit() {
    let server = TestServer::new().await;
    server.register(DOC).await;

    let response = server
        .put_admin(
            "/v1/campaign/config/limits",
            &json!({"enable_participant_limit": true, "max_per_participant": 3}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(server.generate(DOC, 3).await.status(), StatusCode::OK);

    let response = server.generate(DOC, 1).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.code, 4003);
    assert!(body.message.contains("participant-limit-exceeded"));

    let response = server.get_admin(&format!("/v1/numbers?document={DOC}")).await;
    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.data.unwrap()["total"], 3);
}
