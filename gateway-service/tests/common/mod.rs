//! Test helper module for gateway-service integration tests.
//!
//! Spawns the real router on an ephemeral port together with a mock identity
//! service and a mock upstream backend.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use gateway_service::{
    config::{Environment, GatewayConfig, JwtConfig, TwoFactorConfig, UpstreamConfig},
    services::{totp, PermissionRule},
    startup::build_router,
    AppState,
};

pub const TEST_JWT_SECRET: &str = "integration-test-signing-secret-0123456789";
pub const TEST_USER_AGENT: &str = "gateway-tests/1.0";
pub const TEST_PASSWORD: &str = "s3cret-password";

/// Running gateway with its collaborators mocked out.
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub identity: MockIdentity,
    pub backend: MockBackend,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let identity = MockIdentity::start().await;
        let backend = MockBackend::start().await;
        let config = test_config(&identity.url, &backend.url);
        Self::from_parts(config, identity, backend).await
    }

    /// Spawn with a tweaked configuration (dead backends, short TTLs, ...).
    pub async fn spawn_with_config(mutate: impl FnOnce(&mut GatewayConfig)) -> Self {
        let identity = MockIdentity::start().await;
        let backend = MockBackend::start().await;
        let mut config = test_config(&identity.url, &backend.url);
        mutate(&mut config);
        Self::from_parts(config, identity, backend).await
    }

    async fn from_parts(config: GatewayConfig, identity: MockIdentity, backend: MockBackend) -> Self {
        let state = AppState::from_config(config).expect("Failed to build app state");
        let app = build_router(state.clone());
        let address = spawn_server(app).await;

        Self {
            address,
            client: reqwest::Client::new(),
            identity,
            backend,
            state,
        }
    }
}

pub fn test_config(identity_url: &str, backend_url: &str) -> GatewayConfig {
    GatewayConfig {
        common: service_core::config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "gateway-service".to_string(),
        service_version: "test".to_string(),
        log_level: "info".to_string(),
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            expiry_minutes: 60,
        },
        two_factor: TwoFactorConfig {
            issuer: "Staff Portal".to_string(),
        },
        upstream: UpstreamConfig {
            employees_url: identity_url.to_string(),
            schedules_url: backend_url.to_string(),
            // Nothing listens here; tests use it to exercise gateway errors.
            tracking_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 3,
        },
    }
}

/// Bind an ephemeral port and serve the router in the background.
pub async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("server error");
    });

    format!("http://{}", addr)
}

// ============================================================================
// Mock identity service
// ============================================================================

#[derive(Clone, Default)]
pub struct MockIdentityState {
    /// Seeded employee records, including a `password` field the mock checks
    /// and strips before answering.
    pub employees: Arc<Mutex<Vec<Value>>>,
    /// Recorded (employee id, secret) pairs from patch calls.
    pub patched: Arc<Mutex<Vec<(i64, String)>>>,
    pub fail_patch: Arc<AtomicBool>,
}

pub struct MockIdentity {
    pub url: String,
    pub state: MockIdentityState,
}

impl MockIdentity {
    pub async fn start() -> Self {
        let state = MockIdentityState::default();
        let router = Router::new()
            .route("/api/v1/employees/authenticate", post(mock_authenticate))
            .route(
                "/api/v1/employees/by-identification/:itype/:inumber",
                get(mock_by_identification),
            )
            .route("/api/v1/employees/:id", patch(mock_patch_employee))
            .with_state(state.clone());

        let url = spawn_server(router).await;
        Self { url, state }
    }

    pub async fn add_employee(&self, employee: Value) {
        self.state.employees.lock().await.push(employee);
    }

    pub async fn patched(&self) -> Vec<(i64, String)> {
        self.state.patched.lock().await.clone()
    }

    pub fn fail_patches(&self) {
        self.state.fail_patch.store(true, Ordering::SeqCst);
    }
}

async fn mock_authenticate(
    State(state): State<MockIdentityState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let employees = state.employees.lock().await;
    let found = employees.iter().find(|e| {
        e["identification_type"] == body["identification_type"]
            && e["identification_number"] == body["identification_number"]
            && e["password"] == body["password"]
    });

    match found {
        Some(employee) => {
            let mut record = employee.clone();
            record
                .as_object_mut()
                .expect("employee record must be an object")
                .remove("password");
            (StatusCode::OK, Json(record)).into_response()
        }
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn mock_by_identification(
    State(state): State<MockIdentityState>,
    Path((itype, inumber)): Path<(String, String)>,
) -> impl IntoResponse {
    let employees = state.employees.lock().await;
    let found = employees.iter().find(|e| {
        e["identification_type"] == json!(itype) && e["identification_number"] == json!(inumber)
    });

    match found {
        Some(employee) => {
            let mut record = employee.clone();
            record
                .as_object_mut()
                .expect("employee record must be an object")
                .remove("password");
            (StatusCode::OK, Json(record)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn mock_patch_employee(
    State(state): State<MockIdentityState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if state.fail_patch.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let secret = body["secret"].as_str().unwrap_or_default().to_string();
    state.patched.lock().await.push((id, secret));
    StatusCode::OK.into_response()
}

// ============================================================================
// Mock upstream backend
// ============================================================================

pub struct MockBackend {
    pub url: String,
}

impl MockBackend {
    pub async fn start() -> Self {
        let router = Router::new()
            .route("/api/v1/schedules/teapot", get(mock_teapot))
            .fallback(mock_echo);
        let url = spawn_server(router).await;
        Self { url }
    }
}

async fn mock_teapot() -> impl IntoResponse {
    (StatusCode::IM_A_TEAPOT, "short and stout")
}

/// Echo the received method, path, query, and body back as JSON.
async fn mock_echo(req: Request) -> impl IntoResponse {
    let method = req.method().to_string();
    let uri = req.uri().clone();
    let body = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    Json(json!({
        "method": method,
        "path": uri.path(),
        "query": uri.query(),
        "body": String::from_utf8_lossy(&body),
    }))
}

// ============================================================================
// Request helpers
// ============================================================================

pub fn employee_json(
    id: i64,
    identification_type: &str,
    identification_number: &str,
    secret: Option<&str>,
    permissions: Value,
) -> Value {
    let mut record = json!({
        "id": id,
        "names": "Ada",
        "lastnames": "Lovelace",
        "identification_type": identification_type,
        "identification_number": identification_number,
        "rol_id": 1,
        "rol_name": "admin",
        "permissions": permissions,
        "password": TEST_PASSWORD,
    });
    if let Some(secret) = secret {
        record["secret"] = json!(secret);
    }
    record
}

pub fn rule(method: &str, patterns: &[&str]) -> PermissionRule {
    let mut map = std::collections::BTreeMap::new();
    map.insert(
        method.to_string(),
        patterns.iter().map(|p| p.to_string()).collect(),
    );
    PermissionRule(map)
}

/// Issue a token bound to the test client's context (loopback address, test
/// user agent).
pub fn issue_token(app: &TestApp, sub: &str, permissions: Vec<PermissionRule>) -> String {
    app.state
        .jwt
        .issue(
            sub,
            "Ada Lovelace",
            Some("admin"),
            "127.0.0.1",
            TEST_USER_AGENT,
            permissions,
        )
        .expect("Failed to issue token")
}

pub async fn login(app: &TestApp, body: Value) -> reqwest::Response {
    app.client
        .post(format!("{}/auth/login", app.address))
        .header(reqwest::header::USER_AGENT, TEST_USER_AGENT)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute login request")
}

/// Request with the full authenticated header set: bearer token, binding
/// user agent, declared employee id.
pub fn authed_request(
    app: &TestApp,
    method: reqwest::Method,
    path: &str,
    token: &str,
    sub: &str,
) -> reqwest::RequestBuilder {
    app.client
        .request(method, format!("{}{}", app.address, path))
        .bearer_auth(token)
        .header(reqwest::header::USER_AGENT, TEST_USER_AGENT)
        .header("x-employee-id", sub)
}

/// A TOTP code guaranteed to stay valid for at least the next two seconds.
pub async fn fresh_totp_code(secret: &str) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before Unix epoch");
    if now.as_secs() % 30 >= 28 {
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    }
    totp::current_code(secret).expect("Failed to derive TOTP code")
}
