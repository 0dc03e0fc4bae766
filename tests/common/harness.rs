//! Stub collaborator server.
//!
//! Serves the OCR, NER, search, analysis and status routes on an ephemeral
//! port with canned replies, and records every request it receives.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Json, Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use guardian::config::{Config, Endpoints};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 50;
const TEST_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// A canned HTTP reply.
#[derive(Debug, Clone)]
pub struct StubReply {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
}

impl StubReply {
    pub fn json(body: Value) -> Self {
        Self::json_status(200, body)
    }

    pub fn json_status(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            content_type: "application/json",
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            content_type: "text/plain",
        }
    }

    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

#[derive(Debug, Clone)]
pub struct StubConfig {
    pub ocr: StubReply,
    pub entities: StubReply,
    pub search: StubReply,
    /// Analysis replies keyed by `comparison_news`.
    pub analysis: HashMap<String, StubReply>,
    pub analysis_fallback: StubReply,
    pub analysis_delay: Duration,
    pub status: StubReply,
    /// When set, every route answers 401 unless this bearer token is presented.
    pub required_token: Option<String>,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            ocr: StubReply::json(json!({"text": ""})),
            entities: StubReply::json(json!({"entities": []})),
            search: StubReply::json(json!([])),
            analysis: HashMap::new(),
            analysis_fallback: StubReply::json_status(
                500,
                json!({"detail": "Analiz sırasında hata oluştu"}),
            ),
            analysis_delay: Duration::ZERO,
            status: StubReply::json(json!({"status": "UP", "message": "Backend is running"})),
            required_token: None,
        }
    }
}

impl StubConfig {
    pub fn with_search(mut self, body: Value) -> Self {
        self.search = StubReply::json(body);
        self
    }

    pub fn with_verdict(mut self, comparison_news: &str, body: Value) -> Self {
        self.analysis
            .insert(comparison_news.to_string(), StubReply::json(body));
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub len: usize,
}

#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub uploads: Vec<RecordedUpload>,
    pub ner_texts: Vec<String>,
    pub search_queries: Vec<String>,
    pub analysis_bodies: Vec<Value>,
    pub authorization: Vec<Option<String>>,
}

struct StubState {
    config: Mutex<StubConfig>,
    recorded: Mutex<Recorded>,
}

impl StubState {
    /// Records the credential and rejects it when it does not match.
    fn check_auth(&self, headers: &HeaderMap) -> Option<Response> {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.recorded.lock().authorization.push(presented.clone());

        let required = self.config.lock().required_token.clone()?;
        if presented.as_deref() == Some(format!("Bearer {required}").as_str()) {
            None
        } else {
            Some(StubReply::json_status(401, json!({"detail": "Unauthorized"})).into_response())
        }
    }
}

pub struct StubServer {
    pub addr: SocketAddr,
    state: Arc<StubState>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl StubServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing every collaborator at this server.
    pub fn guardian_config(&self) -> Config {
        Config {
            endpoints: Endpoints::with_base(&self.url()),
            request_timeout: TEST_REQUEST_TIMEOUT,
            ..Default::default()
        }
    }

    pub fn recorded(&self) -> Recorded {
        self.state.recorded.lock().clone()
    }

    pub fn configure(&self, update: impl FnOnce(&mut StubConfig)) {
        update(&mut *self.state.config.lock());
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("Server failed to start within timeout")]
    Timeout,
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
}

pub async fn wait_for_server_ready(
    addr: SocketAddr,
    timeout: Duration,
    interval: Duration,
) -> Result<(), ServerStartupError> {
    let start = std::time::Instant::now();

    loop {
        if start.elapsed() > timeout {
            return Err(ServerStartupError::Timeout);
        }

        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(_) => {
                tokio::time::sleep(interval).await;
            }
        }
    }
}

/// Spawns the stub on `127.0.0.1` with an OS-assigned port.
///
/// ```ignore
/// let server = spawn_stub_server(StubConfig::default()).await?;
/// let services = HttpServices::new(&server.guardian_config())?;
/// ```
pub async fn spawn_stub_server(config: StubConfig) -> Result<StubServer, ServerStartupError> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let local_addr = listener.local_addr()?;

    let state = Arc::new(StubState {
        config: Mutex::new(config),
        recorded: Mutex::new(Recorded::default()),
    });

    let app = Router::new()
        .route("/img/convert", post(ocr))
        .route("/entities", get(entities))
        .route("/api/similar", get(search))
        .route("/analyze", post(analyze))
        .route("/status", get(status))
        .with_state(state.clone());

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    wait_for_server_ready(
        local_addr,
        Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS),
        Duration::from_millis(STARTUP_POLL_INTERVAL_MS),
    )
    .await?;

    Ok(StubServer {
        addr: local_addr,
        state,
        _server_handle: server_handle,
        shutdown_tx: Some(shutdown_tx),
    })
}

async fn ocr(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if let Some(rejection) = stub.check_auth(&headers) {
        return rejection;
    }

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        stub.recorded.lock().uploads.push(RecordedUpload {
            field: name,
            file_name,
            content_type,
            len,
        });
    }

    let reply = stub.config.lock().ocr.clone();
    reply.into_response()
}

async fn entities(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = stub.check_auth(&headers) {
        return rejection;
    }
    let text = params.get("text").cloned().unwrap_or_default();
    stub.recorded.lock().ner_texts.push(text);

    let reply = stub.config.lock().entities.clone();
    reply.into_response()
}

async fn search(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = stub.check_auth(&headers) {
        return rejection;
    }
    let query = params.get("query").cloned().unwrap_or_default();
    stub.recorded.lock().search_queries.push(query);

    let reply = stub.config.lock().search.clone();
    reply.into_response()
}

async fn analyze(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(rejection) = stub.check_auth(&headers) {
        return rejection;
    }
    let comparison = body["comparison_news"].as_str().unwrap_or_default().to_string();
    stub.recorded.lock().analysis_bodies.push(body);

    let (reply, delay) = {
        let config = stub.config.lock();
        let reply = config
            .analysis
            .get(&comparison)
            .cloned()
            .unwrap_or_else(|| config.analysis_fallback.clone());
        (reply, config.analysis_delay)
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    reply.into_response()
}

async fn status(State(stub): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Some(rejection) = stub.check_auth(&headers) {
        return rejection;
    }
    let reply = stub.config.lock().status.clone();
    reply.into_response()
}
