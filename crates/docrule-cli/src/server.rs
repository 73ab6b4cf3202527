//! # HTTP Server
//!
//! `POST /api/check` takes a multipart upload (`pdf` file plus `rules`) and
//! answers with one verdict per rule. `GET /health` is a liveness probe.
//!
//! Every error body has the shape `{"error": "..."}`.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use docrule_core::{Document, RuleSet, RuleSetError, VerdictRecord};
use docrule_runtime::RuntimeOrchestrator;

use crate::config::ServerConfig;
use crate::extract::TextExtractor;

// ==================
// Shared State
// ==================

/// State shared across handlers
pub struct AppState {
    pub orchestrator: RuntimeOrchestrator,
    pub extractor: Arc<dyn TextExtractor>,
}

impl AppState {
    pub fn new(orchestrator: RuntimeOrchestrator, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            orchestrator,
            extractor,
        }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub pages: Option<u32>,
    pub results: Vec<VerdictRecord>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request failures, each with a fixed client-facing message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("PDF file is required.")]
    MissingDocument,

    #[error("Please provide at least one rule.")]
    NoRules,

    #[error("Unable to extract text from the PDF.")]
    NoText,

    /// Internal detail is logged, not returned.
    #[error("Failed to process the document.")]
    Processing(String),

    #[error("{message}")]
    Multipart { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingDocument | ApiError::NoRules => StatusCode::BAD_REQUEST,
            ApiError::NoText => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Multipart { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Processing(detail) = &self {
            tracing::error!(error = %detail, "Error processing document");
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Multipart {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl From<RuleSetError> for ApiError {
    fn from(_: RuleSetError) -> Self {
        ApiError::NoRules
    }
}

// ==================
// Routes
// ==================

/// Health check route
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// Document check routes, nested under `/api`
pub fn check_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/check", post(check_handler))
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

async fn check_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CheckResponse>, ApiError> {
    // A body that is not multipart cannot carry the file.
    let mut multipart = multipart.map_err(|_| ApiError::MissingDocument)?;

    let mut upload = None;
    let mut raw_rules = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("pdf") => upload = Some(field.bytes().await?),
            Some("rules") => raw_rules.push(field.text().await?),
            _ => {}
        }
    }

    let bytes = upload.ok_or(ApiError::MissingDocument)?;
    let rules = normalize_rules(&raw_rules)?;

    let extractor = state.extractor.clone();
    let extracted = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
        .await
        .map_err(|e| ApiError::Processing(e.to_string()))?
        .map_err(|e| ApiError::Processing(e.to_string()))?;

    let document = Document::new(extracted.text)
        .map_err(|_| ApiError::NoText)?
        .with_pages(extracted.pages);

    let results = state.orchestrator.evaluate(&rules, &document).await;

    Ok(Json(CheckResponse {
        pages: document.pages(),
        results,
    }))
}

/// Repeated `rules` fields form a list; a single one may hold a JSON array.
pub fn normalize_rules(raw: &[String]) -> Result<RuleSet, ApiError> {
    let rules = match raw {
        [] => return Err(ApiError::NoRules),
        [single] => RuleSet::from_input(single)?,
        many => RuleSet::new(many)?,
    };
    Ok(rules)
}

// ==================
// Server
// ==================

/// HTTP server for document checks
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        let router = build_router(&config, Arc::new(state));
        Self { config, router }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C.
    pub async fn start(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        tracing::info!(addr = %listener.local_addr()?, "docrule server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down");
            })
            .await?;

        Ok(())
    }
}

/// Build the full router with CORS and the upload limit applied.
pub fn build_router(config: &ServerConfig, state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health_routes())
        .nest("/api", check_routes(state))
        .layer(DefaultBodyLimit::max(config.upload_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractError, ExtractedText};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use docrule_runtime::RuntimeConfig;
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "docrule-test-boundary";

    enum StubExtractor {
        Text(&'static str, Option<u32>),
        Broken,
    }

    impl TextExtractor for StubExtractor {
        fn extract(&self, _bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
            match self {
                StubExtractor::Text(text, pages) => Ok(ExtractedText {
                    text: text.to_string(),
                    pages: *pages,
                }),
                StubExtractor::Broken => Err(ExtractError::ToolFailed {
                    tool: "pdftotext",
                    message: "Syntax Error: Couldn't find trailer dictionary".to_string(),
                }),
            }
        }
    }

    fn router(extractor: StubExtractor) -> Router {
        let orchestrator = RuntimeOrchestrator::heuristic(RuntimeConfig::default().with_jitter_seed(7));
        let state = AppState::new(orchestrator, Arc::new(extractor));
        HttpServer::new(ServerConfig::default(), state).router()
    }

    fn contract_router() -> Router {
        router(StubExtractor::Text(
            "The contractor shall submit invoices monthly. Payment terms are net 30 days.",
            Some(2),
        ))
    }

    /// (name, filename, value)
    fn multipart(fields: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, filename, value) in fields {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match filename {
                Some(filename) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method("POST")
            .uri("/api/check")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(contract_router(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_check_with_json_array_rules() {
        let request = multipart(&[
            ("pdf", Some("contract.pdf"), "%PDF-1.4 stub"),
            (
                "rules",
                None,
                r#"["invoices must be submitted monthly", "document must mention payment schedule"]"#,
            ),
        ]);
        let (status, body) = send(contract_router(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pages"], 2);

        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["rule"], "invoices must be submitted monthly");
        assert_eq!(results[0]["status"], "pass");
        assert_eq!(
            results[0]["evidence"],
            "The contractor shall submit invoices monthly."
        );
        assert!(results[0]["confidence"].as_u64().unwrap() <= 100);
        assert_eq!(results[1]["rule"], "document must mention payment schedule");
    }

    #[tokio::test]
    async fn test_check_with_plain_string_rule() {
        let request = multipart(&[
            ("pdf", Some("contract.pdf"), "%PDF-1.4 stub"),
            ("rules", None, "  payment terms net days  "),
        ]);
        let (status, body) = send(contract_router(), request).await;

        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["rule"], "payment terms net days");
    }

    #[tokio::test]
    async fn test_check_with_repeated_rule_fields() {
        let request = multipart(&[
            ("rules", None, "invoices monthly"),
            ("rules", None, " "),
            ("rules", None, "weather forecast"),
            ("pdf", Some("contract.pdf"), "%PDF-1.4 stub"),
        ]);
        let (status, body) = send(contract_router(), request).await;

        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1]["status"], "fail");
        assert_eq!(results[1]["evidence"], "No supporting evidence found.");
    }

    #[tokio::test]
    async fn test_missing_pdf() {
        let request = multipart(&[("rules", None, "anything")]);
        let (status, body) = send(contract_router(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "PDF file is required.");
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_missing_pdf() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/check")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"rules":["x"]}"#))
            .unwrap();
        let (status, body) = send(contract_router(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "PDF file is required.");
    }

    #[tokio::test]
    async fn test_missing_or_empty_rules() {
        for fields in [
            vec![("pdf", Some("contract.pdf"), "%PDF-1.4 stub")],
            vec![("pdf", Some("contract.pdf"), "%PDF-1.4 stub"), ("rules", None, "[]")],
            vec![("pdf", Some("contract.pdf"), "%PDF-1.4 stub"), ("rules", None, "[\"  \", 5]")],
        ] {
            let (status, body) = send(contract_router(), multipart(&fields)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Please provide at least one rule.");
        }
    }

    #[tokio::test]
    async fn test_blank_text_is_unprocessable() {
        let request = multipart(&[
            ("pdf", Some("scan.pdf"), "%PDF-1.4 stub"),
            ("rules", None, "must be signed"),
        ]);
        let (status, body) = send(router(StubExtractor::Text(" \n\t ", Some(1))), request).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Unable to extract text from the PDF.");
    }

    #[tokio::test]
    async fn test_extractor_failure_is_internal_error() {
        let request = multipart(&[
            ("pdf", Some("broken.pdf"), "%PDF-1.4 stub"),
            ("rules", None, "must be signed"),
        ]);
        let (status, body) = send(router(StubExtractor::Broken), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to process the document.");
    }

    #[tokio::test]
    async fn test_permissive_cors_by_default() {
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = contract_router().oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[test]
    fn test_normalize_rules() {
        let single = normalize_rules(&["[\"a\",\"b\"]".to_string()]).unwrap();
        assert_eq!(single.as_slice(), ["a", "b"]);

        let scalar_json = normalize_rules(&["\"quoted\"".to_string()]).unwrap();
        assert_eq!(scalar_json.as_slice(), ["\"quoted\""]);

        let many = normalize_rules(&["[1]".to_string(), "b".to_string()]).unwrap();
        assert_eq!(many.as_slice(), ["[1]", "b"]);

        assert!(matches!(normalize_rules(&[]), Err(ApiError::NoRules)));
    }

    #[test]
    fn test_server_socket_addr() {
        let orchestrator = RuntimeOrchestrator::heuristic(RuntimeConfig::default());
        let state = AppState::new(orchestrator, Arc::new(StubExtractor::Broken));
        let server = HttpServer::new(ServerConfig::with_port(8080), state);
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }
}
