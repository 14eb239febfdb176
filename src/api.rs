//! REST API for the ledger explorer
//!
//! Thin axum layer over [`Explorer`]: decodes query strings and bodies, maps
//! errors onto status codes, and logs every request.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, Request, State,
    },
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::assembler::{BlockRecord, Page, TxRecord};
use crate::error::{ExplorerError, ValidationError};
use crate::explorer::{ChainStatus, Explorer};
use crate::filter::TxTypeRequest;
use crate::paging::{Cursor, RawPageQuery};

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Explorer(ExplorerError),
    InvalidBody(String),
    NotFound(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Explorer(ExplorerError::Validation(v)) => match v {
                ValidationError::OverMaxLimit { .. } => (StatusCode::BAD_REQUEST, "OVER_MAX_LIMIT"),
                ValidationError::InvalidLimit(_) => (StatusCode::BAD_REQUEST, "INVALID_LIMIT"),
                ValidationError::MalformedParam { .. } => (StatusCode::BAD_REQUEST, "MALFORMED_PARAM"),
                ValidationError::InvalidMessageType(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_MESSAGE_TYPE")
                }
                ValidationError::InvalidTimeRange { .. } => {
                    (StatusCode::BAD_REQUEST, "INVALID_TIME_RANGE")
                }
            },
            ApiError::Explorer(ExplorerError::Decode { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DECODE_ERROR")
            }
            ApiError::Explorer(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST_BODY"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            ApiError::Explorer(e) => e.to_string(),
            ApiError::InvalidBody(msg) | ApiError::NotFound(msg) => msg.clone(),
        };

        if status.is_server_error() {
            tracing::error!(code, error = %message, "api.error");
        } else {
            tracing::warn!(code, error = %message, "api.rejected");
        }

        (
            status,
            Json(ErrorResponse {
                code,
                error: message,
            }),
        )
            .into_response()
    }
}

impl From<ExplorerError> for ApiError {
    fn from(err: ExplorerError) -> Self {
        ApiError::Explorer(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Explorer(ExplorerError::Validation(err))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    error: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(explorer: Arc<Explorer>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/blocks", get(get_blocks))
        .route("/blocks/:height", get(get_block_by_height))
        .route("/blocks/:height/txs", get(get_txs_at_height))
        .route("/txs", get(get_txs).post(get_txs_by_type))
        .route("/status", get(get_status))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(explorer);

    Router::new().nest("/api", api_routes).layer(cors)
}

pub async fn run_api_server(
    explorer: Arc<Explorer>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(explorer);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "API server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Extractor Helpers
// ============================================================================

fn malformed(name: &'static str, value: String) -> ApiError {
    ValidationError::MalformedParam { name, value }.into()
}

/// Resolves the paging cursor, reporting query-string decode failures as
/// `MALFORMED_PARAM`.
fn page_cursor(query: Result<Query<RawPageQuery>, QueryRejection>) -> Result<Cursor, ApiError> {
    let Query(raw) = query.map_err(|e| malformed("query", e.body_text()))?;
    Ok(Cursor::from_query(&raw)?)
}

fn height_param(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    let Path(height) = path.map_err(|e| malformed("height", e.body_text()))?;
    Ok(height)
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_blocks(
    State(explorer): State<Arc<Explorer>>,
    query: Result<Query<RawPageQuery>, QueryRejection>,
) -> Result<Json<Page<BlockRecord>>, ApiError> {
    let cursor = page_cursor(query)?;
    Ok(Json(explorer.blocks(cursor)?))
}

async fn get_txs(
    State(explorer): State<Arc<Explorer>>,
    query: Result<Query<RawPageQuery>, QueryRejection>,
) -> Result<Json<Page<TxRecord>>, ApiError> {
    let cursor = page_cursor(query)?;
    Ok(Json(explorer.txs(cursor)?))
}

async fn get_txs_by_type(
    State(explorer): State<Arc<Explorer>>,
    query: Result<Query<RawPageQuery>, QueryRejection>,
    body: Result<Json<TxTypeRequest>, JsonRejection>,
) -> Result<Json<Page<TxRecord>>, ApiError> {
    let cursor = page_cursor(query)?;
    let Json(req) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let now = chrono::Utc::now().timestamp();
    Ok(Json(explorer.txs_by_type(cursor, &req, now)?))
}

async fn get_block_by_height(
    State(explorer): State<Arc<Explorer>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<BlockRecord>, ApiError> {
    let height = height_param(path)?;
    explorer
        .block(height)?
        .ok_or_else(|| ApiError::NotFound(format!("Block at height {} not found", height)))
        .map(Json)
}

async fn get_txs_at_height(
    State(explorer): State<Arc<Explorer>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<TxRecord>>, ApiError> {
    let height = height_param(path)?;
    Ok(Json(explorer.txs_at_height(height)?))
}

async fn get_status(State(explorer): State<Arc<Explorer>>) -> Result<Json<ChainStatus>, ApiError> {
    Ok(Json(explorer.status()?))
}
