//! Mailchimp plugin HTTP API - table schemas and queries.
//!
//! Exposes three routes:
//! - `GET /api/tables` — list all table schemas
//! - `GET /api/tables/:name` — one table schema
//! - `POST /api/tables/:name/query` — run a query against a table

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tablekit::fetch::RowSink;
use tablekit::table::QuerySink;
use tablekit::{InvalidQuery, Qual, QueryContext, Row, TableDefinition, TableRegistry};
use tracing::{info, warn};

/// Shared state for the table API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<TableRegistry>,
}

/// Request body for `POST /api/tables/:name/query`.
#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub quals: Vec<Qual>,
    #[serde(default)]
    pub limit: Option<u64>,
    /// Columns to return; all columns when absent.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

impl From<QueryRequest> for QueryContext {
    fn from(req: QueryRequest) -> Self {
        QueryContext {
            quals: req.quals,
            limit: req.limit,
            columns: req.columns,
        }
    }
}

/// Response for `POST /api/tables/:name/query`.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub table: String,
    pub count: usize,
    pub rows: Vec<Row>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ---------------------------------------------------------------------------
// Business logic (called from HTTP handlers and unit tests)
// ---------------------------------------------------------------------------

/// Runs a query against table `name` and collects the matching rows.
pub async fn handle_query(
    state: &ApiState,
    name: &str,
    req: QueryRequest,
) -> Result<QueryResponse> {
    let ctx = QueryContext::from(req);
    let mut sink = QuerySink::new(ctx.clone());
    state
        .registry
        .execute(name, &ctx, &mut sink as &mut dyn RowSink<Row>)
        .await?;

    let rows = sink.into_rows();
    info!(table = %name, rows = rows.len(), "Query completed");
    Ok(QueryResponse {
        table: name.to_string(),
        count: rows.len(),
        rows,
    })
}

// ---------------------------------------------------------------------------
// HTTP handlers
// ---------------------------------------------------------------------------

async fn list_tables(State(state): State<Arc<ApiState>>) -> Json<Vec<TableDefinition>> {
    Json(state.registry.definitions().into_iter().cloned().collect())
}

async fn get_table(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> Result<Json<TableDefinition>, AppError> {
    let table = state
        .registry
        .table(&name)
        .ok_or_else(|| AppError::NotFound(format!("Unknown table: {}", name)))?;
    Ok(Json(table.definition().clone()))
}

async fn query_table(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    if state.registry.table(&name).is_none() {
        return Err(AppError::NotFound(format!("Unknown table: {}", name)));
    }
    let response = handle_query(&state, &name, req)
        .await
        .map_err(AppError::from)?;
    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

enum AppError {
    NotFound(String),
    BadRequest(String),
    BadGateway(String),
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        if e.downcast_ref::<InvalidQuery>().is_some() {
            AppError::BadRequest(e.to_string())
        } else {
            AppError::BadGateway(format!("{:#}", e))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::BadGateway(msg) => {
                warn!(error = %msg, "Query failed");
                (StatusCode::BAD_GATEWAY, msg)
            }
        };
        (status, Json(ErrorResponse { error: msg })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/tables", get(list_tables))
        .route("/api/tables/:name", get(get_table))
        .route("/api/tables/:name/query", post(query_table))
        .with_state(Arc::new(state))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
