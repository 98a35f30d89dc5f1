use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use flowsmith_core::{DiagramKind, Error, GenerationResult};
use flowsmith_generate::{generate, CompletionClient};

const INDEX_HTML: &str = include_str!("../static/index.html");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

// --- Config ---

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    /// Reads `BIND_ADDR` (default `127.0.0.1:5000`).
    pub fn from_env() -> flowsmith_core::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> flowsmith_core::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = lookup("BIND_ADDR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("invalid BIND_ADDR '{raw}': {e}")))?;
        Ok(Self { bind_addr })
    }
}

// --- State ---

#[derive(Clone)]
pub struct AppState {
    client: Arc<dyn CompletionClient>,
}

impl AppState {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

// --- Wire types ---

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    pub code: String,
}

/// Everything `POST /generate` can answer besides a diagram.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Carries the reason for the log; the client only sees the fixed text.
    #[error("Request must be JSON")]
    NotJson(String),

    #[error("Empty query received")]
    EmptyQuery,

    #[error("{0}")]
    Generation(String),

    /// The model answered with its own `error` object instead of a diagram.
    #[error("model reported an error")]
    ModelError(Map<String, Value>),

    #[error("Invalid Mermaid syntax")]
    InvalidSyntax,

    #[error("Internal server error")]
    Internal(#[source] Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Internal(source) => {
                error!(error = %source, "generation failed");
                (status, Json(serde_json::json!({ "error": "Internal server error" })))
                    .into_response()
            }
            ApiError::NotJson(reason) => {
                warn!(%reason, "request body rejected");
                (status, Json(serde_json::json!({ "error": "Request must be JSON" }))).into_response()
            }
            ApiError::ModelError(data) => {
                warn!("model answered with an error object");
                (status, Json(Value::Object(data))).into_response()
            }
            other => {
                warn!(error = %other, "request rejected");
                (status, Json(serde_json::json!({ "error": other.to_string() }))).into_response()
            }
        }
    }
}

// --- Handlers ---

/// `query` of a JSON object body. A missing key reads as an empty query.
fn query_from(body: &Value) -> Result<&str, ApiError> {
    let Value::Object(fields) = body else {
        return Err(ApiError::NotJson("body is not a JSON object".to_string()));
    };
    match fields.get("query") {
        None | Some(Value::Null) => Ok(""),
        Some(Value::String(query)) => Ok(query),
        Some(_) => Err(ApiError::NotJson("`query` is not a string".to_string())),
    }
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::NotJson(rejection.body_text()))?;
    let query = query_from(&body)?.trim();
    if query.is_empty() {
        return Err(ApiError::EmptyQuery);
    }
    info!(query_len = query.len(), "generate request");

    let code = match generate(state.client.as_ref(), query)
        .await
        .map_err(ApiError::Internal)?
    {
        GenerationResult::Success { code } => code,
        GenerationResult::Failure { message } => return Err(ApiError::Generation(message)),
        GenerationResult::Passthrough(data) if data.contains_key("error") => {
            return Err(ApiError::ModelError(data))
        }
        GenerationResult::Passthrough(_) => return Err(ApiError::InvalidSyntax),
    };

    // Checked again at the boundary before anything reaches the browser.
    if DiagramKind::detect(&code).is_none() {
        return Err(ApiError::InvalidSyntax);
    }
    Ok(Json(GenerateResponse { code }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/generate", post(generate_handler))
        .with_state(state)
}

/// Serve until the process is stopped.
pub async fn run(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "flowsmith listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_defaults_to_local_port_5000() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
    }

    #[test]
    fn bind_addr_is_read_and_validated() {
        let config = ServerConfig::from_lookup(|_| Some("0.0.0.0:8080".into())).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);

        let err = ServerConfig::from_lookup(|_| Some("localhost".into())).unwrap_err();
        assert!(err.to_string().starts_with("configuration error: invalid BIND_ADDR 'localhost'"));
    }

    #[test]
    fn only_internal_errors_are_server_errors() {
        assert_eq!(
            ApiError::Internal(Error::Completion("timeout".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::EmptyQuery.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidSyntax.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Internal(Error::Completion("x".into())).to_string(), "Internal server error");
    }
}
