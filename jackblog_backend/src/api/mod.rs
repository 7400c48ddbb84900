mod comments;

use crate::comments::CommentService;
use crate::config::BlogConfig;
use crate::crypto::Argon2Passwords;
use crate::database::Database;
use crate::error::{CommentError, CommentResult};
use anyhow::{anyhow, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: BlogConfig,
    pub comments: CommentService,
}

impl AppState {
    pub fn new(config: BlogConfig, database: Database) -> Result<Self> {
        let hasher = Argon2Passwords::new(config.password)?;
        let comments = CommentService::new(database, Arc::new(hasher));
        Ok(Self { config, comments })
    }
}

/// Body shape shared by every endpoint: `{"success", "message"?, "data"?}`.
#[derive(Debug, Serialize)]
pub(crate) struct Envelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> Envelope<T> {
    pub(crate) fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub(crate) fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    pub(crate) fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

pub(crate) type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn into_response_parts(self) -> (StatusCode, Envelope<()>) {
        match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(%msg, "bad request");
                (StatusCode::BAD_REQUEST, Envelope::error(msg))
            }
            ApiError::NotFound(msg) => {
                tracing::warn!(%msg, "resource not found");
                (StatusCode::NOT_FOUND, Envelope::error(msg))
            }
            ApiError::Unauthorized(msg) => {
                tracing::warn!(%msg, "unauthorized");
                (StatusCode::UNAUTHORIZED, Envelope::error(msg))
            }
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Envelope::error("Internal server error"),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_response_parts();
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<CommentError> for ApiError {
    fn from(err: CommentError) -> Self {
        match err {
            CommentError::PostNotFound(_) | CommentError::CommentNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            CommentError::DepthExceeded | CommentError::BadRequest(_) => {
                ApiError::BadRequest(err.to_string())
            }
            CommentError::Unauthorized(msg) => ApiError::Unauthorized(msg.to_string()),
            CommentError::Internal(err) => ApiError::Internal(err),
        }
    }
}

/// Runs a store call on the blocking pool; SQLite access is synchronous.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> CommentResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| ApiError::Internal(anyhow!("blocking task failed: {err}")))?
        .map_err(ApiError::from)
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
    api_port: u16,
}

pub(crate) async fn health_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        api_port: state.config.api_port,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/posts/:slug/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/api/comments/:id/reply", post(comments::create_reply))
        .route("/api/comments/:id", delete(comments::delete_comment))
        .route("/api/comments/:id/admin", delete(comments::delete_comment_admin))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Tries to bind to the given port, or finds the next available port
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        let port = start_port.saturating_add(offset);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "Port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "Could not find available port in range {}-{}",
        start_port,
        start_port.saturating_add(MAX_PORT_ATTEMPTS - 1)
    )
}

pub async fn serve_http(config: BlogConfig, database: Database) -> Result<()> {
    if config.admin.token.is_none() {
        tracing::warn!("JACKBLOG_ADMIN_TOKEN unset; admin comment deletion is disabled");
    }
    let state = AppState::new(config.clone(), database)?;
    let router = router(state);

    let (listener, actual_port) = find_available_port(config.api_port).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], actual_port));

    if actual_port != config.api_port {
        tracing::warn!(
            requested_port = config.api_port,
            actual_port = actual_port,
            "Configured port was in use, bound to next available port"
        );
    }

    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
