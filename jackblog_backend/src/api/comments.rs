use super::{run_blocking, ApiError, ApiResult, AppState, Envelope};
use crate::comments::CreateCommentInput;
use crate::config::AdminConfig;
use crate::moderation::{DeleteAuthorization, DeletionAction};
use crate::tree::CommentNode;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

/// Delete credentials as sent by the frontend. The session layer sends
/// `identity` with the logged-in user's email; anonymous readers send
/// `password`.
#[derive(Debug, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub(crate) enum DeleteCommentRequest {
    Password { password: String },
    Identity { email: String },
}

impl From<DeleteCommentRequest> for DeleteAuthorization {
    fn from(request: DeleteCommentRequest) -> Self {
        match request {
            DeleteCommentRequest::Password { password } => {
                DeleteAuthorization::Password { secret: password }
            }
            DeleteCommentRequest::Identity { email } => DeleteAuthorization::Identity {
                claimed_email: email,
            },
        }
    }
}

pub(crate) async fn list_comments(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Vec<CommentNode>> {
    let service = state.comments.clone();
    let threads = run_blocking(move || service.list_threads(&slug)).await?;
    Ok(Json(Envelope::data(threads)))
}

pub(crate) async fn create_comment(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<CreateCommentInput>,
) -> Result<(StatusCode, Json<Envelope<CommentNode>>), ApiError> {
    let service = state.comments.clone();
    let comment = run_blocking(move || service.create_comment(&slug, payload)).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message("Comment created", comment)),
    ))
}

pub(crate) async fn create_reply(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateCommentInput>,
) -> Result<(StatusCode, Json<Envelope<CommentNode>>), ApiError> {
    let service = state.comments.clone();
    let reply = run_blocking(move || service.create_reply(id, payload)).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message("Reply created", reply)),
    ))
}

pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<DeleteCommentRequest>,
) -> ApiResult<()> {
    let service = state.comments.clone();
    let authorization = DeleteAuthorization::from(payload);
    let action = run_blocking(move || service.delete_comment(id, &authorization)).await?;
    tracing::info!(comment_id = id, ?action, "comment deleted");
    Ok(Json(Envelope::message(deleted_message(action, "Comment deleted"))))
}

pub(crate) async fn delete_comment_admin(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<()> {
    require_admin(&state.config.admin, &headers)?;
    let service = state.comments.clone();
    let action = run_blocking(move || service.delete_comment_admin(id)).await?;
    Ok(Json(Envelope::message(deleted_message(
        action,
        "Comment deleted by admin",
    ))))
}

fn deleted_message(action: DeletionAction, base: &str) -> String {
    match action {
        DeletionAction::Remove => base.to_string(),
        DeletionAction::Tombstone => format!("{base} (replies kept)"),
    }
}

fn require_admin(admin: &AdminConfig, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = admin.token.as_deref() else {
        return Err(ApiError::Unauthorized(
            "Admin access is not configured".into(),
        ));
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);
    match presented {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::Unauthorized("Admin authentication required".into())),
    }
}
