/// Failures surfaced by the comment subsystem. Everything except `Internal`
/// is a rejected request, never a transient fault, so callers should not
/// retry.
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("Post not found: {0}")]
    PostNotFound(String),

    #[error("Comment not found: {0}")]
    CommentNotFound(i64),

    #[error("Maximum reply depth exceeded")]
    DepthExceeded,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CommentError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        CommentError::BadRequest(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CommentError::PostNotFound(_) | CommentError::CommentNotFound(_)
        )
    }
}

pub type CommentResult<T> = Result<T, CommentError>;
