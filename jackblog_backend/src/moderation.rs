//! Deletion rules: who may delete a comment, and what deleting it means.

use crate::crypto::PasswordHasher;
use crate::database::models::CommentRecord;
use crate::error::{CommentError, CommentResult};

/// What a delete request does to the stored comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionAction {
    /// Keep the row so replies stay attached, but blank its author and content.
    Tombstone,
    /// Drop the row entirely.
    Remove,
}

/// A comment with replies is only ever tombstoned.
pub fn deletion_action(reply_count: usize) -> DeletionAction {
    if reply_count > 0 {
        DeletionAction::Tombstone
    } else {
        DeletionAction::Remove
    }
}

/// Credentials accompanying a self-service delete. Which variant is used is
/// decided by how the requester authenticated, never by the field contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteAuthorization {
    /// The shared password given when the comment was written.
    Password { secret: String },
    /// An email address vouched for by the requester's login session.
    Identity { claimed_email: String },
}

pub fn authorize(
    request: &DeleteAuthorization,
    comment: &CommentRecord,
    hasher: &dyn PasswordHasher,
) -> CommentResult<()> {
    match request {
        DeleteAuthorization::Identity { claimed_email } => {
            let owns = comment
                .author_email
                .as_deref()
                .is_some_and(|email| !email.is_empty() && email == claimed_email);
            if !owns {
                tracing::warn!(comment_id = comment.id, "identity delete rejected");
                return Err(CommentError::Unauthorized(
                    "You can only delete your own comments",
                ));
            }
        }
        DeleteAuthorization::Password { secret } => {
            if !hasher.matches(secret, &comment.password_hash)? {
                tracing::warn!(comment_id = comment.id, "password delete rejected");
                return Err(CommentError::Unauthorized("Invalid password"));
            }
        }
    }
    Ok(())
}
