use crate::database::models::{CommentRecord, NewCommentRecord};
use crate::database::repositories::{CommentRepository, PostRepository, SqliteRepositories};
use crate::database::Database;
use crate::error::{CommentError, CommentResult};
use crate::moderation::{deletion_action, DeletionAction};
use crate::tree::{build_tree, CommentNode};
use crate::utils::now_utc_iso;
use anyhow::anyhow;

/// Deepest level a reply may sit at: root (0), reply (1), reply-to-reply (2).
pub const MAX_DEPTH: u8 = 2;
pub const DELETED_CONTENT: &str = "삭제된 댓글입니다.";
pub const DELETED_AUTHOR: &str = "알 수 없음";

/// Author fields of a new comment. The password has already been hashed.
#[derive(Debug, Clone)]
pub struct CommentAuthor {
    pub name: String,
    pub email: Option<String>,
    pub password_hash: String,
}

/// Durable storage of comment trees. Every method runs in one transaction,
/// so concurrent writers observe each other's changes whole or not at all.
#[derive(Clone)]
pub struct ThreadStore {
    database: Database,
}

impl ThreadStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create_root(
        &self,
        post_id: &str,
        author: CommentAuthor,
        content: String,
    ) -> CommentResult<CommentRecord> {
        self.database.transaction(|repos| {
            if repos.posts().get(post_id)?.is_none() {
                return Err(CommentError::PostNotFound(post_id.to_string()));
            }
            let record = NewCommentRecord {
                post_id: post_id.to_string(),
                parent_id: None,
                depth: 0,
                author_name: author.name,
                author_email: author.email,
                password_hash: author.password_hash,
                content,
                created_at: now_utc_iso(),
            };
            let stored = repos.comments().create(&record)?;
            tracing::info!(comment_id = stored.id, post_id, "root comment created");
            Ok(stored)
        })
    }

    pub fn create_reply(
        &self,
        parent_id: i64,
        author: CommentAuthor,
        content: String,
    ) -> CommentResult<CommentRecord> {
        self.database.transaction(|repos| {
            let parent = load(repos, parent_id)?;
            if parent.depth >= MAX_DEPTH {
                return Err(CommentError::DepthExceeded);
            }
            let record = NewCommentRecord {
                post_id: parent.post_id.clone(),
                parent_id: Some(parent.id),
                depth: parent.depth + 1,
                author_name: author.name,
                author_email: author.email,
                password_hash: author.password_hash,
                content,
                created_at: now_utc_iso(),
            };
            let stored = repos.comments().create(&record)?;
            tracing::info!(
                comment_id = stored.id,
                parent_id,
                depth = stored.depth,
                "reply created"
            );
            Ok(stored)
        })
    }

    /// Root comments of a post with their replies nested, oldest first at
    /// every level.
    pub fn list_roots(&self, post_id: &str) -> CommentResult<Vec<CommentNode>> {
        let records = self
            .database
            .with_repositories(|repos| repos.comments().list_for_post(post_id))?;
        Ok(build_tree(records))
    }

    pub fn find_by_id(&self, comment_id: i64) -> CommentResult<CommentRecord> {
        self.database.transaction(|repos| load(repos, comment_id))
    }

    pub fn reply_count(&self, comment_id: i64) -> CommentResult<usize> {
        self.database.transaction(|repos| {
            load(repos, comment_id)?;
            Ok(repos.comments().count_children(comment_id)?)
        })
    }

    /// Physically deletes a comment. Refuses when the comment has replies.
    pub fn remove(&self, comment_id: i64) -> CommentResult<()> {
        self.database.transaction(|repos| {
            load(repos, comment_id)?;
            remove_leaf(repos, comment_id)
        })
    }

    /// Replaces author and content with placeholders, keeping the comment's
    /// place in the tree. Tombstoning twice is a no-op.
    pub fn tombstone(&self, comment_id: i64) -> CommentResult<()> {
        self.database.transaction(|repos| {
            load(repos, comment_id)?;
            mark_deleted(repos, comment_id)
        })
    }

    /// Looks at the comment's replies, picks tombstone or removal and applies
    /// it, all under one transaction.
    pub fn delete(&self, comment_id: i64) -> CommentResult<DeletionAction> {
        self.delete_with(comment_id, |_| Ok(()))
    }

    /// Like [`ThreadStore::delete`], but `gate` sees the stored comment first
    /// and may reject the request. Gate, policy and action share one
    /// transaction; a rejected request leaves the comment untouched.
    pub fn delete_with<G>(&self, comment_id: i64, gate: G) -> CommentResult<DeletionAction>
    where
        G: FnOnce(&CommentRecord) -> CommentResult<()>,
    {
        self.database.transaction(|repos| {
            let comment = load(repos, comment_id)?;
            gate(&comment)?;
            let replies = repos.comments().count_children(comment_id)?;
            let action = deletion_action(replies);
            match action {
                DeletionAction::Tombstone => mark_deleted(repos, comment_id)?,
                DeletionAction::Remove => remove_leaf(repos, comment_id)?,
            }
            Ok(action)
        })
    }
}

fn load(repos: &SqliteRepositories<'_>, comment_id: i64) -> CommentResult<CommentRecord> {
    repos
        .comments()
        .get(comment_id)?
        .ok_or(CommentError::CommentNotFound(comment_id))
}

fn remove_leaf(repos: &SqliteRepositories<'_>, comment_id: i64) -> CommentResult<()> {
    let replies = repos.comments().count_children(comment_id)?;
    if replies > 0 {
        return Err(anyhow!("refusing to remove comment {comment_id} with {replies} replies").into());
    }
    if !repos.comments().delete(comment_id)? {
        return Err(CommentError::CommentNotFound(comment_id));
    }
    tracing::info!(comment_id, "comment removed");
    Ok(())
}

fn mark_deleted(repos: &SqliteRepositories<'_>, comment_id: i64) -> CommentResult<()> {
    if repos
        .comments()
        .tombstone(comment_id, DELETED_AUTHOR, DELETED_CONTENT)?
    {
        tracing::info!(comment_id, "comment tombstoned");
    } else {
        tracing::debug!(comment_id, "comment already tombstoned");
    }
    Ok(())
}
