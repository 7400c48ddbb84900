use crate::crypto::PasswordHasher;
use crate::database::Database;
use crate::error::{CommentError, CommentResult};
use crate::moderation::{authorize, DeleteAuthorization, DeletionAction};
use crate::posts::{PostDirectory, PostLookup};
use crate::threading::{CommentAuthor, ThreadStore};
use crate::tree::CommentNode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_AUTHOR_NAME_CHARS: usize = 100;
const MAX_EMAIL_CHARS: usize = 255;
const MIN_PASSWORD_CHARS: usize = 4;
const MAX_PASSWORD_CHARS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub author_name: String,
    #[serde(default)]
    pub author_email: Option<String>,
    pub password: String,
    pub content: String,
}

impl CreateCommentInput {
    /// Checks field constraints and normalizes a blank email to `None`.
    pub fn validate(mut self) -> CommentResult<Self> {
        if self.author_name.trim().is_empty() {
            return Err(CommentError::bad_request("authorName: Author name is required"));
        }
        if self.author_name.chars().count() > MAX_AUTHOR_NAME_CHARS {
            return Err(CommentError::bad_request(
                "authorName: Author name must be less than 100 characters",
            ));
        }

        self.author_email = self
            .author_email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());
        if let Some(email) = &self.author_email {
            if email.chars().count() > MAX_EMAIL_CHARS {
                return Err(CommentError::bad_request(
                    "authorEmail: Email must be less than 255 characters",
                ));
            }
            if !looks_like_email(email) {
                return Err(CommentError::bad_request("authorEmail: Invalid email format"));
            }
        }

        if self.password.trim().is_empty() {
            return Err(CommentError::bad_request("password: Password is required"));
        }
        let password_len = self.password.chars().count();
        if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&password_len) {
            return Err(CommentError::bad_request(
                "password: Password must be between 4 and 50 characters",
            ));
        }

        if self.content.trim().is_empty() {
            return Err(CommentError::bad_request("content: Content is required"));
        }
        Ok(self)
    }
}

fn looks_like_email(raw: &str) -> bool {
    let mut parts = raw.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !raw.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

/// Entry point for everything a reader or the admin can do with comments.
#[derive(Clone)]
pub struct CommentService {
    store: ThreadStore,
    posts: Arc<dyn PostLookup>,
    hasher: Arc<dyn PasswordHasher>,
}

impl CommentService {
    pub fn new(database: Database, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            store: ThreadStore::new(database.clone()),
            posts: Arc::new(PostDirectory::new(database)),
            hasher,
        }
    }

    pub fn with_post_lookup(mut self, posts: Arc<dyn PostLookup>) -> Self {
        self.posts = posts;
        self
    }

    pub fn list_threads(&self, slug: &str) -> CommentResult<Vec<CommentNode>> {
        let post_id = self.posts.resolve(slug)?;
        self.store.list_roots(&post_id)
    }

    pub fn create_comment(
        &self,
        slug: &str,
        input: CreateCommentInput,
    ) -> CommentResult<CommentNode> {
        let input = input.validate()?;
        let post_id = self.posts.resolve(slug)?;
        let (author, content) = self.author_of(input)?;
        let stored = self.store.create_root(&post_id, author, content)?;
        Ok(CommentNode::leaf(stored))
    }

    pub fn create_reply(
        &self,
        parent_id: i64,
        input: CreateCommentInput,
    ) -> CommentResult<CommentNode> {
        let input = input.validate()?;
        // Fail fast before paying for the hash; the store re-checks both.
        let parent = self.store.find_by_id(parent_id)?;
        if parent.depth >= crate::threading::MAX_DEPTH {
            return Err(CommentError::DepthExceeded);
        }
        let (author, content) = self.author_of(input)?;
        let stored = self.store.create_reply(parent_id, author, content)?;
        Ok(CommentNode::leaf(stored))
    }

    /// Self-service delete. The credentials are checked against the stored
    /// comment inside the same transaction that applies the deletion.
    pub fn delete_comment(
        &self,
        comment_id: i64,
        authorization: &DeleteAuthorization,
    ) -> CommentResult<DeletionAction> {
        self.store.delete_with(comment_id, |comment| {
            authorize(authorization, comment, self.hasher.as_ref())
        })
    }

    /// Delete on behalf of an administrator who authenticated elsewhere.
    pub fn delete_comment_admin(&self, comment_id: i64) -> CommentResult<DeletionAction> {
        let action = self.store.delete(comment_id)?;
        tracing::info!(comment_id, ?action, "admin deleted comment");
        Ok(action)
    }

    fn author_of(&self, input: CreateCommentInput) -> CommentResult<(CommentAuthor, String)> {
        let password_hash = self.hasher.hash(&input.password)?;
        Ok((
            CommentAuthor {
                name: input.author_name,
                email: input.author_email,
                password_hash,
            },
            input.content,
        ))
    }
}
