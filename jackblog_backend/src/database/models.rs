use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_published: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: i64,
    pub post_id: String,
    pub parent_id: Option<i64>,
    pub depth: u8,
    pub author_name: String,
    pub author_email: Option<String>,
    pub password_hash: String,
    pub content: String,
    pub is_deleted: bool,
    pub created_at: String,
}

/// Insert payload; the store assigns `id` and the comment starts undeleted.
#[derive(Debug, Clone)]
pub struct NewCommentRecord {
    pub post_id: String,
    pub parent_id: Option<i64>,
    pub depth: u8,
    pub author_name: String,
    pub author_email: Option<String>,
    pub password_hash: String,
    pub content: String,
    pub created_at: String,
}
