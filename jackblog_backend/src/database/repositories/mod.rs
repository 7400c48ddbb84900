mod comments;
mod posts;

use super::models::{CommentRecord, NewCommentRecord, PostRecord};
use anyhow::Result;
use rusqlite::Connection;

pub trait PostRepository {
    fn create(&self, record: &PostRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<PostRecord>>;
    fn get_by_slug(&self, slug: &str) -> Result<Option<PostRecord>>;
    /// Inserts the record unless a post with the same slug already exists,
    /// then returns whichever row owns the slug.
    fn ensure_by_slug(&self, record: &PostRecord) -> Result<PostRecord>;
}

pub trait CommentRepository {
    fn create(&self, record: &NewCommentRecord) -> Result<CommentRecord>;
    fn get(&self, id: i64) -> Result<Option<CommentRecord>>;
    /// Every comment of a post, oldest first (ties broken by id).
    fn list_for_post(&self, post_id: &str) -> Result<Vec<CommentRecord>>;
    fn count_children(&self, parent_id: i64) -> Result<usize>;
    /// Returns whether a row was deleted.
    fn delete(&self, id: i64) -> Result<bool>;
    /// Flags the row deleted and overwrites the visible fields. Returns whether
    /// the row was changed; an already tombstoned row is left untouched.
    fn tombstone(&self, id: i64, author_placeholder: &str, content_placeholder: &str)
        -> Result<bool>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        comments::SqliteCommentRepository { conn: self.conn }
    }

    pub fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MIGRATIONS;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(MIGRATIONS).expect("base migrations");
        conn
    }

    fn post(id: &str, slug: &str) -> PostRecord {
        PostRecord {
            id: id.into(),
            slug: slug.into(),
            title: "First".into(),
            content: "Hello".into(),
            category: "General".into(),
            is_published: true,
            created_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    fn comment(post_id: &str, parent_id: Option<i64>, depth: u8, at: &str) -> NewCommentRecord {
        NewCommentRecord {
            post_id: post_id.into(),
            parent_id,
            depth,
            author_name: "jack".into(),
            author_email: None,
            password_hash: "hash".into(),
            content: "hi".into(),
            created_at: at.into(),
        }
    }

    #[test]
    fn post_repository_looks_up_by_slug() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);

        repos.posts().create(&post("post-1", "first")).unwrap();
        let fetched = repos.posts().get_by_slug("first").unwrap().unwrap();
        assert_eq!(fetched.id, "post-1");
        assert!(repos.posts().get_by_slug("missing").unwrap().is_none());
        assert!(repos.posts().get("post-1").unwrap().is_some());
    }

    #[test]
    fn ensure_by_slug_keeps_the_first_row() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);

        let first = repos.posts().ensure_by_slug(&post("a", "guestbook")).unwrap();
        let second = repos.posts().ensure_by_slug(&post("b", "guestbook")).unwrap();
        assert_eq!(first.id, "a");
        assert_eq!(second.id, "a");
    }

    #[test]
    fn comment_repository_orders_and_counts() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.posts().create(&post("post-1", "first")).unwrap();

        let comments = repos.comments();
        let late = comments
            .create(&comment("post-1", None, 0, "2024-01-01T00:00:05.000000Z"))
            .unwrap();
        let early = comments
            .create(&comment("post-1", None, 0, "2024-01-01T00:00:01.000000Z"))
            .unwrap();
        let reply = comments
            .create(&comment("post-1", Some(early.id), 1, "2024-01-01T00:00:06.000000Z"))
            .unwrap();

        let listed: Vec<i64> = comments
            .list_for_post("post-1")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(listed, vec![early.id, late.id, reply.id]);
        assert_eq!(comments.count_children(early.id).unwrap(), 1);
        assert_eq!(comments.count_children(late.id).unwrap(), 0);
        assert_eq!(reply.parent_id, Some(early.id));
        assert!(!reply.is_deleted);
    }

    #[test]
    fn tombstone_is_one_way_and_delete_reports_absence() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos.posts().create(&post("post-1", "first")).unwrap();
        let comments = repos.comments();
        let root = comments
            .create(&comment("post-1", None, 0, "2024-01-01T00:00:01.000000Z"))
            .unwrap();

        assert!(comments.tombstone(root.id, "anon", "gone").unwrap());
        assert!(!comments.tombstone(root.id, "anon", "gone").unwrap());
        let stored = comments.get(root.id).unwrap().unwrap();
        assert!(stored.is_deleted);
        assert_eq!(stored.author_name, "anon");
        assert_eq!(stored.content, "gone");
        assert_eq!(stored.password_hash, "hash");

        assert!(comments.delete(root.id).unwrap());
        assert!(!comments.delete(root.id).unwrap());
        assert!(comments.get(root.id).unwrap().is_none());
    }
}
