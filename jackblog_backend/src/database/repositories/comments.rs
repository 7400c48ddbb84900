use crate::database::models::{CommentRecord, NewCommentRecord};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteCommentRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const SELECT_COMMENT: &str = r#"
    SELECT id, post_id, parent_id, depth, author_name, author_email,
           password_hash, content, is_deleted, created_at
    FROM comments
"#;

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRecord> {
    Ok(CommentRecord {
        id: row.get(0)?,
        post_id: row.get(1)?,
        parent_id: row.get(2)?,
        depth: row.get(3)?,
        author_name: row.get(4)?,
        author_email: row.get(5)?,
        password_hash: row.get(6)?,
        content: row.get(7)?,
        is_deleted: row.get::<_, i64>(8)? != 0,
        created_at: row.get(9)?,
    })
}

impl<'conn> super::CommentRepository for SqliteCommentRepository<'conn> {
    fn create(&self, record: &NewCommentRecord) -> Result<CommentRecord> {
        self.conn.execute(
            r#"
            INSERT INTO comments
            (post_id, parent_id, depth, author_name, author_email, password_hash, content, is_deleted, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)
            "#,
            params![
                record.post_id,
                record.parent_id,
                record.depth,
                record.author_name,
                record.author_email,
                record.password_hash,
                record.content,
                record.created_at
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get(id)?
            .with_context(|| format!("comment {id} missing right after insert"))
    }

    fn get(&self, id: i64) -> Result<Option<CommentRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("{SELECT_COMMENT} WHERE id = ?1"),
                params![id],
                map_comment,
            )
            .optional()?)
    }

    fn list_for_post(&self, post_id: &str) -> Result<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COMMENT} WHERE post_id = ?1 ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![post_id], map_comment)?;
        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    fn count_children(&self, parent_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM comments
            WHERE parent_id = ?1
            "#,
            params![parent_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn tombstone(
        &self,
        id: i64,
        author_placeholder: &str,
        content_placeholder: &str,
    ) -> Result<bool> {
        let affected = self.conn.execute(
            r#"
            UPDATE comments
            SET is_deleted = 1, author_name = ?2, content = ?3
            WHERE id = ?1 AND is_deleted = 0
            "#,
            params![id, author_placeholder, content_placeholder],
        )?;
        Ok(affected > 0)
    }
}
