use crate::database::models::PostRecord;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const SELECT_POST: &str = r#"
    SELECT id, slug, title, content, category, is_published, created_at
    FROM posts
"#;

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        category: row.get(4)?,
        is_published: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO posts (id, slug, title, content, category, is_published, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.slug,
                record.title,
                record.content,
                record.category,
                if record.is_published { 1 } else { 0 },
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        Ok(self
            .conn
            .query_row(&format!("{SELECT_POST} WHERE id = ?1"), params![id], map_post)
            .optional()?)
    }

    fn get_by_slug(&self, slug: &str) -> Result<Option<PostRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("{SELECT_POST} WHERE slug = ?1"),
                params![slug],
                map_post,
            )
            .optional()?)
    }

    fn ensure_by_slug(&self, record: &PostRecord) -> Result<PostRecord> {
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO posts (id, slug, title, content, category, is_published, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.slug,
                record.title,
                record.content,
                record.category,
                if record.is_published { 1 } else { 0 },
                record.created_at
            ],
        )?;
        self.get_by_slug(&record.slug)?
            .with_context(|| format!("post {} vanished after insert", record.slug))
    }
}
