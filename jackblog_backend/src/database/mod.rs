pub mod models;
pub mod repositories;

use crate::config::BlogPaths;
use anyhow::{anyhow, Context, Result};
use repositories::SqliteRepositories;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub(crate) const MIGRATIONS: &str = r#"
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        category TEXT NOT NULL,
        is_published INTEGER DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id TEXT NOT NULL,
        parent_id INTEGER,
        depth INTEGER NOT NULL DEFAULT 0 CHECK (depth BETWEEN 0 AND 2),
        author_name TEXT NOT NULL,
        author_email TEXT,
        password_hash TEXT NOT NULL,
        content TEXT NOT NULL,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
        FOREIGN KEY (parent_id) REFERENCES comments(id)
    );

    CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_id);
"#;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    newly_created: bool,
}

impl Database {
    pub fn connect(paths: &BlogPaths) -> Result<Self> {
        let newly_created = !paths.db_path.exists();
        let conn = Connection::open(&paths.db_path)
            .with_context(|| format!("failed to open database {:?}", paths.db_path))?;
        Ok(Self::from_connection(conn, newly_created))
    }

    pub fn from_connection(conn: Connection, newly_created: bool) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            newly_created,
        }
    }

    /// Applies the schema. Returns whether the database file was created by
    /// this process.
    pub fn ensure_migrations(&self) -> Result<bool> {
        self.with_conn(|conn| {
            conn.execute_batch(MIGRATIONS)
                .context("failed to apply schema migrations")?;
            Ok(())
        })?;
        Ok(self.newly_created)
    }

    pub fn with_repositories<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&SqliteRepositories<'_>) -> Result<T>,
    {
        self.with_conn(|conn| {
            let repos = SqliteRepositories::new(conn);
            f(&repos)
        })
    }

    /// Runs `f` inside a single SQLite transaction while holding the
    /// connection lock. Commits when `f` returns `Ok`, rolls back otherwise.
    pub fn transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        E: From<anyhow::Error>,
        F: FnOnce(&SqliteRepositories<'_>) -> std::result::Result<T, E>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))?;
        let tx = guard
            .unchecked_transaction()
            .context("failed to begin transaction")?;
        let value = {
            let repos = SqliteRepositories::new(&tx);
            f(&repos)?
        };
        tx.commit().context("failed to commit transaction")?;
        Ok(value)
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))?;
        f(&guard)
    }
}

#[cfg(test)]
pub(crate) fn in_memory() -> Database {
    let conn = Connection::open_in_memory().expect("in-memory db");
    let db = Database::from_connection(conn, true);
    db.ensure_migrations().expect("migrations");
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let db = in_memory();
        assert!(db.ensure_migrations().expect("second run"));
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let db = in_memory();
        let outcome: Result<()> = db.transaction(|repos| {
            repos.conn().execute(
                "INSERT INTO posts (id, slug, title, content, category, created_at)
                 VALUES ('p1', 'hello', 'Hello', '', 'General', '2024-01-01T00:00:00Z')",
                [],
            )?;
            anyhow::bail!("abort");
        });
        assert!(outcome.is_err());

        let count: i64 = db
            .with_repositories(|repos| {
                Ok(repos
                    .conn()
                    .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?)
            })
            .expect("count");
        assert_eq!(count, 0);
    }
}
