use crate::database::models::PostRecord;
use crate::database::repositories::PostRepository;
use crate::database::Database;
use crate::error::{CommentError, CommentResult};
use crate::utils::now_utc_iso;
use uuid::Uuid;

/// Slug of the pseudo-post that backs the guest book page.
pub const GUESTBOOK_SLUG: &str = "guestbook";

/// Resolves post slugs for the comment subsystem. Posts themselves are owned
/// by the publishing side; comments only ever read them.
pub trait PostLookup: Send + Sync {
    fn resolve(&self, slug: &str) -> CommentResult<String>;
}

#[derive(Clone)]
pub struct PostDirectory {
    database: Database,
}

impl PostDirectory {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

impl PostLookup for PostDirectory {
    fn resolve(&self, slug: &str) -> CommentResult<String> {
        let post = self.database.with_repositories(|repos| {
            let posts = repos.posts();
            if let Some(post) = posts.get_by_slug(slug)? {
                return Ok(Some(post));
            }
            if slug != GUESTBOOK_SLUG {
                return Ok(None);
            }
            let created = posts.ensure_by_slug(&guestbook_record())?;
            tracing::info!(post_id = %created.id, "provisioned guestbook post");
            Ok(Some(created))
        })?;
        post.map(|post| post.id)
            .ok_or_else(|| CommentError::PostNotFound(slug.to_string()))
    }
}

fn guestbook_record() -> PostRecord {
    PostRecord {
        id: Uuid::new_v4().to_string(),
        slug: GUESTBOOK_SLUG.to_string(),
        title: "Guest Book".to_string(),
        content: "Guest Book Content".to_string(),
        category: "System".to_string(),
        is_published: true,
        created_at: now_utc_iso(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guestbook_is_created_once() {
        let db = crate::database::in_memory();
        let directory = PostDirectory::new(db.clone());

        let first = directory.resolve(GUESTBOOK_SLUG).unwrap();
        let second = directory.resolve(GUESTBOOK_SLUG).unwrap();
        assert_eq!(first, second);

        let stored = db
            .with_repositories(|repos| repos.posts().get(&first))
            .unwrap()
            .expect("guestbook row");
        assert_eq!(stored.title, "Guest Book");
        assert_eq!(stored.category, "System");
        assert!(stored.is_published);
    }

    #[test]
    fn unknown_slug_is_not_found() {
        let directory = PostDirectory::new(crate::database::in_memory());
        assert!(matches!(
            directory.resolve("does-not-exist").unwrap_err(),
            CommentError::PostNotFound(slug) if slug == "does-not-exist"
        ));
    }

    #[test]
    fn existing_post_resolves_to_its_id() {
        let db = crate::database::in_memory();
        db.with_repositories(|repos| {
            repos.posts().create(&PostRecord {
                id: "post-9".into(),
                slug: "rust-notes".into(),
                title: "Rust notes".into(),
                content: "…".into(),
                category: "Dev".into(),
                is_published: true,
                created_at: now_utc_iso(),
            })
        })
        .unwrap();
        let directory = PostDirectory::new(db);
        assert_eq!(directory.resolve("rust-notes").unwrap(), "post-9");
    }
}
