use crate::database::models::CommentRecord;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Presentation form of a comment with its replies attached. Email and
/// password hash never leave the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: i64,
    #[serde(skip)]
    pub parent_id: Option<i64>,
    pub author_name: String,
    pub content: String,
    pub depth: u8,
    pub is_deleted: bool,
    pub created_at: String,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn leaf(record: CommentRecord) -> Self {
        Self::with_replies(record, Vec::new())
    }

    fn with_replies(record: CommentRecord, replies: Vec<CommentNode>) -> Self {
        Self {
            id: record.id,
            parent_id: record.parent_id,
            author_name: record.author_name,
            content: record.content,
            depth: record.depth,
            is_deleted: record.is_deleted,
            created_at: record.created_at,
            replies,
        }
    }
}

/// Nests the flat comments of one post. Roots and every reply list come out
/// in creation order (ties broken by id). A reply whose parent is not among
/// `records` is dropped.
pub fn build_tree(mut records: Vec<CommentRecord>) -> Vec<CommentNode> {
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let known: HashSet<i64> = records.iter().map(|r| r.id).collect();
    let mut roots = Vec::new();
    let mut children: HashMap<i64, Vec<CommentRecord>> = HashMap::new();
    for record in records {
        match record.parent_id {
            None => roots.push(record),
            Some(parent) if known.contains(&parent) => {
                children.entry(parent).or_default().push(record)
            }
            Some(parent) => {
                tracing::warn!(comment_id = record.id, parent, "dropping orphaned reply");
            }
        }
    }

    roots
        .into_iter()
        .map(|root| attach(root, &mut children))
        .collect()
}

// Each id is taken out of `children` once, so recursion ends after at most
// MAX_DEPTH levels on well-formed data and cannot loop on malformed data.
fn attach(record: CommentRecord, children: &mut HashMap<i64, Vec<CommentRecord>>) -> CommentNode {
    let replies = children
        .remove(&record.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach(child, children))
        .collect();
    CommentNode::with_replies(record, replies)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, parent_id: Option<i64>, depth: u8, created_at: &str) -> CommentRecord {
        CommentRecord {
            id,
            post_id: "post".into(),
            parent_id,
            depth,
            author_name: format!("author-{id}"),
            author_email: None,
            password_hash: "digest".into(),
            content: format!("content-{id}"),
            is_deleted: false,
            created_at: created_at.into(),
        }
    }

    #[test]
    fn nests_three_levels_in_creation_order() {
        let records = vec![
            record(4, Some(1), 1, "2024-01-01T00:00:04Z"),
            record(1, None, 0, "2024-01-01T00:00:01Z"),
            record(3, Some(2), 2, "2024-01-01T00:00:03Z"),
            record(2, Some(1), 1, "2024-01-01T00:00:02Z"),
            record(5, None, 0, "2024-01-01T00:00:05Z"),
        ];
        let tree = build_tree(records);

        assert_eq!(tree.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 5]);
        let first = &tree[0];
        assert_eq!(first.replies.iter().map(|n| n.id).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(first.replies[0].replies[0].id, 3);
        assert_eq!(first.replies[0].replies[0].depth, 2);
        assert!(first.replies[1].replies.is_empty());
        assert!(tree[1].replies.is_empty());
    }

    #[test]
    fn equal_timestamps_fall_back_to_id() {
        let at = "2024-01-01T00:00:00Z";
        let tree = build_tree(vec![record(9, None, 0, at), record(3, None, 0, at)]);
        assert_eq!(tree.iter().map(|n| n.id).collect::<Vec<_>>(), vec![3, 9]);
    }

    #[test]
    fn tombstones_stay_in_place() {
        let mut root = record(1, None, 0, "2024-01-01T00:00:01Z");
        root.is_deleted = true;
        root.content = "삭제된 댓글입니다.".into();
        let tree = build_tree(vec![root, record(2, Some(1), 1, "2024-01-01T00:00:02Z")]);
        assert!(tree[0].is_deleted);
        assert_eq!(tree[0].replies.len(), 1);
    }

    #[test]
    fn orphans_are_dropped() {
        let tree = build_tree(vec![
            record(1, None, 0, "2024-01-01T00:00:01Z"),
            record(2, Some(42), 1, "2024-01-01T00:00:02Z"),
        ]);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].replies.is_empty());
    }

    #[test]
    fn serializes_without_private_fields() {
        let node = CommentNode::leaf(record(1, None, 0, "2024-01-01T00:00:01Z"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["authorName"], "author-1");
        assert_eq!(json["isDeleted"], false);
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("parentId").is_none());
        assert_eq!(json["replies"].as_array().unwrap().len(), 0);
    }
}
