/*
 * Responsibility
 * - Post / Reply の wire 表現 (camelCase: authorId)
 * - id は公開 ID (server が採番し encode 済み)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A top-level discussion entry.
///
/// `id`, `author_id` and `timestamp` are fixed at creation. `votes` only ever
/// grows through the vote operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    // older payloads use the document-store key
    #[serde(alias = "_id")]
    pub id: String,
    pub content: String,
    pub author: String,
    pub author_id: String,
    pub timestamp: DateTime<Utc>,
    pub votes: u64,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Post {
    pub fn reply(&self, reply_id: Uuid) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == reply_id)
    }
}

/// A response attached to exactly one post. Display order is insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: Uuid,
    pub content: String,
    pub author: String,
    pub author_id: String,
    pub timestamp: DateTime<Utc>,
}

/// The authenticated actor as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: String,
    pub display_name: String,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_legacy_document_id() {
        let raw = r#"{
            "_id": "abc123",
            "content": "Hello",
            "author": "Ada",
            "authorId": "u1",
            "timestamp": "2025-01-01T00:00:00Z",
            "votes": 3
        }"#;

        let post: Post = serde_json::from_str(raw).unwrap();
        assert_eq!(post.id, "abc123");
        assert_eq!(post.author_id, "u1");
        assert!(post.replies.is_empty());
    }

    #[test]
    fn serializes_author_id_in_camel_case() {
        let reply = Reply {
            id: Uuid::nil(),
            content: "Nice!".into(),
            author: "Bob".into(),
            author_id: "u2".into(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        };

        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["authorId"], "u2");
        assert!(value.get("author_id").is_none());
    }
}
