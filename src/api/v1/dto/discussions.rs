/*
 * Responsibility
 * - /discussions の request DTO と validate()
 * - response は domain::Post をそのまま返す (id は encode 済みの公開 ID)
 * - client が送ってくる timestamp / votes / replies は受け取らない (server が決める)
 */
use serde::Deserialize;

use crate::domain::{ContentError, validate_post_content, validate_reply_content};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub content: String,
    pub author: String,
    pub author_id: String,
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), ContentError> {
        validate_post_content(&self.content)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub content: String,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), ContentError> {
        validate_post_content(&self.content)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyRequest {
    pub content: String,
    pub author: String,
    pub author_id: String,
}

impl CreateReplyRequest {
    pub fn validate(&self) -> Result<(), ContentError> {
        validate_reply_content(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_ignores_client_controlled_fields() {
        let raw = r#"{
            "content": "Hello",
            "author": "Ada",
            "authorId": "u1",
            "timestamp": "2020-01-01T00:00:00Z",
            "votes": 99,
            "replies": [{"content": "forged"}]
        }"#;

        let req: CreatePostRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.author_id, "u1");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn reply_request_uses_the_reply_limit() {
        let req = CreateReplyRequest {
            content: "x".repeat(301),
            author: "Bob".into(),
            author_id: "u2".into(),
        };
        assert_eq!(req.validate(), Err(ContentError::TooLong { max: 300 }));
    }
}
