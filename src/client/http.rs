//! Reqwest-backed [`ForumApi`] adapter.
//!
//! Owns transport details only: URL building, bearer identity, JSON bodies
//! and mapping HTTP failures onto [`ForumError`].
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::client::api::ForumApi;
use crate::client::config::ClientConfig;
use crate::client::error::{ForumError, ForumResult};
use crate::domain::{Post, Principal, ReplyRef};
use crate::error::{CODE_REPLY_OUT_OF_RANGE, ErrorResponse};

const DISCUSSIONS: &str = "discussions";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewPostBody<'a> {
    content: &'a str,
    author: &'a str,
    author_id: &'a str,
    timestamp: String,
    votes: u64,
    replies: [(); 0],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewReplyBody<'a> {
    content: &'a str,
    author: &'a str,
    author_id: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct EditBody<'a> {
    content: &'a str,
}

/// Stateless with respect to identity: the acting principal is passed to each
/// mutating call and sent as the bearer value (the user id issued by the
/// identity provider).
#[derive(Debug, Clone)]
pub struct HttpForumApi {
    client: Client,
    base_url: Url,
}

impl HttpForumApi {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &ClientConfig) -> ForumResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> ForumResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ForumError::Network(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push(DISCUSSIONS)
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> ForumResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status_error(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ForumResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ForumError::Network(format!("unexpected response body: {e}")))
    }
}

fn map_status_error(status: StatusCode, body: &str) -> ForumError {
    let (code, message) = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => (parsed.error.code, parsed.error.message),
        Err(_) => (String::new(), format!("HTTP {status}")),
    };

    match status {
        StatusCode::NOT_FOUND => ForumError::NotFound(message),
        StatusCode::BAD_REQUEST if code == CODE_REPLY_OUT_OF_RANGE => {
            ForumError::OutOfRange(message)
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ForumError::Validation(message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ForumError::Authorization(message),
        _ => ForumError::Network(message),
    }
}

#[async_trait]
impl ForumApi for HttpForumApi {
    async fn list_posts(&self) -> ForumResult<Vec<Post>> {
        let url = self.url(&[])?;
        self.send_json(self.client.get(url)).await
    }

    async fn create_post(&self, content: &str, author: &Principal) -> ForumResult<Post> {
        let url = self.url(&[])?;
        let body = NewPostBody {
            content,
            author: &author.display_name,
            author_id: &author.user_id,
            timestamp: Utc::now().to_rfc3339(),
            votes: 0,
            replies: [],
        };
        let request = self.client.post(url).bearer_auth(&author.user_id);
        self.send_json(request.json(&body)).await
    }

    async fn edit_post(&self, id: &str, content: &str, caller: &Principal) -> ForumResult<Post> {
        let url = self.url(&[id])?;
        let request = self.client.put(url).bearer_auth(&caller.user_id);
        self.send_json(request.json(&EditBody { content })).await
    }

    async fn delete_post(&self, id: &str, caller: &Principal) -> ForumResult<()> {
        let url = self.url(&[id])?;
        self.send(self.client.delete(url).bearer_auth(&caller.user_id))
            .await?;
        Ok(())
    }

    async fn vote_post(&self, id: &str, caller: &Principal) -> ForumResult<Post> {
        let url = self.url(&["vote", id])?;
        self.send_json(self.client.put(url).bearer_auth(&caller.user_id))
            .await
    }

    async fn add_reply(&self, id: &str, content: &str, author: &Principal) -> ForumResult<Post> {
        let url = self.url(&["reply", id])?;
        let body = NewReplyBody {
            content,
            author: &author.display_name,
            author_id: &author.user_id,
            timestamp: Utc::now().to_rfc3339(),
        };
        let request = self.client.put(url).bearer_auth(&author.user_id);
        self.send_json(request.json(&body)).await
    }

    async fn delete_reply(
        &self,
        id: &str,
        reply: ReplyRef,
        caller: &Principal,
    ) -> ForumResult<Post> {
        let reply = reply.to_string();
        let url = self.url(&["reply", id, &reply])?;
        self.send_json(self.client.delete(url).bearer_auth(&caller.user_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn api(base: &str) -> HttpForumApi {
        HttpForumApi::new(&ClientConfig::new(base).unwrap()).unwrap()
    }

    #[test]
    fn urls_follow_the_wire_contract() {
        let api = api("http://localhost:3000");

        assert_eq!(
            api.url(&[]).unwrap().as_str(),
            "http://localhost:3000/discussions"
        );
        assert_eq!(
            api.url(&["vote", "abc"]).unwrap().as_str(),
            "http://localhost:3000/discussions/vote/abc"
        );
        let reply = ReplyRef::Id(Uuid::nil()).to_string();
        assert_eq!(
            api.url(&["reply", "abc", &reply]).unwrap().as_str(),
            "http://localhost:3000/discussions/reply/abc/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let api = api("http://example.test/forum/");
        assert_eq!(
            api.url(&["x"]).unwrap().as_str(),
            "http://example.test/forum/discussions/x"
        );
    }

    #[test]
    fn ids_are_escaped_as_single_segments() {
        let api = api("http://localhost:3000/");
        assert_eq!(
            api.url(&["a/b"]).unwrap().as_str(),
            "http://localhost:3000/discussions/a%2Fb"
        );
    }

    #[test]
    fn maps_status_and_code_to_error_kinds() {
        let out_of_range =
            r#"{"error":{"code":"REPLY_OUT_OF_RANGE","message":"reply index 4 is out of range"}}"#;
        let invalid = r#"{"error":{"code":"INVALID_CONTENT","message":"content is required"}}"#;

        assert_eq!(
            map_status_error(StatusCode::BAD_REQUEST, out_of_range),
            ForumError::OutOfRange("reply index 4 is out of range".into())
        );
        assert_eq!(
            map_status_error(StatusCode::BAD_REQUEST, invalid),
            ForumError::Validation("content is required".into())
        );
        assert!(matches!(
            map_status_error(StatusCode::NOT_FOUND, ""),
            ForumError::NotFound(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::FORBIDDEN, ""),
            ForumError::Authorization(_)
        ));
        assert_eq!(
            map_status_error(StatusCode::BAD_GATEWAY, "<html>"),
            ForumError::Network("HTTP 502 Bad Gateway".into())
        );
    }

    #[test]
    fn new_post_body_matches_the_wire_shape() {
        let body = NewPostBody {
            content: "Hello",
            author: "Ada",
            author_id: "u1",
            timestamp: "2025-01-01T00:00:00+00:00".into(),
            votes: 0,
            replies: [],
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["authorId"], "u1");
        assert_eq!(value["votes"], 0);
        assert_eq!(value["replies"], serde_json::json!([]));
    }
}
