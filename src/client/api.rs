//! Request/response contract against the canonical server state.
use async_trait::async_trait;

use crate::client::error::ForumResult;
use crate::domain::{Post, Principal, ReplyRef};

/// Operations that read or mutate canonical server state.
///
/// Each call is one request/response pair; there is no cancellation once a
/// request has been issued. Mutating calls name the acting principal
/// explicitly, so the implementation holds no identity of its own.
#[async_trait]
pub trait ForumApi: Send + Sync {
    /// All posts, unsorted. Ordering is the caller's job.
    async fn list_posts(&self) -> ForumResult<Vec<Post>>;

    /// The server assigns `id`, `timestamp`, `votes = 0` and `replies = []`.
    async fn create_post(&self, content: &str, author: &Principal) -> ForumResult<Post>;

    async fn edit_post(&self, id: &str, content: &str, caller: &Principal) -> ForumResult<Post>;

    async fn delete_post(&self, id: &str, caller: &Principal) -> ForumResult<()>;

    /// `votes += 1`, applied atomically by the server.
    async fn vote_post(&self, id: &str, caller: &Principal) -> ForumResult<Post>;

    async fn add_reply(&self, id: &str, content: &str, author: &Principal) -> ForumResult<Post>;

    async fn delete_reply(
        &self,
        id: &str,
        reply: ReplyRef,
        caller: &Principal,
    ) -> ForumResult<Post>;
}
