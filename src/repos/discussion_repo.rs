/*
 * Responsibility
 * - discussions の永続化インターフェース
 * - 内部 ID (i64) のまま扱う。公開 ID への encode は handler 側
 * - vote / reply の追加削除は post 単位で直列化されること (lost update を起こさない)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ReplyRef;
use crate::repos::error::{RepoError, RepoResult};
use crate::services::policy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRow {
    pub post_id: i64,
    pub content: String,
    pub author: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub votes: u64,
    pub replies: Vec<ReplyRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRow {
    pub reply_id: Uuid,
    pub content: String,
    pub author: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewPost<'a> {
    pub content: &'a str,
    pub author: &'a str,
    pub author_id: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct NewReply<'a> {
    pub content: &'a str,
    pub author: &'a str,
    pub author_id: &'a str,
}

/// Canonical storage for discussions.
///
/// Not-found posts surface as `Ok(None)` / `Ok(false)`, so handlers decide the
/// HTTP meaning. Implementations must be cheap to share (`Arc<dyn ...>`).
#[async_trait]
pub trait DiscussionRepo: Send + Sync + 'static {
    // Returns the backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // All posts in creation order. Ordering for display is the client's job.
    async fn list(&self) -> RepoResult<Vec<PostRow>>;

    async fn get(&self, post_id: i64) -> RepoResult<Option<PostRow>>;

    async fn create(&self, new: NewPost<'_>) -> RepoResult<PostRow>;

    // Changes content only. id, author and created_at are left as they are.
    async fn update_content(&self, post_id: i64, content: &str) -> RepoResult<Option<PostRow>>;

    // Removes the post together with its replies.
    async fn delete(&self, post_id: i64) -> RepoResult<bool>;

    // votes += 1, atomic with respect to concurrent voters.
    async fn increment_votes(&self, post_id: i64) -> RepoResult<Option<PostRow>>;

    async fn append_reply(&self, post_id: i64, new: NewReply<'_>) -> RepoResult<Option<PostRow>>;

    // Resolves `target` and checks that `requester_id` owns the reply within
    // the same critical section as the removal, so a shifting position can
    // never delete someone else's reply.
    async fn remove_reply(
        &self,
        post_id: i64,
        target: ReplyRef,
        requester_id: &str,
    ) -> RepoResult<Option<PostRow>>;
}

/// Finds the position of `target` in `replies` and checks ownership.
///
/// Shared by the backends so positional and id addressing behave identically.
pub(crate) fn resolve_reply(
    replies: &[ReplyRow],
    target: ReplyRef,
    requester_id: &str,
) -> RepoResult<usize> {
    let position = match target {
        ReplyRef::Id(id) => replies
            .iter()
            .position(|r| r.reply_id == id)
            .ok_or(RepoError::ReplyNotFound)?,
        ReplyRef::Index(index) => usize::try_from(index)
            .ok()
            .filter(|i| *i < replies.len())
            .ok_or(RepoError::ReplyOutOfRange {
                index,
                len: replies.len(),
            })?,
    };

    let reply = replies.get(position).ok_or(RepoError::ReplyNotFound)?;
    if !policy::is_owner(requester_id, &reply.author_id) {
        return Err(RepoError::NotOwner);
    }

    Ok(position)
}
