//! In-process discussion storage.
//!
//! Used when no database is configured and in tests. Each post sits behind its
//! own mutex: votes and reply changes on one post are serialized, while
//! unrelated posts can be mutated in parallel.
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::domain::ReplyRef;
use crate::repos::discussion_repo::{
    DiscussionRepo, NewPost, NewReply, PostRow, ReplyRow, resolve_reply,
};
use crate::repos::error::RepoResult;

#[derive(Debug, Default)]
pub struct MemoryDiscussionRepo {
    posts: RwLock<BTreeMap<i64, Arc<Mutex<PostRow>>>>,
    next_id: AtomicI64,
}

impl MemoryDiscussionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, post_id: i64) -> Option<Arc<Mutex<PostRow>>> {
        // Clone the handle and release the map lock before touching the post.
        self.posts.read().await.get(&post_id).cloned()
    }
}

#[async_trait]
impl DiscussionRepo for MemoryDiscussionRepo {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> RepoResult<Vec<PostRow>> {
        let handles: Vec<_> = self.posts.read().await.values().cloned().collect();

        let mut rows = Vec::with_capacity(handles.len());
        for handle in handles {
            rows.push(handle.lock().await.clone());
        }
        Ok(rows)
    }

    async fn get(&self, post_id: i64) -> RepoResult<Option<PostRow>> {
        match self.entry(post_id).await {
            Some(handle) => Ok(Some(handle.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn create(&self, new: NewPost<'_>) -> RepoResult<PostRow> {
        let post_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = PostRow {
            post_id,
            content: new.content.to_string(),
            author: new.author.to_string(),
            author_id: new.author_id.to_string(),
            created_at: Utc::now(),
            votes: 0,
            replies: Vec::new(),
        };

        self.posts
            .write()
            .await
            .insert(post_id, Arc::new(Mutex::new(row.clone())));

        Ok(row)
    }

    async fn update_content(&self, post_id: i64, content: &str) -> RepoResult<Option<PostRow>> {
        let Some(handle) = self.entry(post_id).await else {
            return Ok(None);
        };
        let mut post = handle.lock().await;
        post.content = content.to_string();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, post_id: i64) -> RepoResult<bool> {
        Ok(self.posts.write().await.remove(&post_id).is_some())
    }

    async fn increment_votes(&self, post_id: i64) -> RepoResult<Option<PostRow>> {
        let Some(handle) = self.entry(post_id).await else {
            return Ok(None);
        };
        let mut post = handle.lock().await;
        post.votes = post.votes.saturating_add(1);
        Ok(Some(post.clone()))
    }

    async fn append_reply(&self, post_id: i64, new: NewReply<'_>) -> RepoResult<Option<PostRow>> {
        let Some(handle) = self.entry(post_id).await else {
            return Ok(None);
        };
        let mut post = handle.lock().await;
        post.replies.push(ReplyRow {
            reply_id: Uuid::new_v4(),
            content: new.content.to_string(),
            author: new.author.to_string(),
            author_id: new.author_id.to_string(),
            created_at: Utc::now(),
        });
        Ok(Some(post.clone()))
    }

    async fn remove_reply(
        &self,
        post_id: i64,
        target: ReplyRef,
        requester_id: &str,
    ) -> RepoResult<Option<PostRow>> {
        let Some(handle) = self.entry(post_id).await else {
            return Ok(None);
        };
        let mut post = handle.lock().await;
        let position = resolve_reply(&post.replies, target, requester_id)?;
        post.replies.remove(position);
        Ok(Some(post.clone()))
    }
}
