/*
 * Responsibility
 * - discussions / discussion_replies テーブル向け SQLx 操作
 * - vote は UPDATE ... SET votes = votes + 1 (DB 側で atomic)
 * - reply の追加削除は親 post 行を FOR UPDATE でロックしてから行う
 * - schema: migrations/0001_discussions.sql
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::ReplyRef;
use crate::repos::discussion_repo::{
    DiscussionRepo, NewPost, NewReply, PostRow, ReplyRow, resolve_reply,
};
use crate::repos::error::RepoResult;

const SCHEMA: &str = include_str!("../../migrations/0001_discussions.sql");

#[derive(Debug, FromRow)]
struct DiscussionRecord {
    #[sqlx(rename = "postId")]
    post_id: i64,
    content: String,
    author: String,
    #[sqlx(rename = "authorId")]
    author_id: String,
    #[sqlx(rename = "createdAt")]
    created_at: DateTime<Utc>,
    votes: i64,
}

#[derive(Debug, FromRow)]
struct ReplyRecord {
    #[sqlx(rename = "replyId")]
    reply_id: Uuid,
    #[sqlx(rename = "postId")]
    post_id: i64,
    content: String,
    author: String,
    #[sqlx(rename = "authorId")]
    author_id: String,
    #[sqlx(rename = "createdAt")]
    created_at: DateTime<Utc>,
}

impl From<ReplyRecord> for ReplyRow {
    fn from(r: ReplyRecord) -> Self {
        Self {
            reply_id: r.reply_id,
            content: r.content,
            author: r.author,
            author_id: r.author_id,
            created_at: r.created_at,
        }
    }
}

fn assemble(record: DiscussionRecord, replies: Vec<ReplyRow>) -> PostRow {
    PostRow {
        post_id: record.post_id,
        content: record.content,
        author: record.author,
        author_id: record.author_id,
        created_at: record.created_at,
        // CHECK (votes >= 0) on the column
        votes: u64::try_from(record.votes).unwrap_or_default(),
        replies,
    }
}

async fn replies_for<'e, E>(executor: E, post_ids: &[i64]) -> Result<Vec<ReplyRecord>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, ReplyRecord>(
        r#"
        SELECT "replyId", "postId", content, author, "authorId", "createdAt"
        FROM discussion_replies
        WHERE "postId" = ANY($1)
        ORDER BY "postId", seq
        "#,
    )
    .bind(post_ids)
    .fetch_all(executor)
    .await
}

#[derive(Clone, Debug)]
pub struct PgDiscussionRepo {
    pool: PgPool,
}

impl PgDiscussionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema. Every statement is `IF NOT EXISTS`.
    pub async fn ensure_schema(&self) -> RepoResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    async fn with_replies(&self, record: DiscussionRecord) -> RepoResult<PostRow> {
        let replies = replies_for(&self.pool, &[record.post_id]).await?;
        Ok(assemble(
            record,
            replies.into_iter().map(ReplyRow::from).collect(),
        ))
    }
}

#[async_trait]
impl DiscussionRepo for PgDiscussionRepo {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self) -> RepoResult<Vec<PostRow>> {
        let records = sqlx::query_as::<_, DiscussionRecord>(
            r#"
            SELECT "postId", content, author, "authorId", "createdAt", votes
            FROM discussions
            ORDER BY "postId"
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = records.iter().map(|r| r.post_id).collect();
        let mut replies = replies_for(&self.pool, &ids).await?.into_iter().peekable();

        // both result sets are ordered by "postId"
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let mut own = Vec::new();
            while let Some(reply) = replies.next_if(|r| r.post_id == record.post_id) {
                own.push(ReplyRow::from(reply));
            }
            rows.push(assemble(record, own));
        }

        Ok(rows)
    }

    async fn get(&self, post_id: i64) -> RepoResult<Option<PostRow>> {
        let record = sqlx::query_as::<_, DiscussionRecord>(
            r#"
            SELECT "postId", content, author, "authorId", "createdAt", votes
            FROM discussions
            WHERE "postId" = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => Ok(Some(self.with_replies(record).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, new: NewPost<'_>) -> RepoResult<PostRow> {
        let record = sqlx::query_as::<_, DiscussionRecord>(
            r#"
            INSERT INTO discussions (content, author, "authorId")
            VALUES ($1, $2, $3)
            RETURNING "postId", content, author, "authorId", "createdAt", votes
            "#,
        )
        .bind(new.content)
        .bind(new.author)
        .bind(new.author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(assemble(record, Vec::new()))
    }

    async fn update_content(&self, post_id: i64, content: &str) -> RepoResult<Option<PostRow>> {
        let record = sqlx::query_as::<_, DiscussionRecord>(
            r#"
            UPDATE discussions
            SET content = $2
            WHERE "postId" = $1
            RETURNING "postId", content, author, "authorId", "createdAt", votes
            "#,
        )
        .bind(post_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => Ok(Some(self.with_replies(record).await?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, post_id: i64) -> RepoResult<bool> {
        // replies go with it (ON DELETE CASCADE)
        let result = sqlx::query(
            r#"
            DELETE FROM discussions
            WHERE "postId" = $1
            "#,
        )
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_votes(&self, post_id: i64) -> RepoResult<Option<PostRow>> {
        let record = sqlx::query_as::<_, DiscussionRecord>(
            r#"
            UPDATE discussions
            SET votes = votes + 1
            WHERE "postId" = $1
            RETURNING "postId", content, author, "authorId", "createdAt", votes
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => Ok(Some(self.with_replies(record).await?)),
            None => Ok(None),
        }
    }

    async fn append_reply(&self, post_id: i64, new: NewReply<'_>) -> RepoResult<Option<PostRow>> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, DiscussionRecord>(
            r#"
            SELECT "postId", content, author, "authorId", "createdAt", votes
            FROM discussions
            WHERE "postId" = $1
            FOR UPDATE
            "#,
        )
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO discussion_replies ("replyId", "postId", content, author, "authorId")
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(new.content)
        .bind(new.author)
        .bind(new.author_id)
        .execute(&mut *tx)
        .await?;

        let replies = replies_for(&mut *tx, &[post_id]).await?;
        tx.commit().await?;

        Ok(Some(assemble(
            record,
            replies.into_iter().map(ReplyRow::from).collect(),
        )))
    }

    async fn remove_reply(
        &self,
        post_id: i64,
        target: ReplyRef,
        requester_id: &str,
    ) -> RepoResult<Option<PostRow>> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, DiscussionRecord>(
            r#"
            SELECT "postId", content, author, "authorId", "createdAt", votes
            FROM discussions
            WHERE "postId" = $1
            FOR UPDATE
            "#,
        )
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let mut replies: Vec<ReplyRow> = replies_for(&mut *tx, &[post_id])
            .await?
            .into_iter()
            .map(ReplyRow::from)
            .collect();
        let position = resolve_reply(&replies, target, requester_id)?;
        let removed = replies.remove(position);

        sqlx::query(
            r#"
            DELETE FROM discussion_replies
            WHERE "replyId" = $1
            "#,
        )
        .bind(removed.reply_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(assemble(record, replies)))
    }
}

// Runs against a live database; skipped unless DATABASE_URL is set.
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sqlx::postgres::PgPoolOptions;
    use tokio::sync::OnceCell;

    use crate::repos::error::RepoError;

    static SCHEMA_APPLIED: OnceCell<()> = OnceCell::const_new();

    async fn repo() -> Option<Arc<PgDiscussionRepo>> {
        let Some(url) = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
        else {
            eprintln!("DATABASE_URL not set; skipping postgres test");
            return None;
        };

        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(&url)
            .await
            .unwrap();
        let repo = PgDiscussionRepo::new(pool);
        SCHEMA_APPLIED
            .get_or_try_init(|| repo.ensure_schema())
            .await
            .unwrap();
        Some(Arc::new(repo))
    }

    fn new_post<'a>(content: &'a str, author_id: &'a str) -> NewPost<'a> {
        NewPost {
            content,
            author: "Ada",
            author_id,
        }
    }

    fn new_reply<'a>(content: &'a str, author_id: &'a str) -> NewReply<'a> {
        NewReply {
            content,
            author: "Bob",
            author_id,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_votes_are_not_lost() {
        let Some(repo) = repo().await else { return };
        let post = repo.create(new_post("popular", "u1")).await.unwrap();

        let voters: Vec<_> = (0..64)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.increment_votes(post.post_id).await })
            })
            .collect();
        for voter in voters {
            voter.await.unwrap().unwrap();
        }

        assert_eq!(repo.get(post.post_id).await.unwrap().unwrap().votes, 64);
        repo.delete(post.post_id).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_replies_are_all_appended() {
        let Some(repo) = repo().await else { return };
        let post = repo.create(new_post("thread", "u1")).await.unwrap();

        let writers: Vec<_> = (0..32)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    let author = format!("u{i}");
                    repo.append_reply(post.post_id, new_reply("me too", &author))
                        .await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let replies = repo.get(post.post_id).await.unwrap().unwrap().replies;
        assert_eq!(replies.len(), 32);
        repo.delete(post.post_id).await.unwrap();
    }

    #[tokio::test]
    async fn remove_reply_checks_owner_and_range() {
        let Some(repo) = repo().await else { return };
        let post = repo.create(new_post("Hello", "u1")).await.unwrap();
        for content in ["a", "b", "c"] {
            repo.append_reply(post.post_id, new_reply(content, "u2"))
                .await
                .unwrap();
        }

        let err = repo
            .remove_reply(post.post_id, ReplyRef::Index(0), "u3")
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotOwner));

        for index in [3, -1] {
            let err = repo
                .remove_reply(post.post_id, ReplyRef::Index(index), "u2")
                .await
                .unwrap_err();
            assert!(matches!(err, RepoError::ReplyOutOfRange { len: 3, .. }));
        }

        let row = repo
            .remove_reply(post.post_id, ReplyRef::Index(1), "u2")
            .await
            .unwrap()
            .unwrap();
        let contents: Vec<_> = row.replies.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "c"]);

        let first = row.replies[0].reply_id;
        let row = repo
            .remove_reply(post.post_id, ReplyRef::Id(first), "u2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.replies.len(), 1);

        assert!(repo.delete(post.post_id).await.unwrap());
        assert!(
            repo.remove_reply(post.post_id, ReplyRef::Index(0), "u2")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn edit_keeps_identity_fields() {
        let Some(repo) = repo().await else { return };
        let before = repo.create(new_post("draft", "u1")).await.unwrap();

        let after = repo
            .update_content(before.post_id, "final")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(after.content, "final");
        assert_eq!(after.author_id, before.author_id);
        assert_eq!(after.created_at, before.created_at);
        repo.delete(before.post_id).await.unwrap();
        assert!(repo.update_content(before.post_id, "x").await.unwrap().is_none());
    }
}
