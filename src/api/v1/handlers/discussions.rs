/*
 * Responsibility
 * - /discussions 系 handler (ForumAPI の server 側)
 * - Path の {id} は公開 ID → extractor で復号化して内部 ID に変換して受け取る
 * - 所有者チェックはここで必ず行う (client 側のチェックは UI 用で信用しない)
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::discussions::{CreatePostRequest, CreateReplyRequest, UpdatePostRequest},
        extractors::{AuthCtx, AuthCtxExtractor, PublicPostId},
    },
    domain::{Post, Reply, ReplyRef},
    error::AppError,
    repos::{NewPost, NewReply, PostRow},
    services::policy,
    state::AppState,
};

const RESOURCE: &str = "discussion";

fn row_to_response(state: &AppState, row: PostRow) -> Result<Post, AppError> {
    let public_id = state.id_codec.encode(row.post_id)?;

    Ok(Post {
        id: public_id,
        content: row.content,
        author: row.author,
        author_id: row.author_id,
        timestamp: row.created_at,
        votes: row.votes,
        replies: row
            .replies
            .into_iter()
            .map(|r| Reply {
                id: r.reply_id,
                content: r.content,
                author: r.author,
                author_id: r.author_id,
                timestamp: r.created_at,
            })
            .collect(),
    })
}

// The body names its author; it has to be the caller.
fn ensure_caller_is(auth: &AuthCtx, author_id: &str) -> Result<(), AppError> {
    if policy::is_owner(&auth.user_id, author_id) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %auth.user_id,
            claimed_author_id = %author_id,
            "author mismatch"
        );
        Err(AppError::Forbidden)
    }
}

async fn ensure_owns_post(state: &AppState, auth: &AuthCtx, post_id: i64) -> Result<(), AppError> {
    let row = state
        .repo
        .get(post_id)
        .await?
        .ok_or(AppError::not_found(RESOURCE))?;

    if !policy::is_owner(&auth.user_id, &row.author_id) {
        tracing::warn!(user_id = %auth.user_id, post_id, "not the post owner");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub async fn list_discussions(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    let rows = state.repo.list().await?;

    let mut res = Vec::with_capacity(rows.len());
    for row in rows {
        res.push(row_to_response(&state, row)?);
    }

    Ok(Json(res))
}

pub async fn create_discussion(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    req.validate()?;
    ensure_caller_is(&auth, &req.author_id)?;

    let row = state
        .repo
        .create(NewPost {
            content: &req.content,
            author: &req.author,
            author_id: &auth.user_id,
        })
        .await?;

    tracing::info!(post_id = row.post_id, author_id = %row.author_id, "discussion created");
    Ok((StatusCode::CREATED, Json(row_to_response(&state, row)?)))
}

pub async fn update_discussion(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    post_id: PublicPostId,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<Post>, AppError> {
    req.validate()?;
    // author_id never changes, so checking before the update is race-free
    ensure_owns_post(&state, &auth, post_id.id).await?;

    let row = state
        .repo
        .update_content(post_id.id, &req.content)
        .await?
        .ok_or(AppError::not_found(RESOURCE))?;

    Ok(Json(row_to_response(&state, row)?))
}

pub async fn delete_discussion(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    post_id: PublicPostId,
) -> Result<StatusCode, AppError> {
    ensure_owns_post(&state, &auth, post_id.id).await?;

    if state.repo.delete(post_id.id).await? {
        tracing::info!(post_id = post_id.id, "discussion deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(RESOURCE))
    }
}

pub async fn vote_discussion(
    State(state): State<AppState>,
    AuthCtxExtractor(_auth): AuthCtxExtractor,
    post_id: PublicPostId,
) -> Result<Json<Post>, AppError> {
    let row = state
        .repo
        .increment_votes(post_id.id)
        .await?
        .ok_or(AppError::not_found(RESOURCE))?;

    Ok(Json(row_to_response(&state, row)?))
}

pub async fn add_reply(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    post_id: PublicPostId,
    Json(req): Json<CreateReplyRequest>,
) -> Result<Json<Post>, AppError> {
    req.validate()?;
    ensure_caller_is(&auth, &req.author_id)?;

    let row = state
        .repo
        .append_reply(
            post_id.id,
            NewReply {
                content: &req.content,
                author: &req.author,
                author_id: &auth.user_id,
            },
        )
        .await?
        .ok_or(AppError::not_found(RESOURCE))?;

    Ok(Json(row_to_response(&state, row)?))
}

pub async fn delete_reply(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    Path((public_id, reply)): Path<(String, String)>,
) -> Result<Json<Post>, AppError> {
    let post_id = state.id_codec.decode(&public_id)?;
    let target: ReplyRef = reply.parse()?;

    let row = state
        .repo
        .remove_reply(post_id, target, &auth.user_id)
        .await?
        .ok_or(AppError::not_found(RESOURCE))?;

    Ok(Json(row_to_response(&state, row)?))
}
