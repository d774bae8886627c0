/*
 * Responsibility
 * - discussion の entity (Post / Reply / Principal) を server と client で共有する
 * - content の検証ルールと reply の指定方法 (ReplyRef)
 */
mod content;
mod post;

pub use content::{
    ContentError, POST_CONTENT_MAX_CHARS, REPLY_CONTENT_MAX_CHARS, ReplyRef, ReplyRefError,
    validate_post_content, validate_reply_content,
};
pub use post::{Post, Principal, Reply};
