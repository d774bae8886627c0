/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("reply index {index} is out of range (len {len})")]
    ReplyOutOfRange { index: i64, len: usize },
    #[error("reply not found")]
    ReplyNotFound,
    #[error("requester does not own the reply")]
    NotOwner,
}

pub type RepoResult<T> = Result<T, RepoError>;
