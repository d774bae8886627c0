/*
 * Responsibility
 * - 永続化の契約 (DiscussionRepo) と実装 (memory / postgres) の公開
 */
pub mod discussion_repo;
pub mod error;
pub mod memory;
pub mod postgres;

pub use discussion_repo::{DiscussionRepo, NewPost, NewReply, PostRow, ReplyRow};
pub use error::{RepoError, RepoResult};
pub use memory::MemoryDiscussionRepo;
pub use postgres::PgDiscussionRepo;
