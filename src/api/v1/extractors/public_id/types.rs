/**
 * Responsibility
 *  - リソースごとの「意味付きID型」を宣言する
 *
 * 以下に pub で列挙するものは、./mod.rs 経由で全て公開されるため注意
 */
use super::core::PublicId;

// discussions
pub enum PostTag {}
pub type PublicPostId = PublicId<PostTag>;
