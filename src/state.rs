/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - repo: 正本 (canonical state) の保存先, id_codec: 公開 ID 変換
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::fmt;
use std::sync::Arc;

use crate::repos::DiscussionRepo;
use crate::services::id_codec::IdCodec;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn DiscussionRepo>,
    pub id_codec: IdCodec,
}

impl AppState {
    pub fn new(repo: Arc<dyn DiscussionRepo>, id_codec: IdCodec) -> Self {
        Self { repo, id_codec }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("repo", &self.repo.backend_name())
            .field("id_codec", &self.id_codec)
            .finish()
    }
}
