/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - 本人確認そのもの (session / token 発行) は外部の identity provider の責務
 * - ここは「型（契約）」として固定化する
 */

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は identity provider が発行した安定した user id (不透明な文字列)
/// - 所有者チェック (BOLA) は handler / repo で `services::policy` を使って行う
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub user_id: String,
}

impl AuthCtx {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
