use crate::domain::MemberId;
use async_trait::async_trait;

use super::Result;

/// 会員レコード（存在確認用の最小ビュー）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub id: MemberId,
    pub name: String,
    pub active: bool,
}

/// 会員ディレクトリポート
///
/// 貸出コンテキストと会員コンテキストの境界を維持する。
/// 貸出コンテキストは会員の存在とアクティブフラグのみを知る。
/// 読み取り専用であり、ユニットオブワークの外で参照される。
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// 会員を取得する
    ///
    /// 貸出登録前の会員バリデーションに使用される。
    async fn find_member(&self, member_id: MemberId) -> Result<Option<MemberRecord>>;
}
