use thiserror::Error;

use crate::domain::Role;

/// 貸出管理の操作種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanOperation {
    /// 貸出の登録
    Register,
    /// 返却の記録
    MarkReturn,
    /// 貸出レコードの削除
    Delete,
    /// 貸出の閲覧
    View,
}

impl std::fmt::Display for LoanOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoanOperation::Register => "register loans",
            LoanOperation::MarkReturn => "mark returns",
            LoanOperation::Delete => "delete loans",
            LoanOperation::View => "view loans",
        };
        f.write_str(name)
    }
}

/// 認可エラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Role {role} is not permitted to {operation}")]
pub struct Unauthorized {
    pub operation: LoanOperation,
    pub role: Role,
}

/// (操作, ロール) の許可テーブル
///
/// 許可判定は純粋なテーブルに集約する。状態を持たず、副作用もない。
const fn is_permitted(operation: LoanOperation, role: Role) -> bool {
    match (operation, role) {
        // 削除はAdminのみ
        (LoanOperation::Delete, Role::Assistant) => false,
        _ => true,
    }
}

/// 操作前の認可チェック
///
/// 拒否された場合は `Unauthorized` を返す。エンジンはいかなる
/// 変更よりも先にこれを呼ぶ。
pub fn authorize(operation: LoanOperation, role: Role) -> Result<(), Unauthorized> {
    if is_permitted(operation, role) {
        Ok(())
    } else {
        Err(Unauthorized { operation, role })
    }
}

/// 書籍フィールド更新の範囲
///
/// カタログ編集自体は外部コラボレータだが、ロールごとの更新可能
/// フィールドの規則はポリシーとしてここで公開する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookUpdateScope {
    /// 全フィールド
    AllFields,
    /// 在庫系フィールドのみ（quantity / available / price）
    StockFieldsOnly,
}

/// ロールごとの書籍フィールド更新範囲を取得する
pub fn book_update_scope(role: Role) -> BookUpdateScope {
    match role {
        Role::Admin => BookUpdateScope::AllFields,
        Role::Assistant => BookUpdateScope::StockFieldsOnly,
    }
}
