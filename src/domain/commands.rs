use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Isbn, LoanId, MemberId, Role};

/// コマンド：貸出を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterLoan {
    pub member_id: MemberId,
    pub isbn: Isbn,
    pub actor: Role,
    /// 操作日（貸出日になる）。グローバルな現在時刻に依存しない
    pub today: NaiveDate,
}

/// コマンド：返却を記録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkReturn {
    pub loan_id: LoanId,
    pub actor: Role,
    /// 操作日（返却日になる）
    pub today: NaiveDate,
}

/// コマンド：貸出レコードを削除する（Adminのみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteLoan {
    pub loan_id: LoanId,
    pub actor: Role,
}
