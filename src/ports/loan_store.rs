use crate::domain::{Isbn, Loan, LoanId, LoanStatus, MemberId};
use async_trait::async_trait;

use super::Result;

/// 貸出ストアポート（ユニットオブワーク内で使用）
///
/// Loanレコードの永続化と取得を担う。一覧系は表示用の book_title を
/// 読み取り側JOINで埋める。member_name は別コンテキストにあるため、
/// アプリケーション層が会員ディレクトリから補完する。
#[async_trait]
pub trait LoanStore: Send {
    /// 貸出を挿入する
    ///
    /// 行が挿入されなかった場合はエラーを返す（黙殺しない）。
    async fn insert_loan(&mut self, loan: &Loan) -> Result<()>;

    /// IDで貸出を取得する
    async fn find_loan(&mut self, id: LoanId) -> Result<Option<Loan>>;

    /// 貸出を更新する
    ///
    /// 行がヒットしたかどうかを返す。既存行への更新で false の場合、
    /// エンジンは永続化失敗として扱う。
    async fn update_loan(&mut self, loan: &Loan) -> Result<bool>;

    /// 貸出を削除する。行がヒットしたかどうかを返す
    async fn delete_loan(&mut self, id: LoanId) -> Result<bool>;

    /// 全貸出を取得する（作成日降順）
    async fn list_loans(&mut self) -> Result<Vec<Loan>>;

    /// 会員の貸出履歴を取得する
    async fn list_loans_by_member(&mut self, member_id: MemberId) -> Result<Vec<Loan>>;

    /// 書籍の貸出履歴を取得する
    async fn list_loans_by_isbn(&mut self, isbn: &Isbn) -> Result<Vec<Loan>>;

    /// ステータスで貸出を取得する
    async fn list_loans_by_status(&mut self, status: LoanStatus) -> Result<Vec<Loan>>;

    /// (会員, 書籍) のアクティブな貸出を取得する
    ///
    /// Borrowed / Overdue のみが対象。重複貸出の検出に使用される。
    async fn find_active_loan(&mut self, member_id: MemberId, isbn: &Isbn)
    -> Result<Option<Loan>>;
}
