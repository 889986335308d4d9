use thiserror::Error;

use crate::application::authorization;

/// 貸出ライフサイクルエンジンのエラー
///
/// 5種類のエラー分類。発生点でそのまま呼び出し元へ伝播し、
/// エンジンが自らのビジネスエラーを握りつぶしたり格下げしたり
/// することはない。
#[derive(Debug, Error)]
pub enum LoanServiceError {
    /// ロールチェックに失敗した
    #[error("{0}")]
    Unauthorized(#[from] authorization::Unauthorized),

    /// 参照されたエンティティが存在しない、または結果セットが空
    #[error("{0}")]
    NotFound(String),

    /// エンティティは存在するがビジネス前提条件に違反している
    /// （非アクティブな会員・書籍、在庫なし、返却済み）
    #[error("{0}")]
    InvalidState(String),

    /// (会員, 書籍) のアクティブな貸出が既に存在する
    #[error("{0}")]
    Conflict(String),

    /// 永続化層の失敗（「0行更新」を含む）
    ///
    /// トランザクションのロールバック後にラップされて再送出される。
    #[error("Persistence failure: {0}")]
    Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LoanServiceError {
    /// ポート層のエラーを永続化失敗としてラップする
    pub fn persistence(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Persistence(err)
    }

    /// 期待された変更が1行もヒットしなかった
    pub fn no_rows_affected(detail: impl Into<String>) -> Self {
        Self::Persistence(detail.into().into())
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LoanServiceError>;
