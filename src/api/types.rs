use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Loan;

/// 貸出登録リクエスト（POST /loans）
#[derive(Debug, Deserialize)]
pub struct RegisterLoanRequest {
    pub member_id: Uuid,
    pub isbn: String,
}

/// 貸出一覧取得のクエリパラメータ
///
/// フィルタは排他的に適用される（member_id → isbn → status の優先順）。
#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    /// 会員IDでフィルタリング
    pub member_id: Option<Uuid>,
    /// ISBNでフィルタリング
    pub isbn: Option<String>,
    /// ステータスでフィルタリング
    pub status: Option<String>,
}

/// 貸出レスポンス（GET /loans/:id と GET /loans）
#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub loan_id: Uuid,
    pub member_id: Uuid,
    pub isbn: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: String,
    pub fine_amount: f64,
    pub member_name: Option<String>,
    pub book_title: Option<String>,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            loan_id: loan.id.value(),
            member_id: loan.member_id.value(),
            isbn: loan.isbn.as_str().to_string(),
            borrow_date: loan.borrow_date,
            due_date: loan.due_date,
            return_date: loan.return_date,
            status: loan.status.as_str().to_string(),
            fine_amount: loan.fine_amount,
            member_name: loan.member_name,
            book_title: loan.book_title,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
