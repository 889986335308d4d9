use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Isbn, LoanId, MemberId};

/// 貸出ステータス
///
/// 許可される遷移は Borrowed→Overdue、Borrowed→Returned、
/// Overdue→Returned のみ。Returned は終端状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// 貸出中
    Borrowed,
    /// 延滞中
    Overdue,
    /// 返却済み（終端）
    Returned,
}

impl LoanStatus {
    /// 永続化用の文字列表現を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "borrowed",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
        }
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(LoanStatus::Borrowed),
            "overdue" => Ok(LoanStatus::Overdue),
            "returned" => Ok(LoanStatus::Returned),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

/// Loan集約 - 1冊の書籍の1回の貸出
///
/// `member_name` / `book_title` は一覧表示用の読み取り側JOIN結果であり、
/// 不変条件の対象外。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub member_id: MemberId,
    pub isbn: Isbn,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
    /// 延滞罰金。返却確定時に一度だけ計算され、以後再計算されない
    pub fine_amount: f64,
    pub created_at: NaiveDate,

    // 表示専用の非正規化フィールド
    pub member_name: Option<String>,
    pub book_title: Option<String>,
}

impl Loan {
    /// 未返却（Borrowed または Overdue）か
    pub fn is_active(&self) -> bool {
        matches!(self.status, LoanStatus::Borrowed | LoanStatus::Overdue)
    }
}

/// 返却のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnLoanError {
    /// 既に返却済み
    AlreadyReturned,
}

/// 純粋関数：新しい貸出を登録する
///
/// ビジネスルール：
/// - 返却期限は貸出日 + 設定された貸出期間（日数）
/// - 状態は Borrowed
/// - 罰金は 0
///
/// 副作用なし。IDは作成時に生成される。
pub fn register(
    member_id: MemberId,
    isbn: Isbn,
    borrowed_on: NaiveDate,
    loan_period_days: i64,
) -> Loan {
    Loan {
        id: LoanId::new(),
        member_id,
        isbn,
        borrow_date: borrowed_on,
        due_date: borrowed_on + Duration::days(loan_period_days),
        return_date: None,
        status: LoanStatus::Borrowed,
        fine_amount: 0.0,
        created_at: borrowed_on,
        member_name: None,
        book_title: None,
    }
}

/// 純粋関数：返却を確定する
///
/// ビジネスルール：
/// - 返却済みの貸出は再返却不可（冪等な拒否）
/// - 返却日が期限より後なら、遅延した暦日数 × 日割り罰金レート
/// - 上限・猶予期間なし
/// - 罰金は確定後に再計算されない
///
/// 副作用なし。新しいLoanを返す。
pub fn settle_return(
    loan: &Loan,
    returned_on: NaiveDate,
    fine_per_day: f64,
) -> Result<Loan, ReturnLoanError> {
    if loan.status == LoanStatus::Returned {
        return Err(ReturnLoanError::AlreadyReturned);
    }

    let fine_amount = if returned_on > loan.due_date {
        let days_overdue = (returned_on - loan.due_date).num_days();
        days_overdue as f64 * fine_per_day
    } else {
        0.0
    };

    Ok(Loan {
        return_date: Some(returned_on),
        status: LoanStatus::Returned,
        fine_amount,
        ..loan.clone()
    })
}

/// 純粋関数：延滞判定して状態を更新する
///
/// Borrowed かつ期限を過ぎている場合のみ Overdue に遷移した新しい
/// Loan を返す。Overdue / Returned には何もしない（冪等）。
pub fn flag_overdue(loan: &Loan, today: NaiveDate) -> Option<Loan> {
    if loan.status == LoanStatus::Borrowed && today > loan.due_date {
        Some(Loan {
            status: LoanStatus::Overdue,
            ..loan.clone()
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_loan(borrowed_on: NaiveDate) -> Loan {
        register(
            MemberId::new(),
            Isbn::new("978-3-16-148410-0").unwrap(),
            borrowed_on,
            14,
        )
    }

    #[test]
    fn test_register_sets_due_date_from_loan_period() {
        let borrowed_on = date(2025, 3, 1);
        let loan = sample_loan(borrowed_on);

        assert_eq!(loan.borrow_date, borrowed_on);
        assert_eq!(loan.due_date, date(2025, 3, 15));
        assert_eq!(loan.status, LoanStatus::Borrowed);
        assert_eq!(loan.fine_amount, 0.0);
        assert_eq!(loan.return_date, None);
        assert!(loan.is_active());
    }

    #[test]
    fn test_settle_return_on_time_has_no_fine() {
        let loan = sample_loan(date(2025, 3, 1));

        let returned = settle_return(&loan, date(2025, 3, 10), 1500.0).unwrap();

        assert_eq!(returned.status, LoanStatus::Returned);
        assert_eq!(returned.return_date, Some(date(2025, 3, 10)));
        assert_eq!(returned.fine_amount, 0.0);
        assert!(!returned.is_active());
    }

    #[test]
    fn test_settle_return_on_due_date_has_no_fine() {
        let loan = sample_loan(date(2025, 3, 1));

        let returned = settle_return(&loan, loan.due_date, 1500.0).unwrap();
        assert_eq!(returned.fine_amount, 0.0);
    }

    #[test]
    fn test_settle_return_five_days_late_charges_per_day_rate() {
        // 期限 = 3/15、返却 = 3/20（5日遅延）、レート = 1500 → 7500.00
        let loan = sample_loan(date(2025, 3, 1));

        let returned = settle_return(&loan, date(2025, 3, 20), 1500.0).unwrap();

        assert_eq!(returned.fine_amount, 7500.0);
        assert_eq!(returned.status, LoanStatus::Returned);
    }

    #[test]
    fn test_settle_return_from_overdue_still_charges_fine() {
        let mut loan = sample_loan(date(2025, 3, 1));
        loan.status = LoanStatus::Overdue;

        let returned = settle_return(&loan, date(2025, 3, 16), 1500.0).unwrap();

        assert_eq!(returned.fine_amount, 1500.0);
        assert_eq!(returned.status, LoanStatus::Returned);
    }

    #[test]
    fn test_settle_return_fails_when_already_returned() {
        let loan = sample_loan(date(2025, 3, 1));
        let returned = settle_return(&loan, date(2025, 3, 20), 1500.0).unwrap();

        let result = settle_return(&returned, date(2025, 3, 25), 1500.0);
        assert_eq!(result, Err(ReturnLoanError::AlreadyReturned));
    }

    #[test]
    fn test_flag_overdue_past_due_borrowed_loan() {
        let loan = sample_loan(date(2025, 3, 1));

        let flagged = flag_overdue(&loan, date(2025, 3, 16)).unwrap();
        assert_eq!(flagged.status, LoanStatus::Overdue);
        assert_eq!(flagged.fine_amount, 0.0);
    }

    #[test]
    fn test_flag_overdue_not_past_due() {
        let loan = sample_loan(date(2025, 3, 1));

        // 期限当日はまだ延滞ではない
        assert!(flag_overdue(&loan, loan.due_date).is_none());
        assert!(flag_overdue(&loan, date(2025, 3, 10)).is_none());
    }

    #[test]
    fn test_flag_overdue_is_idempotent() {
        let loan = sample_loan(date(2025, 3, 1));
        let flagged = flag_overdue(&loan, date(2025, 3, 16)).unwrap();

        assert!(flag_overdue(&flagged, date(2025, 3, 17)).is_none());
    }

    #[test]
    fn test_flag_overdue_never_touches_returned_loan() {
        let loan = sample_loan(date(2025, 3, 1));
        let returned = settle_return(&loan, date(2025, 3, 20), 1500.0).unwrap();

        assert!(flag_overdue(&returned, date(2025, 4, 1)).is_none());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            LoanStatus::Borrowed,
            LoanStatus::Overdue,
            LoanStatus::Returned,
        ] {
            assert_eq!(status.as_str().parse::<LoanStatus>().unwrap(), status);
        }
        assert!("lost".parse::<LoanStatus>().is_err());
    }
}
