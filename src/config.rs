/// 貸出ポリシー設定
///
/// 貸出期間と延滞罰金レートはエンジンが消費する設定値であり、
/// エンジン内で計算されることはない。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanPolicy {
    /// 貸出期間（日数）
    pub loan_period_days: i64,
    /// 延滞1日あたりの罰金
    pub fine_per_day: f64,
}

impl LoanPolicy {
    pub const DEFAULT_LOAN_PERIOD_DAYS: i64 = 14;
    pub const DEFAULT_FINE_PER_DAY: f64 = 1500.0;

    /// 環境変数から読み込む
    ///
    /// `LOAN_PERIOD_DAYS` / `FINE_PER_DAY` が未設定または不正な場合は
    /// デフォルト値にフォールバックする。
    pub fn from_env() -> Self {
        let loan_period_days = std::env::var("LOAN_PERIOD_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::DEFAULT_LOAN_PERIOD_DAYS);

        let fine_per_day = std::env::var("FINE_PER_DAY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::DEFAULT_FINE_PER_DAY);

        Self {
            loan_period_days,
            fine_per_day,
        }
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: Self::DEFAULT_LOAN_PERIOD_DAYS,
            fine_per_day: Self::DEFAULT_FINE_PER_DAY,
        }
    }
}
