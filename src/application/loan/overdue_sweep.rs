use chrono::NaiveDate;

use crate::domain::{self, Loan};
use crate::ports::{self, Datastore};

/// 延滞ステータスの更新スイープ
///
/// 読み取りパスが古いステータスを晒さないよう、クエリの直前に
/// 同期的に実行される（バックグラウンドジョブではない）。
///
/// ビジネスルール：
/// - 期限を過ぎた Borrowed の貸出のみ Overdue に遷移する
/// - Returned の貸出には決して触れない
/// - 冪等 - 同じデータに2回実行しても追加の変更は発生しない
///
/// 永続化は独立したユニットオブワークで行い、失敗した場合は
/// ロールバックしてログに記録するだけで、読み取り自体は失敗
/// させない。呼び出し元に返るステータスはメモリ上で更新済み。
pub(super) async fn refresh_overdue_statuses(
    datastore: &dyn Datastore,
    loans: &mut [Loan],
    today: NaiveDate,
) {
    let mut flipped = Vec::new();
    for loan in loans.iter_mut() {
        if let Some(updated) = domain::loan::flag_overdue(loan, today) {
            *loan = updated;
            flipped.push(loan.clone());
        }
    }

    if flipped.is_empty() {
        return;
    }

    if let Err(err) = persist_overdue(datastore, &flipped).await {
        tracing::warn!(
            error = %err,
            count = flipped.len(),
            "Failed to persist overdue statuses; read continues with refreshed in-memory statuses",
        );
    }
}

/// 遷移済みの貸出を1つのユニットオブワークで永続化する
async fn persist_overdue(datastore: &dyn Datastore, loans: &[Loan]) -> ports::Result<()> {
    let mut uow = datastore.begin().await?;

    let mut failure: Option<Box<dyn std::error::Error + Send + Sync>> = None;
    for loan in loans {
        match uow.update_loan(loan).await {
            Ok(true) => {}
            Ok(false) => {
                failure = Some(format!("Updating loan {} affected no rows", loan.id).into());
                break;
            }
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    match failure {
        None => uow.commit().await,
        Some(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::warn!(error = %rollback_err, "Rollback failed after aborted overdue sweep");
            }
            Err(err)
        }
    }
}
