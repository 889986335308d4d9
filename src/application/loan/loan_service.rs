use chrono::NaiveDate;
use futures::future::BoxFuture;
use std::sync::Arc;

use crate::application::authorization::{LoanOperation, authorize};
use crate::config::LoanPolicy;
use crate::domain::{self, Isbn, Loan, LoanId, LoanStatus, MemberId, Role, commands::*};
use crate::ports::{Datastore, MemberDirectory, UnitOfWork};

use super::errors::{LoanServiceError, Result};
use super::overdue_sweep::refresh_overdue_statuses;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub datastore: Arc<dyn Datastore>,
    pub member_directory: Arc<dyn MemberDirectory>,
    pub policy: LoanPolicy,
}

/// スコープ付きユニットオブワークで操作を実行するヘルパー関数
///
/// begin → 変更の実行 → commit の一本道にまとめ、あらゆるエラー
/// 経路でのロールバックを保証する。
///
/// # エラー
/// - begin / commit の失敗は `Persistence`
/// - 操作内のエラーはロールバック後にそのまま再送出される
async fn run_in_unit_of_work<T, F>(datastore: &dyn Datastore, op: F) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut (dyn UnitOfWork + 'static)) -> BoxFuture<'a, Result<T>> + Send,
    T: Send,
{
    let mut uow = datastore
        .begin()
        .await
        .map_err(LoanServiceError::persistence)?;

    match op(&mut *uow).await {
        Ok(value) => {
            uow.commit().await.map_err(LoanServiceError::persistence)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::warn!(error = %rollback_err, "Rollback failed after aborted unit of work");
            }
            Err(err)
        }
    }
}

/// 表示用の会員名を会員ディレクトリから補完する
///
/// member_name は表示専用のフィールドであり、不変条件の対象外。
/// ディレクトリの失敗で読み取りを失敗させず、解決できない貸出は
/// None のまま返す。
async fn attach_member_names(directory: &dyn MemberDirectory, loans: &mut [Loan]) {
    for loan in loans.iter_mut() {
        if loan.member_name.is_some() {
            continue;
        }
        match directory.find_member(loan.member_id).await {
            Ok(Some(member)) => loan.member_name = Some(member.name),
            Ok(None) => {}
            Err(err) => {
                tracing::debug!(
                    member_id = %loan.member_id,
                    error = %err,
                    "Could not resolve member name for display",
                );
            }
        }
    }
}

/// 貸出を登録する
///
/// Admin / Assistant とも登録可能。
///
/// 前提条件（順序固定、最初の違反で失敗）：
/// 1. 会員が存在すること（NotFound）
/// 2. 会員がアクティブであること（InvalidState）
/// 3. 書籍が存在すること（NotFound）
/// 4. 書籍がアクティブであること（InvalidState）
/// 5. 貸出可能在庫があること（InvalidState）
/// 6. 同一 (会員, 書籍) のアクティブな貸出がないこと（Conflict）
///
/// 貸出の挿入と在庫の減算は1つのユニットオブワークで確定する。
/// ガード付き減算が1行もヒットしない場合（同時実行で在庫が尽きた
/// 場合）は InvalidState で全体をロールバックする。
pub async fn register_loan(deps: &ServiceDependencies, cmd: RegisterLoan) -> Result<Loan> {
    authorize(LoanOperation::Register, cmd.actor)?;

    let member = deps
        .member_directory
        .find_member(cmd.member_id)
        .await
        .map_err(LoanServiceError::persistence)?
        .ok_or_else(|| {
            LoanServiceError::NotFound(format!("Member not found with ID: {}", cmd.member_id))
        })?;

    if !member.active {
        return Err(LoanServiceError::InvalidState(
            "Member is not active".to_string(),
        ));
    }

    let actor = cmd.actor;
    let loan_period_days = deps.policy.loan_period_days;

    let mut loan = run_in_unit_of_work(deps.datastore.as_ref(), move |uow| {
        Box::pin(async move {
            let book = uow
                .find_book(&cmd.isbn)
                .await
                .map_err(LoanServiceError::persistence)?
                .ok_or_else(|| {
                    LoanServiceError::NotFound(format!("Book not found with ISBN: {}", cmd.isbn))
                })?;

            if !book.active {
                return Err(LoanServiceError::InvalidState(
                    "Book is not active".to_string(),
                ));
            }
            if !book.has_loanable_copy() {
                return Err(LoanServiceError::InvalidState(
                    "Book is not available for loan".to_string(),
                ));
            }

            let existing = uow
                .find_active_loan(cmd.member_id, &cmd.isbn)
                .await
                .map_err(LoanServiceError::persistence)?;
            if existing.is_some() {
                return Err(LoanServiceError::Conflict(
                    "Member already has an active loan for this book".to_string(),
                ));
            }

            let mut loan = domain::loan::register(
                cmd.member_id,
                cmd.isbn.clone(),
                cmd.today,
                loan_period_days,
            );
            loan.book_title = Some(book.title.clone());

            uow.insert_loan(&loan)
                .await
                .map_err(LoanServiceError::persistence)?;

            // 事前チェック後に在庫が尽きた場合（同時登録の負け側）は
            // ここで検出され、貸出の挿入ごとロールバックされる。
            let reserved = uow
                .reserve_copy(&loan.isbn)
                .await
                .map_err(LoanServiceError::persistence)?;
            if !reserved {
                return Err(LoanServiceError::InvalidState(
                    "Book is not available for loan".to_string(),
                ));
            }

            Ok(loan)
        })
    })
    .await?;

    loan.member_name = Some(member.name);

    tracing::info!(
        loan_id = %loan.id,
        member_id = %loan.member_id,
        isbn = %loan.isbn,
        actor = %actor,
        "Loan registered",
    );

    Ok(loan)
}

/// 返却を記録する
///
/// Admin / Assistant とも返却可能。
///
/// 前提条件：貸出が存在すること（NotFound）、返却済みでないこと
/// （InvalidState - 冪等な拒否であり、黙って受理しない）、書籍行が
/// 存在すること（NotFound）。
///
/// 返却日が期限より後なら罰金 = 遅延日数 × 日割りレート。
/// 貸出の更新と在庫の加算は1つのユニットオブワークで確定する。
pub async fn mark_return(deps: &ServiceDependencies, cmd: MarkReturn) -> Result<Loan> {
    authorize(LoanOperation::MarkReturn, cmd.actor)?;

    let actor = cmd.actor;
    let fine_per_day = deps.policy.fine_per_day;

    let mut loan = run_in_unit_of_work(deps.datastore.as_ref(), move |uow| {
        Box::pin(async move {
            let loan = uow
                .find_loan(cmd.loan_id)
                .await
                .map_err(LoanServiceError::persistence)?
                .ok_or_else(|| {
                    LoanServiceError::NotFound(format!("Loan not found with ID: {}", cmd.loan_id))
                })?;

            if loan.status == LoanStatus::Returned {
                return Err(LoanServiceError::InvalidState(
                    "Loan is already marked as returned".to_string(),
                ));
            }

            uow.find_book(&loan.isbn)
                .await
                .map_err(LoanServiceError::persistence)?
                .ok_or_else(|| {
                    LoanServiceError::NotFound(format!("Book not found with ISBN: {}", loan.isbn))
                })?;

            let settled =
                domain::loan::settle_return(&loan, cmd.today, fine_per_day).map_err(|_| {
                    LoanServiceError::InvalidState("Loan is already marked as returned".to_string())
                })?;

            let updated = uow
                .update_loan(&settled)
                .await
                .map_err(LoanServiceError::persistence)?;
            if !updated {
                return Err(LoanServiceError::no_rows_affected(format!(
                    "Updating loan {} affected no rows",
                    settled.id
                )));
            }

            let released = uow
                .release_copy(&settled.isbn)
                .await
                .map_err(LoanServiceError::persistence)?;
            if !released {
                return Err(LoanServiceError::no_rows_affected(format!(
                    "Releasing copy of {} affected no rows",
                    settled.isbn
                )));
            }

            Ok(settled)
        })
    })
    .await?;

    attach_member_names(
        deps.member_directory.as_ref(),
        std::slice::from_mut(&mut loan),
    )
    .await;

    tracing::info!(
        loan_id = %loan.id,
        fine_amount = loan.fine_amount,
        actor = %actor,
        "Loan marked as returned",
    );

    Ok(loan)
}

/// 貸出レコードを削除する（Adminのみ）
///
/// 未返却の貸出を削除する場合は、先に在庫を戻してから行を消す。
/// これにより、アクティブな貸出の削除で在庫が恒久的に失われる
/// ことはない。書籍行が既に存在しない場合は在庫の戻しをスキップ
/// する。
pub async fn delete_loan(deps: &ServiceDependencies, cmd: DeleteLoan) -> Result<bool> {
    authorize(LoanOperation::Delete, cmd.actor)?;

    let deleted = run_in_unit_of_work(deps.datastore.as_ref(), move |uow| {
        Box::pin(async move {
            let loan = uow
                .find_loan(cmd.loan_id)
                .await
                .map_err(LoanServiceError::persistence)?
                .ok_or_else(|| {
                    LoanServiceError::NotFound(format!("Loan not found with ID: {}", cmd.loan_id))
                })?;

            if loan.is_active() {
                let book = uow
                    .find_book(&loan.isbn)
                    .await
                    .map_err(LoanServiceError::persistence)?;
                if book.is_some() {
                    let released = uow
                        .release_copy(&loan.isbn)
                        .await
                        .map_err(LoanServiceError::persistence)?;
                    if !released {
                        return Err(LoanServiceError::no_rows_affected(format!(
                            "Releasing copy of {} affected no rows",
                            loan.isbn
                        )));
                    }
                }
            }

            let deleted = uow
                .delete_loan(cmd.loan_id)
                .await
                .map_err(LoanServiceError::persistence)?;
            if !deleted {
                return Err(LoanServiceError::no_rows_affected(format!(
                    "Deleting loan {} affected no rows",
                    cmd.loan_id
                )));
            }

            Ok(true)
        })
    })
    .await?;

    tracing::info!(loan_id = %cmd.loan_id, actor = %cmd.actor, "Loan deleted");

    Ok(deleted)
}

/// 全貸出を取得する
///
/// 貸出が1件もない場合は NotFound を返す（空リストの成功ではない。
/// 既存の呼び出し元が依存している挙動のため、そのまま保持する）。
/// 返却前に延滞ステータスの更新スイープを実行する。
pub async fn get_all_loans(
    deps: &ServiceDependencies,
    actor: Role,
    today: NaiveDate,
) -> Result<Vec<Loan>> {
    authorize(LoanOperation::View, actor)?;

    let mut loans = run_in_unit_of_work(deps.datastore.as_ref(), |uow| {
        Box::pin(async move { uow.list_loans().await.map_err(LoanServiceError::persistence) })
    })
    .await?;

    if loans.is_empty() {
        return Err(LoanServiceError::NotFound("No loans found".to_string()));
    }

    refresh_overdue_statuses(deps.datastore.as_ref(), &mut loans, today).await;
    attach_member_names(deps.member_directory.as_ref(), &mut loans).await;

    Ok(loans)
}

/// IDで貸出を取得する
///
/// 返却前に延滞判定を行い、必要なら永続化する。
pub async fn find_loan_by_id(
    deps: &ServiceDependencies,
    loan_id: LoanId,
    actor: Role,
    today: NaiveDate,
) -> Result<Loan> {
    authorize(LoanOperation::View, actor)?;

    let mut loan = run_in_unit_of_work(deps.datastore.as_ref(), move |uow| {
        Box::pin(async move {
            uow.find_loan(loan_id)
                .await
                .map_err(LoanServiceError::persistence)?
                .ok_or_else(|| {
                    LoanServiceError::NotFound(format!("Loan not found with ID: {}", loan_id))
                })
        })
    })
    .await?;

    refresh_overdue_statuses(
        deps.datastore.as_ref(),
        std::slice::from_mut(&mut loan),
        today,
    )
    .await;
    attach_member_names(
        deps.member_directory.as_ref(),
        std::slice::from_mut(&mut loan),
    )
    .await;

    Ok(loan)
}

/// 会員の貸出履歴を取得する
///
/// 結果が空の場合は NotFound を返す。
pub async fn find_loans_by_member(
    deps: &ServiceDependencies,
    member_id: MemberId,
    actor: Role,
    today: NaiveDate,
) -> Result<Vec<Loan>> {
    authorize(LoanOperation::View, actor)?;

    let mut loans = run_in_unit_of_work(deps.datastore.as_ref(), move |uow| {
        Box::pin(async move {
            uow.list_loans_by_member(member_id)
                .await
                .map_err(LoanServiceError::persistence)
        })
    })
    .await?;

    if loans.is_empty() {
        return Err(LoanServiceError::NotFound(format!(
            "No loans found for member ID: {}",
            member_id
        )));
    }

    refresh_overdue_statuses(deps.datastore.as_ref(), &mut loans, today).await;
    attach_member_names(deps.member_directory.as_ref(), &mut loans).await;

    tracing::debug!(member_id = %member_id, count = loans.len(), "Found loans for member");

    Ok(loans)
}

/// 書籍の貸出履歴を取得する
///
/// 結果が空の場合は NotFound を返す。
pub async fn find_loans_by_isbn(
    deps: &ServiceDependencies,
    isbn: Isbn,
    actor: Role,
    today: NaiveDate,
) -> Result<Vec<Loan>> {
    authorize(LoanOperation::View, actor)?;

    let lookup = isbn.clone();
    let mut loans = run_in_unit_of_work(deps.datastore.as_ref(), move |uow| {
        Box::pin(async move {
            uow.list_loans_by_isbn(&lookup)
                .await
                .map_err(LoanServiceError::persistence)
        })
    })
    .await?;

    if loans.is_empty() {
        return Err(LoanServiceError::NotFound(format!(
            "No loans found for ISBN: {}",
            isbn
        )));
    }

    refresh_overdue_statuses(deps.datastore.as_ref(), &mut loans, today).await;
    attach_member_names(deps.member_directory.as_ref(), &mut loans).await;

    Ok(loans)
}

/// ステータスで貸出を取得する
///
/// 先に全貸出テーブルを対象に延滞スイープを実行してから、
/// ステータスで絞り込む。overdue 指定時に直前に延滞へ転じた
/// 貸出も結果に含めるため。結果が空の場合は NotFound を返す。
pub async fn find_loans_by_status(
    deps: &ServiceDependencies,
    status: LoanStatus,
    actor: Role,
    today: NaiveDate,
) -> Result<Vec<Loan>> {
    authorize(LoanOperation::View, actor)?;

    let mut all_loans = run_in_unit_of_work(deps.datastore.as_ref(), |uow| {
        Box::pin(async move { uow.list_loans().await.map_err(LoanServiceError::persistence) })
    })
    .await?;

    refresh_overdue_statuses(deps.datastore.as_ref(), &mut all_loans, today).await;

    let mut loans = run_in_unit_of_work(deps.datastore.as_ref(), move |uow| {
        Box::pin(async move {
            uow.list_loans_by_status(status)
                .await
                .map_err(LoanServiceError::persistence)
        })
    })
    .await?;

    if loans.is_empty() {
        return Err(LoanServiceError::NotFound(format!(
            "No loans found with status: {}",
            status.as_str()
        )));
    }

    attach_member_names(deps.member_directory.as_ref(), &mut loans).await;

    Ok(loans)
}
