use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::loan::{
    ServiceDependencies, delete_loan as execute_delete_loan, find_loan_by_id, find_loans_by_isbn,
    find_loans_by_member, find_loans_by_status, get_all_loans, mark_return as execute_mark_return,
    register_loan as execute_register_loan,
};
use crate::domain::commands::{DeleteLoan, MarkReturn, RegisterLoan};
use crate::domain::{Isbn, LoanId, LoanStatus, MemberId, Role};

use super::{
    error::ApiError,
    types::{ListLoansQuery, LoanResponse, RegisterLoanRequest},
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

/// x-actor-role ヘッダーから操作者のロールを解決する
///
/// ヘッダーの欠落・未知の値はどちらも 403 として扱う。
fn actor_role(headers: &HeaderMap) -> Result<Role, ApiError> {
    let value = headers
        .get("x-actor-role")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::UnknownRole("missing x-actor-role header".to_string()))?;

    Role::from_str(value).map_err(ApiError::UnknownRole)
}

fn parse_isbn(value: String) -> Result<Isbn, ApiError> {
    Isbn::new(value).map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ============================================================================
// Command handlers
// ============================================================================

/// POST /loans - 新しい貸出を登録
///
/// 強制されるビジネスルール:
/// - 会員が存在しアクティブであること
/// - 書籍が存在しアクティブで、貸出可能な在庫があること
/// - 同一会員・同一書籍のアクティブな貸出が存在しないこと
pub async fn register_loan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RegisterLoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let actor = actor_role(&headers)?;
    let isbn = parse_isbn(req.isbn)?;

    let cmd = RegisterLoan {
        member_id: MemberId::from_uuid(req.member_id),
        isbn,
        actor,
        today: Utc::now().date_naive(),
    };

    let loan = execute_register_loan(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(LoanResponse::from(loan))))
}

/// POST /loans/:id/return - 返却を記録
///
/// 返却日を確定し、延滞日数に応じた罰金を一度だけ計算して、
/// 書籍の在庫を1冊戻す。
pub async fn mark_return(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(loan_id): Path<Uuid>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let actor = actor_role(&headers)?;

    let cmd = MarkReturn {
        loan_id: LoanId::from_uuid(loan_id),
        actor,
        today: Utc::now().date_naive(),
    };

    let loan = execute_mark_return(&state.service_deps, cmd).await?;

    Ok((StatusCode::OK, Json(LoanResponse::from(loan))))
}

/// DELETE /loans/:id - 貸出レコードを削除（Adminのみ）
pub async fn delete_loan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(loan_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_role(&headers)?;

    let cmd = DeleteLoan {
        loan_id: LoanId::from_uuid(loan_id),
        actor,
    };

    execute_delete_loan(&state.service_deps, cmd).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Query handlers
// ============================================================================

/// GET /loans - 貸出一覧を取得
///
/// クエリパラメータで会員ID・ISBN・ステータスのいずれかによる
/// 絞り込みが可能。いずれの経路も返却前に延滞スイープを実行する。
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let actor = actor_role(&headers)?;
    let today = Utc::now().date_naive();
    let deps = &state.service_deps;

    let loans = if let Some(member_id) = query.member_id {
        find_loans_by_member(deps, MemberId::from_uuid(member_id), actor, today).await?
    } else if let Some(isbn) = query.isbn {
        find_loans_by_isbn(deps, parse_isbn(isbn)?, actor, today).await?
    } else if let Some(status) = query.status {
        let status = LoanStatus::from_str(&status).map_err(ApiError::BadRequest)?;
        find_loans_by_status(deps, status, actor, today).await?
    } else {
        get_all_loans(deps, actor, today).await?
    };

    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}

/// GET /loans/:id - 貸出詳細を取得
pub async fn get_loan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let actor = actor_role(&headers)?;

    let loan = find_loan_by_id(
        &state.service_deps,
        LoanId::from_uuid(loan_id),
        actor,
        Utc::now().date_naive(),
    )
    .await?;

    Ok(Json(LoanResponse::from(loan)))
}
