use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::application::loan::LoanServiceError;

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    /// サービス層から伝播したエラー
    Service(LoanServiceError),
    /// x-actor-role ヘッダーが欠落、または未知のロール値
    UnknownRole(String),
    /// リクエストの形式不備（不正なUUID・ISBN・ステータス文字列など）
    BadRequest(String),
}

impl From<LoanServiceError> for ApiError {
    fn from(err: LoanServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            // 403 Forbidden - ロールが操作を許可されていない
            ApiError::Service(LoanServiceError::Unauthorized(ref e)) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string())
            }
            // 未知のロールはロール不足と同じ扱いで拒否する
            ApiError::UnknownRole(ref detail) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                format!("Unrecognized role: {}", detail),
            ),

            // 404 Not Found - 対象リソースが存在しない（空の検索結果を含む）
            ApiError::Service(LoanServiceError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", msg)
            }

            // 422 Unprocessable Entity - ビジネスルール違反
            ApiError::Service(LoanServiceError::InvalidState(msg)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_STATE", msg)
            }

            // 409 Conflict - 重複する貸出
            ApiError::Service(LoanServiceError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg)
            }

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            ApiError::Service(LoanServiceError::Persistence(ref e)) => {
                tracing::error!("Persistence error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "Failed to access loan records".to_string(),
                )
            }

            // 400 Bad Request - リクエスト形式の不備
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
