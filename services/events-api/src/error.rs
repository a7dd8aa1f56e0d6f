//! APIエラーハンドリング
//!
//! 統一されたエラーレスポンス形式を提供する。
//! すべてのエラーはJSON形式で返却され、`error`と`message`フィールドを含む。
//! ストア内部のエラー詳細はクライアントに返さない。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::StoreError;

/// 500レスポンスの固定メッセージ
const INTERNAL_ERROR_MESSAGE: &str = "サーバー内部でエラーが発生しました";

/// APIエラーレスポンスのボディ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ApiErrorBody {
    /// エラー種別（例: "bad_request", "not_found", "internal_error"）
    pub error: String,
    /// 詳細なエラーメッセージ
    pub message: String,
}

/// APIエラー
///
/// ステータスコードとJSON形式のエラーボディを含む。
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorBody,
}

impl ApiError {
    /// 新しいApiErrorを作成
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                error: error.into(),
                message: message.into(),
            },
        }
    }

    /// 400 Bad Requestエラーを作成
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// 404 Not Foundエラーを作成
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// 500 Internal Server Errorを作成
    ///
    /// メッセージは固定で、原因は含めない。
    pub fn internal_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            INTERNAL_ERROR_MESSAGE,
        )
    }

    /// エラー種別を取得
    pub fn error(&self) -> &str {
        &self.body.error
    }

    /// エラーメッセージを取得
    pub fn message(&self) -> &str {
        &self.body.message
    }

    /// ステータスコードを取得
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<StoreError> for ApiError {
    fn from(_: StoreError) -> Self {
        ApiError::internal_error()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
