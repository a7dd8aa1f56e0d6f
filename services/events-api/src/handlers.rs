//! イベントAPIハンドラー
//!
//! `/api/events`配下のCRUDエンドポイントを提供する。
//! 各ハンドラーはリポジトリを呼び出し、結果をステータスコードに変換するだけで、
//! ビジネスロジックは持たない。
//!
//! | 操作 | 成功 | 結果なし | 失敗 |
//! |---|---|---|---|
//! | GET /events | 200 | 204 | 500 |
//! | GET /events/{id} | 200 | 404 | 500 |
//! | GET /events/type/{type} | 200 | 204 | 500 |
//! | POST /events | 201 | - | 500 |
//! | PUT /events/{id} | 200 | 404 | 500 |
//! | DELETE /events/{id} | 204 | - | 500 |
//! | DELETE /events | 204 | - | 500 |

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::AppState;
use crate::error::{ApiError, ApiErrorBody};
use crate::store::Event;

/// OpenAPIドキュメント
#[derive(OpenApi)]
#[openapi(
    paths(
        list_events,
        get_event,
        list_events_by_type,
        create_event,
        update_event,
        delete_event,
        delete_all_events,
    ),
    components(schemas(Event, EventPayload, ApiErrorBody)),
    tags((name = "events", description = "イベントのCRUD"))
)]
pub struct ApiDoc;

/// イベント作成・更新リクエストのボディ
///
/// `id`はストアが採番するため受け付けない（含まれていても無視する）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct EventPayload {
    /// イベント種別
    #[serde(rename = "type")]
    pub event_type: String,
    /// 発生日時（RFC 3339、省略可）
    #[serde(default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// JSONボディの抽出結果を検証する（内部用）
///
/// 不正なボディは400 Bad Requestに変換する。
fn parse_payload(
    payload: Result<Json<EventPayload>, JsonRejection>,
) -> Result<EventPayload, Response> {
    match payload {
        Ok(Json(payload)) => Ok(payload),
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "不正なリクエストボディ");
            Err(ApiError::bad_request(rejection.body_text()).into_response())
        }
    }
}

/// 全イベント取得エンドポイント (GET /api/events)
///
/// # Returns
/// - 200 OK: イベントの配列
/// - 204 No Content: イベントが存在しない
/// - 500 Internal Server Error: ストアエラー
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "events",
    responses(
        (status = 200, description = "全イベント", body = Vec<Event>),
        (status = 204, description = "イベントが存在しない"),
        (status = 500, description = "ストアエラー", body = ApiErrorBody)
    )
)]
pub async fn list_events(State(state): State<AppState>) -> Response {
    match state.repository.find_all().await {
        Ok(events) if events.is_empty() => {
            tracing::info!("イベントが存在しない");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(events) => {
            tracing::info!(count = events.len(), "全イベントを返却");
            Json(events).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "全イベント取得エラー");
            ApiError::from(e).into_response()
        }
    }
}

/// イベント取得エンドポイント (GET /api/events/{id})
///
/// # Returns
/// - 200 OK: イベント
/// - 404 Not Found: イベントが存在しない
/// - 500 Internal Server Error: ストアエラー
#[utoipa::path(
    get,
    path = "/api/events/{id}",
    tag = "events",
    params(("id" = String, Path, description = "イベントID")),
    responses(
        (status = 200, description = "イベント", body = Event),
        (status = 404, description = "イベントが存在しない", body = ApiErrorBody),
        (status = 500, description = "ストアエラー", body = ApiErrorBody)
    )
)]
pub async fn get_event(State(state): State<AppState>, Path(event_id): Path<String>) -> Response {
    match state.repository.find_by_id(&event_id).await {
        Ok(Some(event)) => Json(event).into_response(),
        Ok(None) => {
            tracing::info!(event_id = %event_id, "イベントが見つからない");
            ApiError::not_found(format!("イベントが見つかりません: {}", event_id)).into_response()
        }
        Err(e) => {
            tracing::error!(event_id = %event_id, error = %e, "イベント取得エラー");
            ApiError::from(e).into_response()
        }
    }
}

/// 種別によるイベント検索エンドポイント (GET /api/events/type/{type})
///
/// 種別は大文字小文字を区別して完全一致で比較する。
///
/// # Returns
/// - 200 OK: 一致したイベントの配列
/// - 204 No Content: 一致するイベントがない
/// - 500 Internal Server Error: ストアエラー
#[utoipa::path(
    get,
    path = "/api/events/type/{type}",
    tag = "events",
    params(("type" = String, Path, description = "イベント種別")),
    responses(
        (status = 200, description = "種別が一致したイベント", body = Vec<Event>),
        (status = 204, description = "一致するイベントがない"),
        (status = 500, description = "ストアエラー", body = ApiErrorBody)
    )
)]
pub async fn list_events_by_type(
    State(state): State<AppState>,
    Path(event_type): Path<String>,
) -> Response {
    match state.repository.find_by_type(&event_type).await {
        Ok(events) if events.is_empty() => {
            tracing::info!(event_type = %event_type, "一致するイベントがない");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(events) => {
            tracing::info!(event_type = %event_type, count = events.len(), "検索結果を返却");
            Json(events).into_response()
        }
        Err(e) => {
            tracing::error!(event_type = %event_type, error = %e, "種別検索エラー");
            ApiError::from(e).into_response()
        }
    }
}

/// イベント作成エンドポイント (POST /api/events)
///
/// IDはストアが採番する。
///
/// # Returns
/// - 201 Created: 保存されたイベント
/// - 400 Bad Request: リクエストボディが不正
/// - 500 Internal Server Error: ストアエラー
#[utoipa::path(
    post,
    path = "/api/events",
    tag = "events",
    request_body = EventPayload,
    responses(
        (status = 201, description = "作成されたイベント", body = Event),
        (status = 400, description = "リクエストボディが不正", body = ApiErrorBody),
        (status = 500, description = "ストアエラー", body = ApiErrorBody)
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<EventPayload>, JsonRejection>,
) -> Response {
    let payload = match parse_payload(payload) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    tracing::info!(event_type = %payload.event_type, "イベント作成リクエストを受信");

    match state
        .repository
        .insert(Event::new(payload.event_type, payload.timestamp))
        .await
    {
        Ok(event) => {
            tracing::info!(event_id = ?event.id, "イベントを作成");
            (StatusCode::CREATED, Json(event)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "イベント作成エラー");
            ApiError::from(e).into_response()
        }
    }
}

/// イベント更新エンドポイント (PUT /api/events/{id})
///
/// 種別とタイムスタンプを置き換える。IDは変更しない。
///
/// # Returns
/// - 200 OK: 更新後のイベント
/// - 400 Bad Request: リクエストボディが不正
/// - 404 Not Found: イベントが存在しない
/// - 500 Internal Server Error: ストアエラー
#[utoipa::path(
    put,
    path = "/api/events/{id}",
    tag = "events",
    params(("id" = String, Path, description = "イベントID")),
    request_body = EventPayload,
    responses(
        (status = 200, description = "更新後のイベント", body = Event),
        (status = 400, description = "リクエストボディが不正", body = ApiErrorBody),
        (status = 404, description = "イベントが存在しない", body = ApiErrorBody),
        (status = 500, description = "ストアエラー", body = ApiErrorBody)
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    payload: Result<Json<EventPayload>, JsonRejection>,
) -> Response {
    let payload = match parse_payload(payload) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    tracing::info!(event_id = %event_id, "イベント更新リクエストを受信");

    let mut event = match state.repository.find_by_id(&event_id).await {
        Ok(Some(event)) => event,
        Ok(None) => {
            tracing::warn!(event_id = %event_id, "更新対象のイベントが見つからない");
            return ApiError::not_found(format!("イベントが見つかりません: {}", event_id))
                .into_response();
        }
        Err(e) => {
            tracing::error!(event_id = %event_id, error = %e, "イベント取得エラー");
            return ApiError::from(e).into_response();
        }
    };

    event.event_type = payload.event_type;
    event.timestamp = payload.timestamp;

    match state.repository.save(event).await {
        Ok(event) => {
            tracing::info!(event_id = %event_id, "イベントを更新");
            Json(event).into_response()
        }
        Err(e) => {
            tracing::error!(event_id = %event_id, error = %e, "イベント更新エラー");
            ApiError::from(e).into_response()
        }
    }
}

/// イベント削除エンドポイント (DELETE /api/events/{id})
///
/// 存在しないIDでも204を返す。
///
/// # Returns
/// - 204 No Content: 削除完了
/// - 500 Internal Server Error: ストアエラー
#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    tag = "events",
    params(("id" = String, Path, description = "イベントID")),
    responses(
        (status = 204, description = "削除完了"),
        (status = 500, description = "ストアエラー", body = ApiErrorBody)
    )
)]
pub async fn delete_event(State(state): State<AppState>, Path(event_id): Path<String>) -> Response {
    match state.repository.delete_by_id(&event_id).await {
        Ok(()) => {
            tracing::info!(event_id = %event_id, "イベントを削除");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            tracing::error!(event_id = %event_id, error = %e, "イベント削除エラー");
            ApiError::from(e).into_response()
        }
    }
}

/// 全イベント削除エンドポイント (DELETE /api/events)
///
/// # Returns
/// - 204 No Content: 削除完了
/// - 500 Internal Server Error: ストアエラー
#[utoipa::path(
    delete,
    path = "/api/events",
    tag = "events",
    responses(
        (status = 204, description = "削除完了"),
        (status = 500, description = "ストアエラー", body = ApiErrorBody)
    )
)]
pub async fn delete_all_events(State(state): State<AppState>) -> Response {
    match state.repository.delete_all().await {
        Ok(()) => {
            tracing::info!("全イベントを削除");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "全イベント削除エラー");
            ApiError::from(e).into_response()
        }
    }
}
