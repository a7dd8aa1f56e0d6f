//! イベントレコードのCRUDを提供するHTTP APIサーバー
//!
//! 本クレートは以下の機能を提供する:
//! - イベントの一覧・取得・種別検索 (GET /api/events, /api/events/{id}, /api/events/type/{type})
//! - イベントの作成・更新 (POST /api/events, PUT /api/events/{id})
//! - イベントの削除 (DELETE /api/events/{id}, DELETE /api/events)
//! - ヘルスチェック (GET /health)
//! - OpenAPIドキュメント (GET /api-docs/openapi.json)

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod seed;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::ApiError;
pub use store::{Event, EventRepository, SqliteEventStore, StoreError};

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use handlers::{
    ApiDoc, create_event, delete_all_events, delete_event, get_event, list_events,
    list_events_by_type, update_event,
};

/// アプリケーション状態
///
/// ルーター全体で共有される状態を保持する。
#[derive(Clone)]
pub struct AppState {
    /// イベントリポジトリ
    pub repository: Arc<dyn EventRepository>,
}

/// ヘルスチェックエンドポイント
async fn health() -> &'static str {
    "OK"
}

/// OpenAPIドキュメントエンドポイント
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// ルーターを構築する
///
/// `/api`配下にイベントAPIを配置する。
/// 種別検索は`/api/events/{id}`と衝突しないよう`/api/events/type/{type}`に置く。
/// TraceLayerによりリクエスト/レスポンスの構造化ログを自動記録する。
///
/// # Arguments
/// * `repository` - イベントリポジトリ
pub fn create_router(repository: Arc<dyn EventRepository>) -> Router {
    let state = AppState { repository };

    let api = Router::new()
        .route(
            "/events",
            get(list_events).post(create_event).delete(delete_all_events),
        )
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/type/{type}", get(list_events_by_type));

    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", api)
        // リクエストトレーシングレイヤー（method, path, status, latencyを自動記録）
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
