//! SQLiteイベントストア
//!
//! イベントドキュメントの保存・取得・削除機能を提供する。
//! - 書き込み: 専用の単一接続（Arc<Mutex<Connection>>）
//! - 読み取り: deadpool-sqliteによるasync接続プール
//!
//! 各イベントはJSONドキュメントとして`document`カラムに格納し、
//! 種別検索用に`type`カラムのみを別途持つ。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use deadpool_sqlite::{Config, Pool, Runtime};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// ストアエラー
#[derive(Debug, Error)]
pub enum StoreError {
    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(String),

    /// プール取得エラー
    #[error("プールエラー: {0}")]
    Pool(String),

    /// 接続構築エラー
    #[error("接続構築エラー: {0}")]
    Build(String),

    /// ドキュメントのシリアライズ/デシリアライズエラー
    #[error("シリアライズエラー: {0}")]
    Serialization(String),

    /// 書き込み接続のロック取得エラー
    #[error("ロックエラー: {0}")]
    Lock(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<deadpool_sqlite::BuildError> for StoreError {
    fn from(err: deadpool_sqlite::BuildError) -> Self {
        StoreError::Build(err.to_string())
    }
}

impl From<deadpool_sqlite::PoolError> for StoreError {
    fn from(err: deadpool_sqlite::PoolError) -> Self {
        StoreError::Pool(err.to_string())
    }
}

impl From<deadpool_sqlite::InteractError> for StoreError {
    fn from(err: deadpool_sqlite::InteractError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// イベント
///
/// 永続化される唯一のレコード。HTTP APIのレスポンスでも使用する。
/// `id`は保存時にストアが採番し、以後変更されない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Event {
    /// ストアが採番したイベントID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// イベント種別（自由形式のラベル）
    #[serde(rename = "type")]
    pub event_type: String,
    /// 発生日時（タイムゾーン付き）
    #[serde(default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl Event {
    /// ID未採番のイベントを作成
    pub fn new(event_type: impl Into<String>, timestamp: Option<DateTime<FixedOffset>>) -> Self {
        Self {
            id: None,
            event_type: event_type.into(),
            timestamp,
        }
    }
}

/// イベントリポジトリ
///
/// ドキュメントコレクションに対するCRUD操作を抽象化する。
/// 失敗時は`StoreError`をそのまま呼び出し元に返し、リトライは行わない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// 全イベントを取得（順序は保証しない）
    async fn find_all(&self) -> Result<Vec<Event>, StoreError>;

    /// IDでイベントを取得
    ///
    /// # Returns
    /// * `Ok(Some(Event))` - 見つかった場合
    /// * `Ok(None)` - 存在しない場合
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, StoreError>;

    /// 種別が完全一致するイベントを取得
    async fn find_by_type(&self, event_type: &str) -> Result<Vec<Event>, StoreError>;

    /// イベントを新規挿入
    ///
    /// IDが未設定の場合は新しいIDを採番する。
    /// 既存IDでの挿入は制約違反としてエラーになる。
    async fn insert(&self, event: Event) -> Result<Event, StoreError>;

    /// 複数イベントを単一トランザクションで挿入
    async fn insert_all(&self, events: Vec<Event>) -> Result<Vec<Event>, StoreError>;

    /// IDをキーにイベントをupsert
    async fn save(&self, event: Event) -> Result<Event, StoreError>;

    /// IDでイベントを削除（存在しなくてもエラーにしない）
    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;

    /// 全イベントを削除
    async fn delete_all(&self) -> Result<(), StoreError>;
}

/// SQLiteデータベースのスキーマを定義するSQL
const SCHEMA_SQL: &str = r#"
-- WALモード設定
PRAGMA journal_mode=WAL;
PRAGMA synchronous=NORMAL;

-- イベントコレクション
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,           -- ストア採番ID
    type TEXT NOT NULL,            -- イベント種別
    document TEXT NOT NULL         -- 完全なイベントJSON
);
"#;

const INSERT_SQL: &str = "INSERT INTO events (id, type, document) VALUES (?1, ?2, ?3)";

const UPSERT_SQL: &str = "INSERT INTO events (id, type, document) VALUES (?1, ?2, ?3)
     ON CONFLICT(id) DO UPDATE SET type = excluded.type, document = excluded.document";

/// SQLiteイベントストア
///
/// - 書き込み: 専用の単一接続（Arc<Mutex<Connection>>）
/// - 読み取り: deadpool-sqliteによるasync接続プール
pub struct SqliteEventStore {
    /// 書き込み専用接続
    write_conn: Arc<Mutex<Connection>>,
    /// 読み取り用async接続プール
    read_pool: Pool,
}

impl SqliteEventStore {
    /// 新しいSqliteEventStoreを作成
    ///
    /// データベースファイルを開き、スキーマを初期化する。
    ///
    /// # Arguments
    /// * `db_path` - データベースファイルのパス
    pub async fn new(db_path: &str) -> Result<Self, StoreError> {
        let write_conn = Connection::open(db_path)?;
        write_conn.execute_batch(SCHEMA_SQL)?;

        // 読み取り用プール（最大4接続）
        let read_pool = Config::new(db_path)
            .builder(Runtime::Tokio1)
            .map_err(|e| StoreError::Build(e.to_string()))?
            .max_size(4)
            .build()?;

        Ok(Self {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
        })
    }

    /// 採番済みのイベントを作成（内部用）
    fn assign_id(mut event: Event) -> Event {
        if event.id.is_none() {
            event.id = Some(Uuid::new_v4().simple().to_string());
        }
        event
    }

    /// 1件書き込む（内部用）
    ///
    /// `sql`はINSERTまたはUPSERT文。IDは採番済みであること。
    fn write_document(conn: &Connection, sql: &str, event: &Event) -> Result<(), StoreError> {
        let document = serde_json::to_string(event)?;
        conn.execute(
            sql,
            rusqlite::params![event.id.as_deref(), &event.event_type, &document],
        )?;
        Ok(())
    }

    /// 書き込み接続上でクロージャを実行（内部用）
    ///
    /// ブロッキング処理のため`spawn_blocking`で実行する。
    async fn with_write_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.write_conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| StoreError::Database(format!("タスク実行エラー: {}", e)))?
    }

    /// ドキュメントを取得するクエリを実行（内部用）
    fn query_documents(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Event>, StoreError> {
        let mut stmt = conn.prepare(sql)?;
        let documents = stmt
            .query_map(params, |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        documents
            .iter()
            .map(|json| serde_json::from_str(json).map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl EventRepository for SqliteEventStore {
    async fn find_all(&self) -> Result<Vec<Event>, StoreError> {
        let conn = self.read_pool.get().await?;

        conn.interact(|conn| {
            Self::query_documents(conn, "SELECT document FROM events ORDER BY rowid", &[])
        })
        .await?
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, StoreError> {
        let id = id.to_string();
        let conn = self.read_pool.get().await?;

        conn.interact(move |conn| -> Result<Option<Event>, StoreError> {
            let document: Option<String> = conn
                .query_row("SELECT document FROM events WHERE id = ?1", [&id], |row| {
                    row.get(0)
                })
                .optional()?;

            document
                .map(|json| serde_json::from_str(&json).map_err(StoreError::from))
                .transpose()
        })
        .await?
    }

    async fn find_by_type(&self, event_type: &str) -> Result<Vec<Event>, StoreError> {
        let event_type = event_type.to_string();
        let conn = self.read_pool.get().await?;

        conn.interact(move |conn| {
            Self::query_documents(
                conn,
                "SELECT document FROM events WHERE type = ?1 ORDER BY rowid",
                &[&event_type as &dyn rusqlite::ToSql],
            )
        })
        .await?
    }

    async fn insert(&self, event: Event) -> Result<Event, StoreError> {
        let event = Self::assign_id(event);

        self.with_write_conn(move |conn| {
            Self::write_document(conn, INSERT_SQL, &event)?;
            Ok(event)
        })
        .await
    }

    async fn insert_all(&self, events: Vec<Event>) -> Result<Vec<Event>, StoreError> {
        let events: Vec<Event> = events.into_iter().map(Self::assign_id).collect();

        self.with_write_conn(move |conn| {
            let tx = conn.transaction()?;
            for event in &events {
                Self::write_document(&tx, INSERT_SQL, event)?;
            }
            tx.commit()?;
            Ok(events)
        })
        .await
    }

    async fn save(&self, event: Event) -> Result<Event, StoreError> {
        let event = Self::assign_id(event);

        self.with_write_conn(move |conn| {
            Self::write_document(conn, UPSERT_SQL, &event)?;
            Ok(event)
        })
        .await
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();

        self.with_write_conn(move |conn| {
            conn.execute("DELETE FROM events WHERE id = ?1", [&id])?;
            Ok(())
        })
        .await
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.with_write_conn(|conn| {
            conn.execute("DELETE FROM events", [])?;
            Ok(())
        })
        .await
    }
}
