//! サーバー設定
//!
//! 環境変数から読み込む起動時設定を管理する。

use std::net::SocketAddr;

use thiserror::Error;

/// データベースパス環境変数名
pub const DB_PATH_ENV: &str = "DB_PATH";

/// リッスンアドレス環境変数名
pub const BIND_ADDR_ENV: &str = "BIND_ADDR";

/// デフォルトのデータベースパス
pub const DEFAULT_DB_PATH: &str = "/var/lib/events-api/events.db";

/// デフォルトのリッスンアドレス
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// 設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// リッスンアドレスの形式が不正
    #[error("BIND_ADDR の形式が不正です: {0}")]
    InvalidBindAddr(String),
}

/// サーバー設定
///
/// # フィールド
/// - `db_path`: SQLiteデータベースファイルのパス
/// - `bind_addr`: HTTPサーバーのリッスンアドレス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    db_path: String,
    bind_addr: SocketAddr,
}

impl AppConfig {
    /// 新しい設定を作成
    pub fn new(db_path: impl Into<String>, bind_addr: SocketAddr) -> Self {
        Self {
            db_path: db_path.into(),
            bind_addr,
        }
    }

    /// 環境変数から設定を読み込み
    ///
    /// # 環境変数
    /// - `DB_PATH`: データベースファイルのパス（デフォルト: /var/lib/events-api/events.db）
    /// - `BIND_ADDR`: リッスンアドレス（デフォルト: 127.0.0.1:8080）
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = std::env::var(DB_PATH_ENV).unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

        let raw_addr =
            std::env::var(BIND_ADDR_ENV).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(raw_addr))?;

        Ok(Self { db_path, bind_addr })
    }

    /// データベースパスを取得
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// リッスンアドレスを取得
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_new_creates_config() {
        let addr: SocketAddr = "0.0.0.0:9000".parse().unwrap();
        let config = AppConfig::new("/tmp/events.db", addr);

        assert_eq!(config.db_path(), "/tmp/events.db");
        assert_eq!(config.bind_addr(), addr);
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        unsafe {
            std::env::remove_var(DB_PATH_ENV);
            std::env::remove_var(BIND_ADDR_ENV);
        }

        let config = AppConfig::from_env().expect("設定の読み込みに失敗");

        assert_eq!(config.db_path(), DEFAULT_DB_PATH);
        assert_eq!(config.bind_addr().to_string(), DEFAULT_BIND_ADDR);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        // 環境変数を設定 (Rust 2024ではunsafe)
        unsafe {
            std::env::set_var(DB_PATH_ENV, "/data/test.db");
            std::env::set_var(BIND_ADDR_ENV, "0.0.0.0:3000");
        }

        let config = AppConfig::from_env().expect("設定の読み込みに失敗");

        assert_eq!(config.db_path(), "/data/test.db");
        assert_eq!(config.bind_addr().port(), 3000);

        // クリーンアップ
        unsafe {
            std::env::remove_var(DB_PATH_ENV);
            std::env::remove_var(BIND_ADDR_ENV);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_bind_addr() {
        unsafe {
            std::env::set_var(BIND_ADDR_ENV, "not-an-address");
        }

        let result = AppConfig::from_env();

        match result {
            Err(ConfigError::InvalidBindAddr(value)) => assert_eq!(value, "not-an-address"),
            other => panic!("InvalidBindAddrになるべき: {:?}", other),
        }

        unsafe {
            std::env::remove_var(BIND_ADDR_ENV);
        }
    }

    #[test]
    fn test_error_display() {
        let error = ConfigError::InvalidBindAddr("xyz".to_string());
        assert!(error.to_string().contains("xyz"));
        assert!(error.to_string().contains(BIND_ADDR_ENV));
    }
}
