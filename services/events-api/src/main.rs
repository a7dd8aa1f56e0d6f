//! イベントAPIサーバーのエントリーポイント
//!
//! 設定を読み込み、SQLiteストアを開いてHTTPサーバーを起動する。

use std::sync::Arc;

use events_api::{AppConfig, SqliteEventStore, create_router, logging};
use tokio::signal;

/// シャットダウンシグナルを待機する
///
/// SIGTERMまたはCtrl+C (SIGINT) を待機し、いずれかを受信したらリターンする。
/// axum::serve の with_graceful_shutdown() と組み合わせて使用することで、
/// 新規リクエストの受付停止と処理中リクエストの完了待機を実現する。
/// ハンドラー登録に失敗したシグナルは待機しない。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C シグナルハンドラーの登録に失敗しました");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM シグナルハンドラーの登録に失敗しました");
                std::future::pending::<()>().await;
            }
        }
    };

    // Windows等の非Unix環境ではSIGTERMは利用不可
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C (SIGINT) を受信しました。graceful shutdownを開始します");
        }
        _ = terminate => {
            tracing::info!("SIGTERM を受信しました。graceful shutdownを開始します");
        }
    }
}

/// メイン関数
///
/// # 環境変数
/// - `DB_PATH`: データベースファイルのパス（デフォルト: /var/lib/events-api/events.db）
/// - `BIND_ADDR`: リッスンアドレス（デフォルト: 127.0.0.1:8080）
/// - `RUST_LOG`: ログレベル（デフォルト: info）
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    tracing::info!("イベントAPIサーバーを起動します");

    let config = AppConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "設定の読み込みに失敗しました");
    })?;
    tracing::info!(db_path = %config.db_path(), "データベースパス");

    let store = SqliteEventStore::new(config.db_path())
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "SQLiteストアの初期化に失敗しました");
        })?;
    tracing::info!("SQLiteストアを初期化しました");

    let app = create_router(Arc::new(store));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "リッスン開始");

    // シグナル受信後、処理中のリクエスト完了を待ってからストアがドロップされる
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("サーバーが正常に停止しました");
    Ok(())
}

#[cfg(test)]
mod graceful_shutdown_tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::sync::oneshot;

    /// テスト用のルーターを作成
    async fn create_test_app() -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db").to_string_lossy().to_string();
        let store = SqliteEventStore::new(&db_path).await.unwrap();
        (create_router(Arc::new(store)), dir)
    }

    /// graceful shutdownを使用したサーバーが正常に起動・停止できることを確認
    #[tokio::test]
    async fn test_server_with_graceful_shutdown_starts_and_stops() {
        let (app, dir) = create_test_app().await;

        // ランダムポートでリッスン
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("サーバーの起動に失敗");
        });

        // サーバーが起動するまで少し待機
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("ヘルスチェックリクエストに失敗");
        assert_eq!(response.status(), 200);

        let response = client
            .get(format!("http://{}/api/events", addr))
            .send()
            .await
            .expect("一覧リクエストに失敗");
        assert_eq!(response.status(), 204);

        shutdown_tx.send(()).expect("シャットダウンシグナル送信に失敗");

        // サーバーが正常に停止するのを待機（タイムアウト付き）
        let shutdown_result = tokio::time::timeout(Duration::from_secs(5), server_handle).await;
        assert!(
            shutdown_result.is_ok(),
            "サーバーが5秒以内に停止しなかった"
        );
        assert!(
            shutdown_result.unwrap().is_ok(),
            "サーバーがエラーで停止した"
        );

        drop(dir);
    }

    /// shutdown_signal関数の型を確認
    /// (実際のシグナルを送信するテストは行わない)
    #[test]
    fn test_shutdown_signal_function_exists() {
        fn _check_shutdown_signal_type() -> impl std::future::Future<Output = ()> {
            shutdown_signal()
        }
    }
}
