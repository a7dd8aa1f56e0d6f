//! ログ基盤モジュール
//!
//! tracingクレートによるJSON形式の構造化ログ設定を提供する。

use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// ログサブスクライバー初期化用の同期プリミティブ
static INIT: Once = Once::new();

/// ログサブスクライバーを初期化する
///
/// JSON形式での構造化ログ出力を設定し、環境変数`RUST_LOG`または
/// デフォルトのログレベル（info）でフィルタリングを行う。
///
/// 複数回呼び出しても最初の呼び出しのみ初期化を実行する。
pub fn init_logging() {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .flatten_event(true)
            .with_current_span(false);

        // 既に別のサブスクライバーが設定済みでも失敗させない
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init();
    });
}

/// テスト用のログサブスクライバーを初期化する（人間が読みやすい形式）
#[cfg(test)]
pub fn init_test_logging() {
    static TEST_INIT: Once = Once::new();

    TEST_INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ログ初期化が複数回呼び出しても安全であることを確認
    #[test]
    fn test_init_logging_idempotent() {
        init_test_logging();
        init_test_logging();
        init_logging();
        init_logging();
    }

    /// 構造化フィールド付きログが出力できることを確認
    #[test]
    fn test_log_with_context() {
        init_test_logging();

        tracing::info!(event_id = "abc", event_type = "Blue", "イベント作成");
        tracing::error!(error = "接続断", "イベント取得エラー");
    }
}
