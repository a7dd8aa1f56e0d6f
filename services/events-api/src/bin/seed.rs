//! シードデータ投入コマンド
//!
//! 動作確認用のダミーイベントをSQLiteストアに一括投入する。
//! HTTPサーバーの起動前に一度だけ実行することを想定している。
//!
//! # 環境変数
//! - DB_PATH: データベースファイルのパス（`--db-path`で上書き可能）
//! - RUST_LOG: ログレベル（デフォルト: info）
//!
//! # ローカル実行
//! ```bash
//! # デフォルト件数（400件）を投入
//! cargo run --bin seed
//!
//! # 件数とデータベースを指定
//! cargo run --bin seed -- --count 50 --db-path ./events.db
//! ```

use clap::Parser;
use events_api::config::DEFAULT_DB_PATH;
use events_api::seed::{DEFAULT_SEED_COUNT, generate_events};
use events_api::{EventRepository, SqliteEventStore, logging};
use tracing::{error, info};

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "seed")]
#[command(about = "ダミーイベントをストアに投入")]
struct CliArgs {
    /// データベースファイルのパス
    #[arg(long, short = 'd', env = "DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: String,

    /// 投入するイベント数
    #[arg(long, short = 'c', default_value_t = DEFAULT_SEED_COUNT)]
    count: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let args = CliArgs::parse();
    info!(db_path = %args.db_path, count = args.count, "シードデータ投入を開始");

    let store = SqliteEventStore::new(&args.db_path).await.inspect_err(|e| {
        error!(error = %e, "SQLiteストアの初期化に失敗しました");
    })?;

    let events = generate_events(&mut rand::rng(), args.count);
    let stored = store.insert_all(events).await.inspect_err(|e| {
        error!(error = %e, "シードデータの投入に失敗しました");
    })?;

    info!(count = stored.len(), "シードデータ投入が完了");
    Ok(())
}
