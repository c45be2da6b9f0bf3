use anyhow::Context as _;

use infra::AppState;
use use_case::system_clock;

use app::{
    bind_address, create_http_client, create_pg_pool, get_subscriber, init_subscriber,
    load_app_settings, migrate_database, routes::create_router, shutdown_signal,
};

/// アプリケーションエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // アプリケーション設定を読み込み
    let app_settings = load_app_settings("app_settings.toml")?;

    // ログを初期化
    let subscriber = get_subscriber("cep".into(), app_settings.logging.level, std::io::stdout);
    init_subscriber(subscriber);
    tracing::info!("App settings: {:?}", app_settings);

    // データベース接続プールを作成して、住所キャッシュテーブルを準備
    let pg_pool = create_pg_pool(&app_settings.database).await?;
    migrate_database(&pg_pool).await?;

    // 郵便番号プロバイダー用のHTTPクライアントを作成
    let http_client = create_http_client(&app_settings.provider)?;

    // HTTPサーバーを起動
    let (listener, _) = bind_address(&app_settings.http).await?;
    let address = app_settings.http.bind_address();
    let app_state = AppState {
        app_settings,
        pg_pool,
        http_client,
        clock: system_clock(),
    };
    let router = create_router(app_state);
    tracing::info!("HTTP server is running on {}", address);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to start the HTTP server")?;
    tracing::info!("HTTP server has gracefully shutdown");

    Ok(())
}
