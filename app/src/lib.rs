pub mod routes;

use std::time::Duration;

use anyhow::Context as _;
use config::Config;
use sqlx::postgres::PgPoolOptions;

use tokio::net::TcpListener;
use tracing::{Subscriber, subscriber::set_global_default};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, fmt::MakeWriter, layer::SubscriberExt as _};

use settings::{AppSettings, DatabaseSettings, HttpSettings, ProviderSettings};

/// 環境変数でアプリケーション設定を上書きするときの接頭辞
///
/// `APP_DATABASE__HOST`のように、セクションとキーを`__`で区切る。
const ENV_PREFIX: &str = "APP";
const ENV_SEPARATOR: &str = "__";

pub fn load_app_settings(path: &str) -> anyhow::Result<AppSettings> {
    let config = Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        )
        .build()
        .context("Failed to read the app_settings.toml file")?;
    config
        .try_deserialize()
        .context("The contents of the app_settings.toml file is incorrect")
}

pub async fn bind_address(settings: &HttpSettings) -> anyhow::Result<(TcpListener, u16)> {
    let listener = TcpListener::bind(settings.bind_address())
        .await
        .context("Failed to bind to the address for the HTTP server")?;
    let port = listener
        .local_addr()
        .context("Failed to get the port of listener")?
        .port();

    Ok((listener, port))
}

pub async fn create_pg_pool(
    settings: &DatabaseSettings,
) -> anyhow::Result<sqlx::Pool<sqlx::Postgres>> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.connection_timeout))
        .connect_with(settings.connect_options())
        .await
        .context("Failed to connect to the database")
}

/// 住所キャッシュテーブルが存在しない場合は作成する。
pub async fn migrate_database(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../migrations")
        .run(pool)
        .await
        .context("Failed to migrate the database")
}

pub fn create_http_client(settings: &ProviderSettings) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .connect_timeout(Duration::from_secs(settings.connect_timeout_seconds))
        .build()
        .context("Failed to create the HTTP client for the directory provider")
}

pub fn get_subscriber<Sink>(
    name: String,
    log_level: log::Level,
    sink: Sink,
) -> impl Subscriber + Sync + Send
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    let formatting_layer = BunyanFormattingLayer::new(name, sink);
    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

pub fn init_subscriber(subscriber: impl Subscriber + Sync + Send) {
    LogTracer::init().expect("Failed to set logger");
    set_global_default(subscriber).expect("Failed to set subscriber");
}

/// SIGINTまたはSIGTERMを受信するまで待機する。
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
