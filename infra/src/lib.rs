pub mod http;
pub mod http_client;
pub mod postgres;

use settings::AppSettings;
use use_case::Clock;

#[derive(Clone)]
pub struct AppState {
    pub app_settings: AppSettings,
    pub pg_pool: sqlx::PgPool,
    /// 郵便番号プロバイダーへのリクエストに使用する共有HTTPクライアント
    pub http_client: reqwest::Client,
    pub clock: Clock,
}
