use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

/// アプリケーション設定
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// HTTPサーバー設定
    pub http: HttpSettings,
    /// データベース設定
    pub database: DatabaseSettings,
    /// キャッシュ設定
    #[serde(default)]
    pub cache: CacheSettings,
    /// 郵便番号プロバイダー設定
    #[serde(default)]
    pub provider: ProviderSettings,
    /// リクエスト期限設定
    #[serde(default)]
    pub deadline: DeadlineSettings,
    /// ログ設定
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename = "protocol")]
#[serde(rename_all = "lowercase")]
pub enum HttpProtocol {
    /// HTTPプロトコル
    Http,
    /// HTTPSプロトコル
    Https,
}

impl std::fmt::Display for HttpProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

/// HTTPサーバー設定
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// プロトコル
    pub protocol: HttpProtocol,
    /// ホスト名
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// リクエストの処理期限（秒）
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout_seconds() -> u64 {
    15
}

/// データベース設定
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// ホスト名
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// ユーザー名
    pub user: String,
    /// パスワード
    pub password: SecretString,
    /// データベース名
    pub name: String,
    /// SSL接続モード
    #[serde(default)]
    pub ssl_mode: DatabaseSslMode,
    /// 最大接続数
    pub max_connections: u32,
    /// 接続タイムアウト（秒）
    pub connection_timeout: u64,
}

/// データベースのSSL接続モード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatabaseSslMode {
    /// SSL接続しない
    #[default]
    Disable,
    /// SSL接続を試みて、失敗した場合は非SSLで接続する
    Prefer,
    /// SSL接続を要求する
    Require,
    /// SSL接続を要求して、サーバー証明書を検証する
    VerifyCa,
    /// SSL接続を要求して、サーバー証明書とホスト名を検証する
    VerifyFull,
}

impl From<DatabaseSslMode> for PgSslMode {
    fn from(value: DatabaseSslMode) -> Self {
        match value {
            DatabaseSslMode::Disable => Self::Disable,
            DatabaseSslMode::Prefer => Self::Prefer,
            DatabaseSslMode::Require => Self::Require,
            DatabaseSslMode::VerifyCa => Self::VerifyCa,
            DatabaseSslMode::VerifyFull => Self::VerifyFull,
        }
    }
}

/// キャッシュ設定
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CacheSettings {
    /// キャッシュの生存期間（秒）
    ///
    /// 0以下の場合、キャッシュは期限切れにならない。
    pub ttl_seconds: i64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 24 * 60 * 60,
        }
    }
}

/// 郵便番号プロバイダー設定
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    /// ベースURL
    ///
    /// `{base_url}/{郵便番号}/json/`に問い合わせる。
    pub base_url: String,
    /// リクエストタイムアウト（秒）
    pub timeout_seconds: u64,
    /// 接続タイムアウト（秒）
    pub connect_timeout_seconds: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: String::from("https://viacep.com.br/ws"),
            timeout_seconds: 5,
            connect_timeout_seconds: 5,
        }
    }
}

/// リクエスト期限設定
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DeadlineSettings {
    /// 郵便番号検索の期限（秒）
    pub lookup_seconds: u64,
    /// ヘルスチェックの期限（秒）
    pub health_check_seconds: u64,
}

impl Default for DeadlineSettings {
    fn default() -> Self {
        Self {
            lookup_seconds: 10,
            health_check_seconds: 2,
        }
    }
}

/// ログ設定
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// ログレベル
    pub level: log::Level,
}

impl HttpSettings {
    /// バインドするアドレス（ホスト名とポート番号）を返す。
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseSettings {
    /// データベース接続オプションを返す。
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(&self.name)
            .ssl_mode(self.ssl_mode.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database_settings(ssl_mode: Option<&str>) -> DatabaseSettings {
        let mut value = serde_json::json!({
            "host": "localhost",
            "port": 5432,
            "user": "cep",
            "password": "cep-password",
            "name": "cep_db",
            "max_connections": 10,
            "connection_timeout": 5,
        });
        if let Some(ssl_mode) = ssl_mode {
            value["ssl_mode"] = serde_json::Value::from(ssl_mode);
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn ssl_is_disabled_when_ssl_mode_is_omitted() {
        let settings = database_settings(None);
        assert_eq!(settings.ssl_mode, DatabaseSslMode::Disable);
    }

    #[rstest::rstest]
    #[case("disable", DatabaseSslMode::Disable)]
    #[case("prefer", DatabaseSslMode::Prefer)]
    #[case("require", DatabaseSslMode::Require)]
    #[case("verify-ca", DatabaseSslMode::VerifyCa)]
    #[case("verify-full", DatabaseSslMode::VerifyFull)]
    fn ssl_mode_is_read_from_settings(#[case] raw: &str, #[case] expected: DatabaseSslMode) {
        let settings = database_settings(Some(raw));
        assert_eq!(settings.ssl_mode, expected);
    }

    #[test]
    fn ssl_mode_is_converted_to_postgres_ssl_mode() {
        assert!(matches!(
            PgSslMode::from(DatabaseSslMode::Disable),
            PgSslMode::Disable
        ));
        assert!(matches!(
            PgSslMode::from(DatabaseSslMode::VerifyFull),
            PgSslMode::VerifyFull
        ));
    }
}
