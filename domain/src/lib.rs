use std::borrow::Cow;

pub mod clients;
pub mod models;
pub mod repositories;

/// ドメインエラー
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    /// 郵便番号の形式が不正
    #[error("{0}")]
    InvalidKey(Cow<'static, str>),

    /// 郵便番号が存在しない
    #[error("{0} is not found")]
    NotFound(Cow<'static, str>),

    /// キャッシュの読み込みに失敗
    #[error("query cache: {0}")]
    CacheRead(Cow<'static, str>),

    /// 郵便番号プロバイダーがエラーを返した
    #[error("directory provider returned status {status}: {message}")]
    Upstream {
        /// HTTPステータスコード
        status: u16,
        /// エラーメッセージ
        message: Cow<'static, str>,
    },

    /// 郵便番号プロバイダーとの通信に失敗
    #[error("{0}")]
    Transport(Cow<'static, str>),

    /// 期限切れ
    #[error("{0}")]
    Timeout(Cow<'static, str>),

    /// リポジトリエラー
    #[error("{0}")]
    Repository(Cow<'static, str>),

    /// 予期しないエラー
    #[error("{0}")]
    Unexpected(Cow<'static, str>),
}

/// ドメイン結果
pub type DomainResult<T> = Result<T, DomainError>;
