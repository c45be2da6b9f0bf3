use crate::DomainResult;

/// HTTPレスポンス
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTPステータスコード
    pub status: u16,
    /// ボディ
    pub body: Vec<u8>,
}

/// HTTPクライアント
///
/// 郵便番号プロバイダーへのリクエストを送信する。
/// 通信に失敗した場合は`DomainError::Transport`を返し、
/// エラーを示すステータスコードはそのまま`HttpResponse`で返す。
#[async_trait::async_trait]
pub trait HttpClient: Sync + Send {
    /// GETリクエストを送信する。
    async fn get(&self, url: &str) -> DomainResult<HttpResponse>;
}
