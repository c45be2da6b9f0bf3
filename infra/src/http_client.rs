use domain::{
    DomainError, DomainResult,
    clients::{HttpClient, HttpResponse},
};

/// reqwestを使用したHTTPクライアント
///
/// `reqwest::Client`はコネクションプールを内部に持つため、アプリケーション全体で共有する。
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestHttpClient {
    #[tracing::instrument(skip(self))]
    async fn get(&self, url: &str) -> DomainResult<HttpResponse> {
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn transport_error(e: reqwest::Error) -> DomainError {
    DomainError::Transport(e.to_string().into())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;

    #[tokio::test]
    async fn returns_status_and_body_of_provider_response() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ws/01001000/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"cep":"01001-000"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = ReqwestHttpClient::new(reqwest::Client::new());
        let response = client
            .get(&format!("{}/ws/01001000/json/", server.uri()))
            .await?;

        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"cep":"01001-000"}"#);

        Ok(())
    }

    #[rstest::rstest]
    #[case(400)]
    #[case(404)]
    #[case(503)]
    #[tokio::test]
    async fn error_status_is_returned_as_response(#[case] status: u16) -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let client = ReqwestHttpClient::new(reqwest::Client::new());
        let response = client.get(&format!("{}/ws/00000000/json/", server.uri())).await?;

        assert_eq!(response.status, status);

        Ok(())
    }

    #[tokio::test]
    async fn unreachable_provider_fails_with_transport_error() -> anyhow::Result<()> {
        // 空いているポートを確保してから閉じる
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        drop(listener);

        let client = ReqwestHttpClient::new(reqwest::Client::new());
        let result = client
            .get(&format!("http://127.0.0.1:{}/ws/01001000/json/", port))
            .await;

        assert!(matches!(result, Err(DomainError::Transport(_))));

        Ok(())
    }

    #[tokio::test]
    async fn slow_provider_fails_with_transport_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()?;
        let client = ReqwestHttpClient::new(client);
        let result = client.get(&format!("{}/ws/01001000/json/", server.uri())).await;

        assert!(matches!(result, Err(DomainError::Transport(_))));

        Ok(())
    }
}
