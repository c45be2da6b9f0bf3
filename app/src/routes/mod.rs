pub mod cep;

use std::time::Duration;

use axum::{Router, routing::get};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use infra::{AppState, http::handler::health_check};
use settings::HttpSettings;

use crate::routes::cep::create_cep_routes;

/// ルーターを作成する。
///
/// # 引数
///
/// * `app_state`: アプリケーション状態
pub fn create_router(app_state: AppState) -> Router {
    let timeout_layer = request_timeout_layer(&app_state.app_settings.http);
    axum::Router::new()
        .route("/healthz", get(health_check))
        .nest("/cep", create_cep_routes(app_state.clone()))
        .layer(timeout_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// 処理期限を過ぎたリクエストに`408 Request Timeout`を返すレイヤーを作成する。
pub fn request_timeout_layer(settings: &HttpSettings) -> TimeoutLayer {
    TimeoutLayer::new(Duration::from_secs(settings.request_timeout_seconds))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tokio::net::TcpListener;

    use settings::HttpProtocol;

    use super::*;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{}", address)
    }

    fn http_settings(request_timeout_seconds: u64) -> HttpSettings {
        HttpSettings {
            protocol: HttpProtocol::Http,
            host: String::from("127.0.0.1"),
            port: 0,
            request_timeout_seconds,
        }
    }

    #[tokio::test]
    async fn slow_request_is_cut_off_with_request_timeout() {
        let router = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .route("/fast", get(|| async { "done" }))
            .layer(request_timeout_layer(&http_settings(1)));
        let origin = serve(router).await;

        let response = reqwest::get(format!("{}/slow", origin)).await.unwrap();
        assert_eq!(response.status().as_u16(), StatusCode::REQUEST_TIMEOUT.as_u16());

        let response = reqwest::get(format!("{}/fast", origin)).await.unwrap();
        assert_eq!(response.status().as_u16(), StatusCode::OK.as_u16());
    }
}
