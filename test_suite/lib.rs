mod cep;
mod helpers;
mod test_case;

use reqwest::StatusCode;

use crate::{
    helpers::{ResponseParts, load_app_settings_for_testing, split_response},
    test_case::{EnableTracing, TestCase},
};

#[tokio::test]
#[ignore]
async fn health_check() {
    let app_settings = load_app_settings_for_testing();
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;

    let response = test_case.health_check().await;
    let ResponseParts {
        status_code, body, ..
    } = split_response(response).await;
    assert_eq!(
        status_code,
        StatusCode::OK,
        "Health check failed: {}",
        status_code
    );
    let body = serde_json::from_str::<serde_json::Value>(&body).unwrap();
    assert_eq!(body["status"], "ok");

    test_case.end().await;
}
