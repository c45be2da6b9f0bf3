use reqwest::StatusCode;
use time::{Duration, OffsetDateTime};
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path},
};

use domain::models::{CacheEntry, PostalCode, PostalRecord};

use crate::helpers::{ResponseParts, load_app_settings_for_testing, split_response};
use crate::test_case::{EnableTracing, TestCase};

const PROVIDER_BODY: &str = r#"{
    "cep": "01001-000",
    "logradouro": "Praça da Sé",
    "complemento": "lado ímpar",
    "bairro": "Sé",
    "localidade": "São Paulo",
    "uf": "SP",
    "ibge": "3550308",
    "gia": "1004",
    "ddd": "11",
    "siafi": "7107"
}"#;

fn provider_responds(digits: &str, template: ResponseTemplate, times: u64) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/ws/{}/json/", digits)))
        .respond_with(template)
        .expect(times)
}

#[tokio::test]
#[ignore]
async fn lookup_is_fetched_once_and_then_served_from_cache() {
    let app_settings = load_app_settings_for_testing();
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;
    provider_responds(
        "01001000",
        ResponseTemplate::new(200).set_body_string(PROVIDER_BODY),
        1,
    )
    .mount(&test_case.provider)
    .await;

    let response = test_case.cep("01001-000").await;
    let ResponseParts {
        status_code, body, ..
    } = split_response(response).await;
    assert_eq!(status_code, StatusCode::OK, "Lookup failed: {}", body);
    let first = serde_json::from_str::<PostalRecord>(&body).unwrap();
    assert_eq!(first.code, "01001-000");
    assert_eq!(first.city, "São Paulo");

    let entry = test_case.cached_entry("01001000").await;
    assert!(entry.is_some(), "The record was not written back to the cache");

    let response = test_case.cep("01001000").await;
    let ResponseParts {
        status_code, body, ..
    } = split_response(response).await;
    assert_eq!(status_code, StatusCode::OK);
    let second = serde_json::from_str::<PostalRecord>(&body).unwrap();
    assert_eq!(first, second);
    assert_eq!(test_case.number_of_cached_entries().await, 1);

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn stale_cache_entry_is_refetched() {
    let app_settings = load_app_settings_for_testing();
    let ttl = app_settings.cache.ttl_seconds;
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;
    let stale = PostalRecord {
        code: String::from("01001-000"),
        street: String::from("Rua Antiga"),
        ..Default::default()
    };
    let updated_at = OffsetDateTime::now_utc() - Duration::seconds(ttl) - Duration::hours(1);
    test_case
        .insert_cached_entry(&CacheEntry {
            key: PostalCode::new("01001000").unwrap(),
            payload: serde_json::to_string(&stale).unwrap(),
            updated_at,
        })
        .await;
    provider_responds(
        "01001000",
        ResponseTemplate::new(200).set_body_string(PROVIDER_BODY),
        1,
    )
    .mount(&test_case.provider)
    .await;

    let response = test_case.cep("01001000").await;
    let ResponseParts {
        status_code, body, ..
    } = split_response(response).await;
    assert_eq!(status_code, StatusCode::OK);
    let record = serde_json::from_str::<PostalRecord>(&body).unwrap();
    assert_eq!(record.street, "Praça da Sé");
    let entry = test_case.cached_entry("01001000").await.unwrap();
    assert!(entry.updated_at > updated_at);
    assert_eq!(test_case.number_of_cached_entries().await, 1);

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn invalid_postal_code_is_rejected_without_calling_provider() {
    let app_settings = load_app_settings_for_testing();
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROVIDER_BODY))
        .expect(0)
        .mount(&test_case.provider)
        .await;

    let response = test_case.cep("12-345").await;
    let ResponseParts {
        status_code, body, ..
    } = split_response(response).await;
    assert_eq!(status_code, StatusCode::BAD_REQUEST);
    let body = serde_json::from_str::<serde_json::Value>(&body).unwrap();
    assert!(body["messages"][0].as_str().unwrap().contains("8 digits"));

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn unknown_postal_code_returns_not_found() {
    let app_settings = load_app_settings_for_testing();
    let test_case = TestCase::begin(app_settings, EnableTracing::No).await;
    provider_responds(
        "00000000",
        ResponseTemplate::new(200).set_body_string(r#"{"erro": true}"#),
        1,
    )
    .mount(&test_case.provider)
    .await;

    let response = test_case.cep("00000000").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(test_case.cached_entry("00000000").await.is_none());

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn provider_failure_returns_internal_server_error() {
    let app_settings = load_app_settings_for_testing();
    let test_case = TestCase::begin(app_settings, EnableTracing::Yes).await;
    provider_responds("76543210", ResponseTemplate::new(503), 1)
        .mount(&test_case.provider)
        .await;

    let response = test_case.cep("76543-210").await;
    let ResponseParts {
        status_code, body, ..
    } = split_response(response).await;
    assert_eq!(status_code, StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::from_str::<serde_json::Value>(&body).unwrap();
    assert_eq!(body["messages"][0], "Failed to query the CEP");

    test_case.end().await;
}
