use std::{thread::JoinHandle, time::Duration};

use settings::AppSettings;
use tokio::sync::oneshot;
use wiremock::MockServer;

use domain::{
    models::{CacheEntry, PostalCode},
    repositories::PostalRecordCache as _,
};
use infra::{AppState, postgres::repositories::PgPostalRecordCache};
use use_case::system_clock;

use crate::helpers::{TestApp, configure_test_app, enable_tracing, spawn_app};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableTracing {
    Yes,
    No,
}

/// Test case for integration tests
///
/// ```
/// #[tokio::test]
/// #[ignore]
/// async fn integration_test_case_skeleton() {
///     // Initialize the test case
///     let app_settings = load_app_settings_for_testing();
///     let test_case = TestCase::begin(app_settings, EnableTracing::No).await;
///
///     /************************************************************
///
///             Implement integration test logic here
///
///     *************************************************************/
///
///     // Terminate the test case gracefully
///     test_case.end().await;
/// }
/// ```
pub struct TestCase {
    pub app_state: AppState,
    /// Mock server standing in for the directory provider
    pub provider: MockServer,
    app_handle: JoinHandle<()>,
    shutdown_signal: oneshot::Sender<()>,
    pub http_client: reqwest::Client,
}

impl TestCase {
    pub async fn begin(app_settings: AppSettings, tracing: EnableTracing) -> Self {
        if tracing == EnableTracing::Yes {
            enable_tracing();
        }
        let provider = MockServer::start().await;
        let provider_url = format!("{}/ws", provider.uri());
        let app = configure_test_app(app_settings, provider_url).await;
        let TestApp {
            app_settings,
            listener,
            pg_pool,
            http_client,
        } = app;
        let app_state = AppState {
            app_settings,
            pg_pool,
            http_client,
            clock: system_clock(),
        };
        let (app_handle, shutdown_signal) = spawn_app(app_state.clone(), listener).await;
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap();
        Self {
            app_state,
            provider,
            app_handle,
            shutdown_signal,
            http_client,
        }
    }

    pub async fn end(self) {
        self.shutdown_signal.send(()).unwrap();
        self.app_handle.join().unwrap();
        // Verify the expectations mounted on the directory provider
        self.provider.verify().await;
    }

    pub fn origin(&self) -> String {
        format!(
            "{}://{}:{}",
            self.app_state.app_settings.http.protocol,
            self.app_state.app_settings.http.host,
            self.app_state.app_settings.http.port,
        )
    }

    fn cache(&self) -> PgPostalRecordCache {
        PgPostalRecordCache::new(self.app_state.pg_pool.clone())
    }

    pub async fn cached_entry(&self, code: &str) -> Option<CacheEntry> {
        let key = PostalCode::new(code).unwrap();
        self.cache().read(&key).await.unwrap()
    }

    pub async fn insert_cached_entry(&self, entry: &CacheEntry) {
        self.cache().upsert(entry).await.unwrap();
    }

    pub async fn number_of_cached_entries(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ceps")
            .fetch_one(&self.app_state.pg_pool)
            .await
            .unwrap()
    }

    pub async fn health_check(&self) -> reqwest::Response {
        let uri = format!("{}/healthz", self.origin());
        self.http_client.get(&uri).send().await.unwrap()
    }

    pub async fn cep(&self, code: &str) -> reqwest::Response {
        let uri = format!("{}/cep/{}", self.origin(), code);
        self.http_client.get(&uri).send().await.unwrap()
    }
}
