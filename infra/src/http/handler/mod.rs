pub mod cep;

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use time::Duration;
use tokio::time::Instant;

use domain::{DomainError, DomainResult};
use use_case::postal_code::PostalCodeUseCase;

use crate::{
    AppState, http_client::ReqwestHttpClient, postgres::repositories::PgPostalRecordCache,
};

/// ヘルスチェックレスポンスボディ
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponseBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// ヘルスチェックハンドラ
///
/// データベースとの接続のみを確認する。
#[tracing::instrument(skip(app_state))]
pub async fn health_check(
    State(app_state): State<AppState>,
) -> (StatusCode, Json<HealthResponseBody>) {
    let use_case = postal_code_use_case(&app_state);
    let result = match deadline_after(app_state.app_settings.deadline.health_check_seconds) {
        Ok(deadline) => use_case.ping(deadline).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponseBody {
                status: "ok",
                detail: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponseBody {
                    status: "error",
                    detail: Some(e.to_string()),
                }),
            )
        }
    }
}

/// 現在から指定した秒数後の期限を返す。
///
/// 期限を表現できない秒数の場合はエラーを返す。
fn deadline_after(seconds: u64) -> DomainResult<Instant> {
    Instant::now()
        .checked_add(std::time::Duration::from_secs(seconds))
        .ok_or_else(|| {
            DomainError::Unexpected(format!("deadline of {} seconds is out of range", seconds).into())
        })
}

type PostalCodeUseCaseImpl = PostalCodeUseCase<PgPostalRecordCache, ReqwestHttpClient>;

fn postal_code_use_case(app_state: &AppState) -> PostalCodeUseCaseImpl {
    let settings = &app_state.app_settings;
    let cache = PgPostalRecordCache::new(app_state.pg_pool.clone());
    let http_client = ReqwestHttpClient::new(app_state.http_client.clone());
    PostalCodeUseCase::new(
        cache,
        http_client,
        settings.provider.base_url.clone(),
        Duration::seconds(settings.cache.ttl_seconds),
        app_state.clock.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_is_set_after_the_given_seconds() {
        let before = Instant::now();
        let deadline = deadline_after(10).unwrap();
        assert!(deadline >= before + std::time::Duration::from_secs(10));
    }

    #[test]
    fn out_of_range_deadline_is_an_error() {
        assert!(matches!(
            deadline_after(u64::MAX),
            Err(DomainError::Unexpected(_))
        ));
    }
}
