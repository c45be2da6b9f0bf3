use axum::{
    Json,
    extract::{Path, State},
};
use domain::models::PostalRecord;

use crate::{
    AppState,
    http::{ApiError, ApiResult},
};

use super::{deadline_after, postal_code_use_case};

/// 郵便番号検索ハンドラ
#[tracing::instrument(skip(app_state))]
pub async fn by_code(
    State(app_state): State<AppState>,
    Path(cep): Path<String>,
) -> ApiResult<Json<PostalRecord>> {
    let deadline = deadline_after(app_state.app_settings.deadline.lookup_seconds)?;
    let use_case = postal_code_use_case(&app_state);
    let record = use_case.get(&cep, deadline).await.map_err(ApiError::from)?;
    Ok(Json(record))
}
