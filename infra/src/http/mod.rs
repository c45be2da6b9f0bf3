pub mod handler;

use std::borrow::Cow;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use domain::DomainError;

/// API結果
pub type ApiResult<T> = Result<T, ApiError>;

/// APIエラー
#[derive(Debug)]
pub struct ApiError {
    /// HTTPステータスコード
    pub status_code: StatusCode,
    /// エラーメッセージ
    pub messages: Vec<Cow<'static, str>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "messages": self.messages,
        });
        (self.status_code, Json(body)).into_response()
    }
}

const LOOKUP_FAILED_MESSAGE: &str = "Failed to query the CEP";

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::InvalidKey(message) => Self {
                status_code: StatusCode::BAD_REQUEST,
                messages: vec![message],
            },
            DomainError::NotFound(_) => Self {
                status_code: StatusCode::NOT_FOUND,
                messages: vec![error.to_string().into()],
            },
            DomainError::Timeout(message) => Self {
                status_code: StatusCode::GATEWAY_TIMEOUT,
                messages: vec![message],
            },
            // 内部のエラーはログに記録して、クライアントには詳細を返さない
            _ => {
                tracing::error!(error = %error, "failed to query the CEP");
                Self {
                    status_code: StatusCode::INTERNAL_SERVER_ERROR,
                    messages: vec![LOOKUP_FAILED_MESSAGE.into()],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case(DomainError::InvalidKey("invalid".into()), StatusCode::BAD_REQUEST)]
    #[case(DomainError::NotFound("CEP 00000000".into()), StatusCode::NOT_FOUND)]
    #[case(DomainError::Timeout("deadline".into()), StatusCode::GATEWAY_TIMEOUT)]
    #[case(DomainError::CacheRead("broken".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(
        DomainError::Upstream { status: 503, message: "unexpected status".into() },
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    #[case(DomainError::Transport("refused".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(DomainError::Repository("broken".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(DomainError::Unexpected("oops".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn domain_error_is_mapped_to_status_code(
        #[case] error: DomainError,
        #[case] expected: StatusCode,
    ) {
        let api_error = ApiError::from(error);
        assert_eq!(api_error.status_code, expected);
    }

    #[test]
    fn internal_error_details_are_not_exposed() {
        let api_error = ApiError::from(DomainError::CacheRead("password=secret".into()));
        assert_eq!(api_error.messages, vec![LOOKUP_FAILED_MESSAGE]);
    }

    #[test]
    fn not_found_message_names_the_postal_code() {
        let api_error = ApiError::from(DomainError::NotFound("CEP 00000000".into()));
        assert_eq!(api_error.messages, vec!["CEP 00000000 is not found"]);
    }
}
