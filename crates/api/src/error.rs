//! JSON error envelope for API responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use guardbook_core::LedgerError;
use guardbook_shared::AppError;

/// Error returned by every handler.
///
/// Renders as `{"error": CODE, "message": ..., "field"?: ..., "rule"?: ...}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err.into())
    }
}

fn malformed(field: &str, rule: &str, message: String) -> ApiError {
    ApiError(AppError::Validation {
        field: field.to_string(),
        rule: rule.to_string(),
        message,
    })
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        malformed("body", "malformed_body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        malformed("query", "malformed_query", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        malformed("path", "malformed_path", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(self.0.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardbook_core::ledger::ValidationRule;
    use guardbook_core::StoreError;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use serde_json::Value;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_names_field_and_rule() {
        let (status, body) = render(LedgerError::from(ValidationRule::AmountPositive).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert_eq!(body["field"], "amount");
    }

    #[tokio::test]
    async fn test_store_failure_hides_detail() {
        let err = LedgerError::Store(StoreError::Backend("pool timed out".into()));
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[rstest]
    #[case(LedgerError::NoOp, StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(LedgerError::Conflict("invoice cancelled".into()), StatusCode::CONFLICT)]
    #[case(LedgerError::UnknownRole("janitor".into()), StatusCode::FORBIDDEN)]
    #[case(LedgerError::entry_not_found(uuid::Uuid::now_v7()), StatusCode::NOT_FOUND)]
    #[tokio::test]
    async fn test_status_follows_ledger_error(#[case] err: LedgerError, #[case] expected: StatusCode) {
        let wanted = err.http_status_code();
        let (status, _) = render(err.into()).await;
        assert_eq!(status, expected);
        assert_eq!(status.as_u16(), wanted);
    }
}
