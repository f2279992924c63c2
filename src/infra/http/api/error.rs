use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eesa_api_types::{ApiErrorBody, ApiErrorMessage};

use crate::application::error::ErrorReport;
use crate::application::snapshot::SnapshotError;

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const INVALID_FILTER: &str = "invalid_filter";
    pub const STORE_UNAVAILABLE: &str = "store_unavailable";
    pub const TIMEOUT: &str = "timeout";
}

const SOURCE: &str = "infra::http::api";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    field: Option<&'static str>,
    hint: Option<String>,
    report: ErrorReport,
}

impl ApiError {
    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        let report = ErrorReport::from_message(
            SOURCE,
            StatusCode::BAD_REQUEST,
            format!("{}: {}", codes::BAD_REQUEST, hint.as_deref().unwrap_or(message)),
        );
        Self {
            status: StatusCode::BAD_REQUEST,
            code: codes::BAD_REQUEST,
            message,
            field: None,
            hint,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<SnapshotError> for ApiError {
    fn from(err: SnapshotError) -> Self {
        let (status, code, message, field, hint) = match &err {
            SnapshotError::Validation(validation) => (
                StatusCode::BAD_REQUEST,
                codes::INVALID_FILTER,
                "Invalid filter value",
                Some(validation.field),
                Some(validation.message.clone()),
            ),
            SnapshotError::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                codes::STORE_UNAVAILABLE,
                "Catalog temporarily unavailable",
                None,
                Some("Retry the request shortly".to_string()),
            ),
            SnapshotError::Timeout { .. } => (
                StatusCode::GATEWAY_TIMEOUT,
                codes::TIMEOUT,
                "Catalog snapshot timed out",
                None,
                None,
            ),
        };
        Self {
            status,
            code,
            message,
            field,
            hint,
            report: ErrorReport::from_error(SOURCE, status, &err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                field: self.field.map(str::to_string),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}
