//! `AgonError` -> HTTP response mapping.
//!
//! Error responses use a `{"detail": "..."}` body and carry a `FailureKind`
//! extension so the instrumentation layer can label `agon_errors_total`.

use std::any::Any;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use agon_core::error::{AgonError, ClientCode};

use crate::obs::middleware::FailureKind;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: AgonError,
}

fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::BadRequest => StatusCode::BAD_REQUEST,
        ClientCode::Misconfigured | ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        ClientCode::Upstream => StatusCode::BAD_GATEWAY,
    }
}

impl From<AgonError> for ApiError {
    fn from(error: AgonError) -> Self {
        Self { status: status_for(error.client_code()), error }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Keep the framework's status (400 syntax, 415 content type, 422 shape).
        Self {
            status: rejection.status(),
            error: AgonError::BadRequest(rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.error.to_string() }));
        let mut resp = (self.status, body).into_response();
        resp.extensions_mut().insert(FailureKind(self.error.kind()));
        resp
    }
}

/// Response for a handler that panicked; installed via `CatchPanicLayer`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let msg = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %msg, "request handler panicked");

    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        error: AgonError::Internal("request handler panicked".into()),
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_maps_to_500_with_kind() {
        let resp = ApiError::from(AgonError::Configuration("missing key".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            resp.extensions().get::<FailureKind>(),
            Some(&FailureKind("ConfigurationError"))
        );
    }

    #[test]
    fn panic_maps_to_internal_error() {
        let resp = panic_response(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.extensions().get::<FailureKind>(), Some(&FailureKind("InternalError")));
    }
}
