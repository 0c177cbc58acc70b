//! JSON extractor whose rejection is an `ApiError`, so malformed bodies get the
//! same `{detail}` shape and a `RequestValidationError` failure kind.

use axum::extract::FromRequest;

use super::error::ApiError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);
