/// Request extractors
///
/// axum's `Json`, `Path` and `Query` reject bad input with plain-text
/// responses. The wrappers here run the same extraction but reject through
/// [`ApiError`], so every malformed request gets the usual 400 error shape.

use crate::error::{ApiError, ApiResult};
use axum::extract::{FromRequest, FromRequestParts};

/// JSON request body with `ApiError` rejections
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters with `ApiError` rejections
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// Query string with `ApiError` rejections
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// Rejects text the database cannot store
///
/// Postgres text columns refuse NUL bytes.
pub fn ensure_storable(field: &str, value: &str) -> ApiResult<()> {
    if value.contains('\0') {
        return Err(ApiError::BadRequest(format!(
            "{} contains unsupported characters",
            field
        )));
    }

    Ok(())
}
