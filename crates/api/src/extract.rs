//! Request extractors.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON body extractor whose rejections use the API error envelope.
///
/// Drop-in for [`axum::Json`] on the request side:
///
/// ```ignore
/// async fn handler(AppJson(input): AppJson<MyRequest>) -> AppResult<Json<()>> { ... }
/// ```
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
