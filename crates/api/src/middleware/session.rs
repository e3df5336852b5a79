//! Transfer session extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use palette_core::transfer::validate_session_id;

use crate::error::AppError;

/// Header naming the client session whose transfer slot a request uses.
pub const SESSION_HEADER: &str = "x-session-id";

/// Session identifier from the `X-Session-Id` header.
///
/// A missing header selects the shared default slot.
///
/// ```ignore
/// async fn handler(session: SessionId) -> AppResult<Json<()>> {
///     tracing::info!(session = %session.0, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(SESSION_HEADER) else {
            return Ok(Self::default());
        };

        let session = value
            .to_str()
            .map_err(|_| AppError::BadRequest("X-Session-Id must be ASCII".into()))?
            .trim();
        validate_session_id(session)?;

        Ok(Self(session.to_string()))
    }
}
