use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::SessionPayload;

/// Handler で SessionPayload を受け取るための extractor
///
/// The guard layer stores the session in request extensions. A route that
/// was mounted without a guard has none, which answers 401.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionPayload);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionPayload>()
            .cloned()
            .map(CurrentSession)
            .ok_or(AppError::Unauthorized)
    }
}
