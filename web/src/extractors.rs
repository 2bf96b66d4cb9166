//! Custom Axum extractors.

use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};

/// GitHub token from the `Authorization: Bearer …` header.
///
/// Rejects with 401 `UNAUTHENTICATED` when the header is missing, malformed,
/// or carries an empty token. The token is held only for the life of the
/// request and never logged.
///
/// # Example
///
/// ```ignore
/// async fn handler(BearerToken(token): BearerToken) -> Result<Json<Response>, AppError> {
///     let repos = service.list_repositories(&token).await?;
///     Ok(Json(repos))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => Ok(Self(token.to_owned())),
            None => Err(AppError::unauthenticated(
                "A GitHub token is required in the Authorization header",
            )),
        }
    }
}
