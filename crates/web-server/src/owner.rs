use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

pub const OWNER_HEADER: &str = "x-owner-id";

/// The authenticated owner, as set by the gateway in the `x-owner-id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized(format!("{OWNER_HEADER} header is required")))?;

        raw.trim()
            .parse::<Uuid>()
            .map(Owner)
            .map_err(|_| AppError::Unauthorized(format!("{OWNER_HEADER} is not a valid id")))
    }
}
