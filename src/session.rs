use crate::errors::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const USER_HEADER: &str = "x-user-id";

/// Identity of the caller, as asserted by the authentication layer in front
/// of this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_HEADER)
            .ok_or_else(|| AppError::unauthorized("missing user identity"))?;
        let user = value
            .to_str()
            .map_err(|_| AppError::unauthorized("user identity is not valid text"))?
            .trim();
        if user.is_empty() {
            return Err(AppError::unauthorized("missing user identity"));
        }
        Ok(CurrentUser(user.to_string()))
    }
}
