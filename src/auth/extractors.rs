use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::jwt::{JwtKeys, TokenError},
    error::AppError,
};

/// Identity of the caller, resolved from a verified bearer token.
/// Task services take it by value; there is no other way to name an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

/// Resolves a raw `Authorization` value. A leading `Bearer ` is stripped if present.
pub fn resolve_bearer(keys: &JwtKeys, header: &str) -> Result<AuthUser, TokenError> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header);
    let claims = keys.verify(token)?;
    Ok(AuthUser(claims.sub))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by `require_auth`
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                debug!("missing Authorization header");
                AppError::Unauthorized("authorization header required")
            })?;

        let keys = JwtKeys::from_ref(state);
        Ok(resolve_bearer(&keys, header)?)
    }
}

/// Layer for protected routers: rejects with 401 before any handler runs,
/// otherwise stores the [`AuthUser`] in the request extensions.
pub async fn require_auth(user: AuthUser, mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(user);
    next.run(req).await
}
