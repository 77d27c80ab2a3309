//! Bearer token authentication for the protected routes.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::{trace, warn};

use crate::error::ApiError;
use crate::services::auth::AuthService;

/// The user a request was authenticated as.
///
/// Put into request extensions by [`auth_middleware`] and pulled out again
/// as an extractor in handlers.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub i32);

impl AuthenticatedUser {
    pub fn user_id(&self) -> i32 {
        self.0
    }
}

pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    trace!("Authenticating request");

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let user_id = auth_service.verify_access_token(token).map_err(|e| {
        warn!("Token verification failed: {}", e);
        e
    })?;

    request.extensions_mut().insert(AuthenticatedUser(user_id));
    Ok(next.run(request).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
    }
}
