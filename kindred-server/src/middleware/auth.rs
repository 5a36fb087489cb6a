use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::IntoResponse,
};
use chrono::Utc;
use kindred_core::AuthUser;

use crate::{error::AppError, services::verify::verify_request, AppState};

/// Middleware to require authentication.
///
/// Runs the verification cascade over the request headers; on success the
/// resolved user is stored in request extensions for handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let user = verify_request(req.headers(), state.identity.as_ref(), Utc::now()).await?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Extractor to easily get the verified user in handlers.
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<AuthUser>().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "verified user missing from request extensions"
            ))
        })?;

        Ok(CurrentUser(user.clone()))
    }
}
