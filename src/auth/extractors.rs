use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{error::ApiError, session::SessionManager, state::AppState};

/// Resolves the authenticated user id from the session, rejecting with
/// Unauthorized before the handler body runs.
#[derive(Debug)]
pub struct AuthUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let sessions = SessionManager::from_request_parts(parts, state).await?;
        Ok(AuthUser(sessions.require_auth().await?))
    }
}

/// Like [`AuthUser`], but additionally requires the admin role.
#[derive(Debug)]
pub struct AdminUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let sessions = SessionManager::from_request_parts(parts, state).await?;
        Ok(AdminUser(sessions.require_admin().await?))
    }
}
