use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tower_sessions::{
    cookie::{time::Duration, SameSite},
    Expiry, Session, SessionManagerLayer,
};
use tower_sessions_sqlx_store::PostgresStore;

use crate::{auth::dto::Role, config::SessionConfig, error::ApiError, state::AppState};

const USER_ID_KEY: &str = "uid";
const ROLE_KEY: &str = "role";

/// Binds the transport-level cookie session to a (user id, role) pair.
/// Constructed per request through the extractor below; the handle owns no
/// state of its own beyond the tower-sessions record.
#[derive(Clone)]
pub struct SessionManager {
    session: Session,
}

impl SessionManager {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Binds a freshly authenticated identity. The session id is cycled
    /// first so a pre-planted token never survives a credential check.
    pub async fn start(&self, user_id: i64, role: Role) -> Result<(), ApiError> {
        self.session.cycle_id().await?;
        self.session.insert(USER_ID_KEY, user_id).await?;
        self.session.insert(ROLE_KEY, role.as_str()).await?;
        Ok(())
    }

    pub async fn current_user_id(&self) -> Result<Option<i64>, ApiError> {
        let stored = self.session.get::<i64>(USER_ID_KEY).await?;
        Ok(stored.filter(|id| *id > 0))
    }

    /// Stored role, defaulting to `user` for sessions that predate the role
    /// field or carry an unknown value.
    pub async fn current_role(&self) -> Result<Role, ApiError> {
        let stored = self.session.get::<String>(ROLE_KEY).await?;
        Ok(stored.as_deref().map(Role::parse).unwrap_or(Role::User))
    }

    pub async fn refresh_role(&self, role: Role) -> Result<(), ApiError> {
        self.session.insert(ROLE_KEY, role.as_str()).await?;
        Ok(())
    }

    /// Expires the cookie immediately and drops the server-side record.
    /// Safe to call with no active session.
    pub async fn end(&self) -> Result<(), ApiError> {
        self.session.flush().await?;
        Ok(())
    }

    pub async fn require_auth(&self) -> Result<i64, ApiError> {
        self.current_user_id().await?.ok_or(ApiError::Unauthorized)
    }

    pub async fn require_admin(&self) -> Result<i64, ApiError> {
        let user_id = self.require_auth().await?;
        if self.current_role().await? != Role::Admin {
            return Err(ApiError::Forbidden);
        }
        Ok(user_id)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionManager {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::Internal(anyhow::anyhow!(msg)))?;
        Ok(SessionManager::new(session))
    }
}

pub fn session_layer(
    config: &SessionConfig,
    store: PostgresStore,
) -> SessionManagerLayer<PostgresStore> {
    let expiry = if config.lifetime_minutes > 0 {
        Expiry::OnInactivity(Duration::minutes(config.lifetime_minutes))
    } else {
        Expiry::OnSessionEnd
    };
    SessionManagerLayer::new(store)
        .with_name(config.cookie_name.clone())
        .with_secure(config.secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(expiry)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn manager() -> SessionManager {
        let store = Arc::new(MemoryStore::default());
        SessionManager::new(Session::new(None, store, None))
    }

    #[tokio::test]
    async fn start_binds_identity_and_role() {
        let m = manager();
        m.start(7, Role::User).await.unwrap();
        assert_eq!(m.current_user_id().await.unwrap(), Some(7));
        assert_eq!(m.current_role().await.unwrap(), Role::User);
    }

    #[tokio::test]
    async fn empty_session_has_no_identity() {
        let m = manager();
        assert_eq!(m.current_user_id().await.unwrap(), None);
        assert!(matches!(m.require_auth().await, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn role_defaults_to_user_when_absent() {
        let m = manager();
        assert_eq!(m.current_role().await.unwrap(), Role::User);
    }

    #[tokio::test]
    async fn require_admin_needs_session_before_role() {
        let m = manager();
        assert!(matches!(m.require_admin().await, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn require_admin_rejects_plain_user() {
        let m = manager();
        m.start(7, Role::User).await.unwrap();
        assert!(matches!(m.require_admin().await, Err(ApiError::Forbidden)));
    }

    #[tokio::test]
    async fn require_admin_accepts_admin() {
        let m = manager();
        m.start(3, Role::Admin).await.unwrap();
        assert_eq!(m.require_admin().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn end_clears_identity_and_is_idempotent() {
        let m = manager();
        m.start(9, Role::User).await.unwrap();
        m.end().await.unwrap();
        assert_eq!(m.current_user_id().await.unwrap(), None);
        m.end().await.unwrap();
    }

    #[tokio::test]
    async fn refresh_role_overwrites_cached_value() {
        let m = manager();
        m.start(4, Role::User).await.unwrap();
        m.refresh_role(Role::Admin).await.unwrap();
        assert_eq!(m.current_role().await.unwrap(), Role::Admin);
    }
}
