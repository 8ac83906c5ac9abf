use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, OkResponse, Profile, RegisterRequest, Role, UsersResponse,
        },
        extractors::AdminUser,
        password,
        repo::User,
    },
    error::{is_unique_violation, ApiError},
    session::SessionManager,
    state::AppState,
    validate,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/users", get(list_users))
}

#[instrument(skip(state, sessions, payload))]
pub async fn register(
    State(state): State<AppState>,
    sessions: SessionManager,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let fields = payload.validate()?;
    let password_hash = password::hash_password(&fields.password)?;
    let new_user = fields.into_new_user(password_hash);

    let user = User::create(&state.db, &new_user).await.map_err(|e| {
        if is_unique_violation(&e) {
            warn!(email = %new_user.email, "email already registered");
            ApiError::DuplicateEmail
        } else {
            ApiError::from(e)
        }
    })?;

    sessions.start(user.id, Role::parse(&user.role)).await?;
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        ok: true,
        user: Profile::from_user(user),
    }))
}

#[instrument(skip(state, sessions, payload))]
pub async fn login(
    State(state): State<AppState>,
    sessions: SessionManager,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = validate::normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::InvalidCredentials);
    }

    // Unknown email and wrong password fail identically.
    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::InvalidCredentials);
    };
    if !password::verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    sessions.start(user.id, Role::parse(&user.role)).await?;
    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        ok: true,
        user: Profile::from_user(user),
    }))
}

#[instrument(skip(sessions))]
pub async fn logout(sessions: SessionManager) -> Result<Json<OkResponse>, ApiError> {
    sessions.end().await?;
    Ok(Json(OkResponse { ok: true }))
}

#[instrument(skip(state, sessions))]
pub async fn me(
    State(state): State<AppState>,
    sessions: SessionManager,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = profile_for(&state.db, &sessions, None)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(AuthResponse { ok: true, user }))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = User::list_all(&state.db).await?;
    Ok(Json(UsersResponse {
        ok: true,
        users: users.into_iter().map(Profile::from_user).collect(),
    }))
}

/// Loads the profile for the given id, falling back to the session's bound
/// user. Returns None when no id resolves or the row no longer exists. On
/// success the session's cached role is refreshed to the stored value.
pub async fn profile_for(
    db: &PgPool,
    sessions: &SessionManager,
    user_id: Option<i64>,
) -> Result<Option<Profile>, ApiError> {
    let user_id = match user_id.filter(|id| *id > 0) {
        Some(id) => id,
        None => match sessions.current_user_id().await? {
            Some(id) => id,
            None => return Ok(None),
        },
    };

    let Some(user) = User::find_by_id(db, user_id).await? else {
        return Ok(None);
    };
    sessions.refresh_role(Role::parse(&user.role)).await?;
    Ok(Some(Profile::from_user(user)))
}
