use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::{is_constraint_violation, ApiError},
    state::AppState,
    validate,
    watchlist::{
        dto::{
            CreatedResponse, DeletedResponse, EntryItem, EntryPayload, ListResponse, Pagination,
            ReviewPayload, ReviewedResponse, Status, UpdatedResponse,
        },
        repo::Entry,
    },
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/watchlist", get(list_entries))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/watchlist", post(add_entry))
        .route("/watchlist/:id", put(update_entry).delete(remove_entry))
        .route("/watchlist/:id/review", put(update_review))
}

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<ListResponse>, ApiError> {
    let (page, limit, offset) = p.clamp();
    let entries = Entry::list_by_owner(&state.db, user_id, limit, offset).await?;
    Ok(Json(ListResponse {
        ok: true,
        items: entries.into_iter().map(EntryItem::from).collect(),
        page,
        limit,
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<EntryPayload>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let fields = payload.validate()?;
    let id = Entry::insert(&state.db, user_id, &fields).await?;
    info!(user_id, entry_id = id, "watchlist entry added");
    Ok(Json(CreatedResponse { ok: true, id }))
}

#[instrument(skip(state, payload))]
pub async fn update_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(raw_id): Path<String>,
    Json(payload): Json<EntryPayload>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let id = validate::parse_positive_id(&raw_id);
    if id == 0 {
        return Err(ApiError::NotFound);
    }
    let fields = payload.validate()?;

    // A missing row and a foreign row answer the same way.
    let Some(entry) = Entry::update_owned(&state.db, user_id, id, &fields).await? else {
        return Err(ApiError::NotFound);
    };
    Ok(Json(UpdatedResponse {
        ok: true,
        id,
        item: entry.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(raw_id): Path<String>,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<ReviewedResponse>, ApiError> {
    let id = validate::parse_positive_id(&raw_id);
    if id == 0 {
        return Err(ApiError::NotFound);
    }
    let fields = payload.validate()?;

    let Some(status) = Entry::status_of_owned(&state.db, user_id, id).await? else {
        return Err(ApiError::NotFound);
    };
    if Status::parse(&status) != Some(Status::Completed) {
        return Err(ApiError::Conflict(
            "Only completed movies can be reviewed".into(),
        ));
    }

    Entry::set_review(&state.db, user_id, id, fields.review.as_deref(), fields.rating).await?;
    info!(user_id, entry_id = id, "review updated");
    Ok(Json(ReviewedResponse { ok: true, id }))
}

#[instrument(skip(state))]
pub async fn remove_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = validate::parse_positive_id(&raw_id);
    if id == 0 {
        return Err(ApiError::NotFound);
    }

    let affected = Entry::delete_owned(&state.db, user_id, id)
        .await
        .map_err(|e| {
            if is_constraint_violation(&e) {
                ApiError::Conflict("Delete conflicts with related data".into())
            } else {
                ApiError::from(e)
            }
        })?;
    if affected == 0 {
        return Err(ApiError::NotFound);
    }
    info!(user_id, entry_id = id, "watchlist entry removed");
    Ok(Json(DeletedResponse { ok: true }))
}
