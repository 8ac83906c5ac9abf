use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::watchlist::dto::NewEntry;

/// Watchlist entry row. Every query below carries the owner predicate, so a
/// row can never leak across users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub rating: i32,
    pub poster_url: Option<String>,
    pub review: Option<String>,
    pub created_at: OffsetDateTime,
}

impl Entry {
    pub async fn list_by_owner(
        db: &PgPool,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> sqlx::Result<Vec<Entry>> {
        sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, user_id, title, description, status, rating, poster_url, review, created_at
            FROM watchlist
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn insert(db: &PgPool, user_id: i64, new: &NewEntry) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO watchlist (user_id, title, description, status, rating, poster_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.status.as_str())
        .bind(new.rating)
        .bind(&new.poster_url)
        .fetch_one(db)
        .await
    }

    /// Conditional write on (id, owner). None means the row does not exist
    /// or belongs to someone else; callers cannot tell which.
    pub async fn update_owned(
        db: &PgPool,
        user_id: i64,
        id: i64,
        new: &NewEntry,
    ) -> sqlx::Result<Option<Entry>> {
        sqlx::query_as::<_, Entry>(
            r#"
            UPDATE watchlist
            SET title = $1, description = $2, status = $3, rating = $4, poster_url = $5
            WHERE id = $6 AND user_id = $7
            RETURNING id, user_id, title, description, status, rating, poster_url, review, created_at
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.status.as_str())
        .bind(new.rating)
        .bind(&new.poster_url)
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    pub async fn status_of_owned(
        db: &PgPool,
        user_id: i64,
        id: i64,
    ) -> sqlx::Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT status
            FROM watchlist
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    pub async fn set_review(
        db: &PgPool,
        user_id: i64,
        id: i64,
        review: Option<&str>,
        rating: i32,
    ) -> sqlx::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE watchlist
            SET review = $1, rating = $2
            WHERE id = $3 AND user_id = $4
            "#,
        )
        .bind(review)
        .bind(rating)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_owned(db: &PgPool, user_id: i64, id: i64) -> sqlx::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM watchlist
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}
