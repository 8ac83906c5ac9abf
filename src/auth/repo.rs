use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: OffsetDateTime,
}

/// Insert payload for a registration. Role always starts as 'user'.
#[derive(Debug)]
pub struct NewUser {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub email: String,
    pub password_hash: String,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, middle_name, last_name, suffix, email,
                   password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, middle_name, last_name, suffix, email,
                   password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Inserts a new user. The unique email constraint surfaces through the
    /// returned error; callers map it to DuplicateEmail.
    pub async fn create(db: &PgPool, new: &NewUser) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, middle_name, last_name, suffix, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6, 'user')
            RETURNING id, first_name, middle_name, last_name, suffix, email,
                      password_hash, role, created_at
            "#,
        )
        .bind(&new.first_name)
        .bind(&new.middle_name)
        .bind(&new.last_name)
        .bind(&new.suffix)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(db)
        .await
    }

    pub async fn list_all(db: &PgPool) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, middle_name, last_name, suffix, email,
                   password_hash, role, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await
    }
}
