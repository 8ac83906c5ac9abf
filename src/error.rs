use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

/// Field-keyed validation messages, collected before any of them is reported.
#[derive(Debug, Default, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ok when nothing was collected, otherwise the full set as one error.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }

    #[cfg(test)]
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.keys().copied().collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Please fix the highlighted fields.")]
    Validation(FieldErrors),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Forbidden")]
    Forbidden,
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Storage failure")]
    Storage(#[from] sqlx::Error),
    #[error("Session failure")]
    Session(#[from] tower_sessions::session::Error),
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::DuplicateEmail => StatusCode::CONFLICT,
            ApiError::Storage(_) | ApiError::Session(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => {
                json!({ "ok": false, "error": self.to_string(), "errors": errors })
            }
            // Infrastructure detail stays in the server log; the client only
            // sees the generic message.
            ApiError::Storage(e) => {
                error!(error = %e, "storage failure");
                json!({ "ok": false, "error": self.to_string() })
            }
            ApiError::Session(e) => {
                error!(error = %e, "session backing failure");
                json!({ "ok": false, "error": self.to_string() })
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                json!({ "ok": false, "error": self.to_string() })
            }
            _ => json!({ "ok": false, "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// True for unique/foreign-key/check violations, which map to Conflict
/// instead of a generic storage failure.
pub fn is_constraint_violation(err: &sqlx::Error) -> bool {
    err.as_database_error().is_some_and(|db| {
        db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation()
    })
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_contract() {
        let mut errors = FieldErrors::new();
        errors.push("title", "Title must be 2–120 characters.");
        assert_eq!(ApiError::Validation(errors).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("busy".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Storage(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_body_carries_field_errors() {
        let mut errors = FieldErrors::new();
        errors.push("rating", "Rating must be between 0 and 5.");
        errors.push("title", "Title must be 2–120 characters.");
        let err = ApiError::Validation(errors);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn field_errors_serialize_as_map() {
        let mut errors = FieldErrors::new();
        errors.push("title", "Title must be 2–120 characters.");
        errors.push("status", "Invalid status.");
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value["title"], "Title must be 2–120 characters.");
        assert_eq!(value["status"], "Invalid status.");
    }

    #[test]
    fn credential_failures_share_one_shape() {
        // Unknown email and wrong password must be indistinguishable.
        let a = ApiError::InvalidCredentials.to_string();
        let b = ApiError::InvalidCredentials.to_string();
        assert_eq!(a, b);
        assert_eq!(a, "Invalid credentials");
    }
}
