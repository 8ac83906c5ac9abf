use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    auth::repo::{NewUser, User},
    error::{ApiError, FieldErrors},
    validate::{none_if_blank, normalize_email, normalize_string, MAX_STRING},
};

const MAX_SUFFIX: usize = 20;
const MIN_PASSWORD: usize = 6;

/// Account role. Unknown stored values degrade to `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Role {
        match value {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Request body for registration. Missing fields deserialize as empty and
/// fall out in validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub suffix: String,
    pub email: String,
    pub password: String,
}

/// Normalized registration fields, produced only when every check passed.
#[derive(Debug)]
pub struct RegisterFields {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Normalizes every field and collects all violations before reporting.
    /// Nothing touches storage until this returns Ok.
    pub fn validate(&self) -> Result<RegisterFields, ApiError> {
        let first_name = normalize_string(&self.first_name, MAX_STRING);
        let middle_name = normalize_string(&self.middle_name, MAX_STRING);
        let last_name = normalize_string(&self.last_name, MAX_STRING);
        let suffix = normalize_string(&self.suffix, MAX_SUFFIX);
        let email = normalize_email(&self.email);

        let mut errors = FieldErrors::new();
        if first_name.is_empty() {
            errors.push("firstName", "First name is required.");
        }
        if last_name.is_empty() {
            errors.push("lastName", "Last name is required.");
        }
        if email.is_empty() {
            errors.push("email", "A valid email is required.");
        }
        if self.password.is_empty() {
            errors.push("password", "Password is required.");
        } else if self.password.chars().count() < MIN_PASSWORD {
            errors.push("password", "Password must be at least 6 characters.");
        }
        errors.into_result()?;

        Ok(RegisterFields {
            first_name,
            middle_name: none_if_blank(&middle_name),
            last_name,
            suffix: none_if_blank(&suffix),
            email,
            password: self.password.clone(),
        })
    }
}

impl RegisterFields {
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            first_name: self.first_name,
            middle_name: self.middle_name,
            last_name: self.last_name,
            suffix: self.suffix,
            email: self.email,
            password_hash,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public profile returned by register, login, me and the admin listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub email: String,
    pub role: &'static str,
    pub full_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Profile {
    pub fn from_user(user: User) -> Self {
        let full_name = compose_full_name(
            &user.first_name,
            user.middle_name.as_deref(),
            &user.last_name,
            user.suffix.as_deref(),
        );
        let role = Role::parse(&user.role).as_str();
        Self {
            id: user.id,
            first_name: user.first_name,
            middle_name: user.middle_name,
            last_name: user.last_name,
            suffix: user.suffix,
            email: user.email,
            role,
            full_name,
            created_at: user.created_at,
        }
    }
}

/// Joins first, optional middle and last name with single spaces, then
/// appends ", suffix" when present.
fn compose_full_name(
    first: &str,
    middle: Option<&str>,
    last: &str,
    suffix: Option<&str>,
) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in [Some(first), middle, Some(last)].into_iter().flatten() {
        if !part.is_empty() {
            parts.push(part);
        }
    }
    let mut name = parts.join(" ").trim().to_string();
    if let Some(suffix) = suffix {
        if !suffix.is_empty() {
            name = format!("{name}, {suffix}");
        }
    }
    name
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub ok: bool,
    pub user: Profile,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub ok: bool,
    pub users: Vec<Profile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterRequest {
        RegisterRequest {
            first_name: " Ana ".into(),
            middle_name: "".into(),
            last_name: "Cruz".into(),
            suffix: "".into(),
            email: "Ana@Example.COM".into(),
            password: "secret1".into(),
        }
    }

    #[test]
    fn full_name_without_middle_or_suffix() {
        assert_eq!(compose_full_name("Ana", None, "Cruz", None), "Ana Cruz");
        assert_eq!(compose_full_name("Ana", Some(""), "Cruz", Some("")), "Ana Cruz");
    }

    #[test]
    fn full_name_with_middle_and_suffix() {
        assert_eq!(
            compose_full_name("Ana", Some("B"), "Cruz", Some("Jr.")),
            "Ana B Cruz, Jr."
        );
    }

    #[test]
    fn validate_normalizes_fields() {
        let fields = valid_request().validate().unwrap();
        assert_eq!(fields.first_name, "Ana");
        assert_eq!(fields.middle_name, None);
        assert_eq!(fields.email, "ana@example.com");
    }

    #[test]
    fn validate_collects_all_missing_fields() {
        let request = RegisterRequest::default();
        let err = request.validate().unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert_eq!(
                    errors.fields(),
                    vec!["email", "firstName", "lastName", "password"]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_short_password() {
        let mut request = valid_request();
        request.password = "12345".into();
        let err = request.validate().unwrap_err();
        match err {
            ApiError::Validation(errors) => assert_eq!(errors.fields(), vec!["password"]),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_treats_whitespace_names_as_missing() {
        let mut request = valid_request();
        request.first_name = "   ".into();
        let err = request.validate().unwrap_err();
        match err {
            ApiError::Validation(errors) => assert_eq!(errors.fields(), vec!["firstName"]),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn register_request_accepts_camel_case_json() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"firstName":"Ana","lastName":"Cruz","email":"a@b.com","password":"secret1"}"#,
        )
        .unwrap();
        assert_eq!(request.first_name, "Ana");
        assert_eq!(request.middle_name, "");
        assert_eq!(request.last_name, "Cruz");
    }

    #[test]
    fn profile_serializes_camel_case() {
        let profile = Profile {
            id: 1,
            first_name: "Ana".into(),
            middle_name: Some("B".into()),
            last_name: "Cruz".into(),
            suffix: Some("Jr.".into()),
            email: "ana@example.com".into(),
            role: "user",
            full_name: "Ana B Cruz, Jr.".into(),
            created_at: time::macros::datetime!(2024-01-01 00:00 UTC),
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains(r#""fullName":"Ana B Cruz, Jr.""#));
        assert!(json.contains(r#""firstName":"Ana""#));
        assert!(json.contains(r#""createdAt":"2024-01-01T00:00:00Z""#));
    }

    #[test]
    fn role_parse_defaults_to_user() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("superuser"), Role::User);
        assert_eq!(Role::parse(""), Role::User);
    }
}
