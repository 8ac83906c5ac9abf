use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, FieldErrors},
    validate::{none_if_blank, normalize_string, MAX_STRING},
    watchlist::repo::Entry,
};

const MIN_TITLE: usize = 2;
const MAX_TITLE: usize = 120;
const MAX_REVIEW: usize = 5000;
const MAX_LIMIT: i64 = 50;

/// Watch status of an entry. Stored as its kebab-case wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    ToWatch,
    Watching,
    Completed,
}

impl Status {
    pub fn parse(value: &str) -> Option<Status> {
        match value {
            "to-watch" => Some(Status::ToWatch),
            "watching" => Some(Status::Watching),
            "completed" => Some(Status::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::ToWatch => "to-watch",
            Status::Watching => "watching",
            Status::Completed => "completed",
        }
    }
}

/// Request body for add and update. Absent fields deserialize to their
/// defaults and are defaulted or rejected in validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EntryPayload {
    pub title: String,
    pub description: String,
    pub status: Option<String>,
    pub rating: Option<i32>,
    pub poster_url: String,
}

/// Validated entry fields ready for a write.
#[derive(Debug)]
pub struct NewEntry {
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub rating: i32,
    pub poster_url: Option<String>,
}

impl EntryPayload {
    /// Checks every field and reports all violations together.
    pub fn validate(&self) -> Result<NewEntry, ApiError> {
        let title = normalize_string(&self.title, MAX_STRING);
        let mut errors = FieldErrors::new();

        let title_len = title.chars().count();
        if !(MIN_TITLE..=MAX_TITLE).contains(&title_len) {
            errors.push("title", "Title must be 2–120 characters.");
        }

        let status = match self.status.as_deref() {
            None => Some(Status::ToWatch),
            Some(raw) => {
                let parsed = Status::parse(raw);
                if parsed.is_none() {
                    errors.push("status", "Invalid status.");
                }
                parsed
            }
        };

        let rating = self.rating.unwrap_or(0);
        if !(0..=5).contains(&rating) {
            errors.push("rating", "Rating must be between 0 and 5.");
        }

        errors.into_result()?;
        Ok(NewEntry {
            title,
            description: none_if_blank(&self.description),
            status: status.unwrap_or(Status::ToWatch),
            rating,
            poster_url: none_if_blank(&self.poster_url),
        })
    }
}

/// Request body for the review update.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReviewPayload {
    pub review: String,
    pub rating: Option<i32>,
}

#[derive(Debug)]
pub struct ReviewFields {
    pub review: Option<String>,
    pub rating: i32,
}

impl ReviewPayload {
    pub fn validate(&self) -> Result<ReviewFields, ApiError> {
        let mut errors = FieldErrors::new();

        if self.review.trim().chars().count() > MAX_REVIEW {
            errors.push("review", "Review too long (max 5000 chars).");
        }
        let rating = self.rating.unwrap_or(0);
        if !(0..=5).contains(&rating) {
            errors.push("rating", "Rating must be 0–5.");
        }

        errors.into_result()?;
        Ok(ReviewFields {
            review: none_if_blank(&self.review),
            rating,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    20
}

impl Pagination {
    /// Clamped (page, limit, offset): page at least 1, limit within [1, 50].
    pub fn clamp(&self) -> (i64, i64, i64) {
        let page = self.page.max(1);
        let limit = self.limit.clamp(1, MAX_LIMIT);
        (page, limit, (page - 1) * limit)
    }
}

/// Wire form of one entry. `ts` is created_at as unix seconds.
#[derive(Debug, Serialize)]
pub struct EntryItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub rating: i32,
    pub poster_url: Option<String>,
    pub review: Option<String>,
    pub ts: i64,
}

impl From<Entry> for EntryItem {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id,
            title: entry.title,
            description: entry.description,
            status: entry.status,
            rating: entry.rating,
            poster_url: entry.poster_url,
            review: entry.review,
            ts: entry.created_at.unix_timestamp(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub ok: bool,
    pub items: Vec<EntryItem>,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub ok: bool,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub ok: bool,
    pub id: i64,
    pub item: EntryItem,
}

#[derive(Debug, Serialize)]
pub struct ReviewedResponse {
    pub ok: bool,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub ok: bool,
}
