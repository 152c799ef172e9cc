use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The part of the 'films' table the discussion boundary needs.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct FilmRef {
    pub id: i64,
    pub title: String,
    /// 'pending', 'published' or 'rejected'.
    pub status: String,
}

impl FilmRef {
    pub const PUBLISHED: &'static str = "published";

    pub fn is_published(&self) -> bool {
        self.status == Self::PUBLISHED
    }
}

/// Minimal film projection attached to moderation rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilmSummary {
    pub id: i64,
    pub title: Option<String>,
}
