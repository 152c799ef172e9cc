use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::{film::FilmSummary, user::AuthorSummary};

/// A row of the 'discussions' table joined with the author's projection.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CommentRecord {
    pub id: i64,
    pub film_id: i64,
    pub user_id: i64,
    pub body: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub author_name: Option<String>,
    pub author_image: Option<String>,
}

/// A comment row joined with both the author and the film it belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct ModerationRecord {
    #[sqlx(flatten)]
    pub comment: CommentRecord,
    pub film_title: Option<String>,
}

/// Parent link of a comment, enough to validate replies and walk to the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct ParentLink {
    pub film_id: i64,
    pub parent_id: Option<i64>,
}

/// Insert payload. `DiscussionService::create` trims the body before storing it.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub film_id: i64,
    pub user_id: i64,
    pub body: String,
    pub parent_id: Option<i64>,
}

/// DTO for creating a new comment or reply.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[serde(default, alias = "isi_pesan")]
    #[validate(length(max = 5000, message = "Comment must be at most 5000 characters"))]
    pub body: String,

    /// Optional: the ID of the comment being replied to.
    pub parent_id: Option<i64>,
}

/// DTO for editing a comment. Only the body can change.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[serde(default, alias = "isi_pesan")]
    #[validate(length(max = 5000, message = "Comment must be at most 5000 characters"))]
    pub body: String,
}

/// A single comment as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub film_id: i64,
    pub user_id: i64,
    pub body: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub user: AuthorSummary,
}

impl From<CommentRecord> for CommentResponse {
    fn from(record: CommentRecord) -> Self {
        Self {
            user: AuthorSummary {
                id: record.user_id,
                name: record.author_name,
                image: record.author_image,
            },
            id: record.id,
            film_id: record.film_id,
            user_id: record.user_id,
            body: record.body,
            parent_id: record.parent_id,
            created_at: record.created_at,
        }
    }
}

/// Root comment of a thread with its nested replies.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadComment {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub replies: Vec<ReplyNode>,
    /// Number of descendants, at every depth.
    pub reply_count: usize,
}

/// A reply inside a thread. `depth` is 1 for a direct reply to the root.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyNode {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub replies: Vec<ReplyNode>,
    pub depth: u32,
}

/// Flat moderation row.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationComment {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub film: FilmSummary,
}

impl From<ModerationRecord> for ModerationComment {
    fn from(record: ModerationRecord) -> Self {
        let film = FilmSummary {
            id: record.comment.film_id,
            title: record.film_title,
        };
        Self {
            comment: record.comment.into(),
            film,
        }
    }
}
